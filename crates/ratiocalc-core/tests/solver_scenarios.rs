//! End-to-end solves over the small fixture graphs, checked against rates
//! worked out by hand.

use ratiocalc_core::cycle::cyclic_recipes;
use ratiocalc_core::solve::solve;
use ratiocalc_core::test_utils::*;
use ratiocalc_core::totals::SolutionNode;

#[test]
fn three_deep_chain_never_builds_a_tableau() {
    let f = chain_fixture();
    let solution = solve(&f.ctx(), &[(f.item("gear"), q("1"))]).unwrap();
    assert!(solution.diagnostics.tableau.is_none());
    assert!(solution.diagnostics.partial.is_complete());

    let totals = &solution.totals;
    assert_eq!(totals.recipe_rate(f.recipe("gear")), Some(&q("1")));
    assert_eq!(totals.recipe_rate(f.recipe("plate")), Some(&q("2")));
    assert_eq!(totals.recipe_rate(f.recipe("ore")), Some(&q("2")));
    assert!(totals.surplus().is_empty());
    assert_balanced(&f, totals);
}

#[test]
fn demand_routes_entirely_to_preferred_tier() {
    let f = two_tier_fixture();
    let solution = solve(&f.ctx(), &[(f.item("plate"), q("10"))]).unwrap();
    assert!(solution.diagnostics.tableau.is_some());
    assert_eq!(solution.totals.recipe_rate(f.recipe("ore-vein")), Some(&q("10")));
    assert_eq!(solution.totals.recipe_rate(f.recipe("ore-scrap")), None);
    assert_balanced(&f, &solution.totals);
}

#[test]
fn disabling_preferred_tier_falls_back() {
    let mut f = two_tier_fixture();
    f.config.disable(f.recipe("ore-vein"));
    let solution = solve(&f.ctx(), &[(f.item("plate"), q("10"))]).unwrap();
    // A single producer is left, so the fast path settles it.
    assert!(solution.diagnostics.tableau.is_none());
    assert_eq!(solution.totals.recipe_rate(f.recipe("ore-scrap")), Some(&q("10")));
    assert_eq!(solution.totals.recipe_rate(f.recipe("ore-vein")), None);
}

#[test]
fn cheap_lower_tier_never_displaces_preferred_tier() {
    // 100 vein ore per plate against 1/100 scrap ore per plate.
    let f = tiered_chains(&[(100, 1)], &[(1, 100)]);
    let solution = solve(&f.ctx(), &[(f.item("plate"), q("1"))]).unwrap();
    assert!(solution.diagnostics.tableau.is_some());
    let totals = &solution.totals;
    assert_eq!(totals.recipe_rate(f.recipe("ore-vein")), Some(&q("100")));
    assert_eq!(totals.recipe_rate(f.recipe("vein-1")), Some(&q("1")));
    assert_eq!(totals.recipe_rate(f.recipe("ore-scrap")), None);
    assert_eq!(totals.recipe_rate(f.recipe("scrap-1")), None);
    assert_balanced(&f, totals);
}

#[test]
fn missing_preferred_tier_uses_lower_tier_before_nothing() {
    let mut f = tiered_chains(&[(100, 1)], &[(1, 100)]);
    f.config.disable(f.recipe("ore-vein"));
    let vein_ore = f.registry.disable_recipe(f.item("vein-ore")).unwrap();
    let solution = solve(&f.ctx(), &[(f.item("plate"), q("1"))]).unwrap();
    // Plate still has two producers, so this goes through the LP.
    assert!(solution.diagnostics.tableau.is_some());
    let totals = &solution.totals;
    assert_eq!(totals.recipe_rate(f.recipe("ore-scrap")), Some(&q("1/100")));
    assert_eq!(totals.recipe_rate(f.recipe("scrap-1")), Some(&q("1/100")));
    assert_eq!(totals.recipe_rate(f.recipe("vein-1")), None);
    assert_eq!(totals.recipe_rate(vein_ore), None);
    assert_balanced(&f, totals);
}

#[test]
fn two_cycle_solves_through_lp() {
    let f = cycle_fixture();
    let ctx = f.ctx();
    let (make_a, make_b) = (f.recipe("make-a"), f.recipe("make-b"));
    let graph = ctx.recipe_graph([f.item("a")]);
    let cyclic = cyclic_recipes(&ctx, &graph);
    assert!(cyclic.contains(&make_a));
    assert!(cyclic.contains(&make_b));

    let solution = solve(&ctx, &[(f.item("a"), q("10"))]).unwrap();
    let tableau = solution.diagnostics.tableau.as_ref().unwrap();
    assert!(tableau.recipes.contains(&make_a));
    assert!(tableau.recipes.contains(&make_b));

    // a: 2x - y = 10, b: 2y - x = 0.
    assert_eq!(solution.totals.recipe_rate(make_a), Some(&q("20/3")));
    assert_eq!(solution.totals.recipe_rate(make_b), Some(&q("10/3")));
    for (_, rate) in solution.totals.rates() {
        assert!(rate.is_positive());
    }
    assert_balanced(&f, &solution.totals);
}

#[test]
fn self_loop_pays_for_its_seed() {
    let f = self_loop_fixture();
    let solution = solve(&f.ctx(), &[(f.item("seed"), q("1"))]).unwrap();
    assert!(solution.diagnostics.tableau.is_some());
    assert_eq!(solution.totals.recipe_rate(f.recipe("grow")), Some(&q("1")));
    assert_eq!(solution.totals.recipe_rate(f.recipe("water")), Some(&q("1")));
    assert_balanced(&f, &solution.totals);
}

#[test]
fn disabled_only_item_comes_from_nothing() {
    let mut f = disabled_only_fixture();
    let widget = f.item("widget");
    f.config.disable(f.recipe("widget"));
    let fallback = f.registry.disable_recipe(widget).unwrap();

    let solution = solve(&f.ctx(), &[(widget, q("5"))]).unwrap();
    let totals = &solution.totals;
    assert_eq!(totals.recipe_rate(fallback), Some(&q("5")));
    assert_eq!(totals.recipe_rate(f.recipe("widget")), None);
    assert_eq!(totals.recipe_rate(f.recipe("ore")), None);
    assert_eq!(totals.recipe_rates().count(), 1);
    assert_balanced(&f, totals);
}

#[test]
fn ignored_by_product_keeps_its_producer() {
    let mut f = multi_output_fixture();
    let heavy = f.item("heavy-oil");
    f.config.ignore(heavy);
    let fallback = f.registry.disable_recipe(heavy).unwrap();

    let solution = solve(&f.ctx(), &[(f.item("light-oil"), q("10"))]).unwrap();
    let totals = &solution.totals;
    // Cracking all heavy oil: 5x + 3y = 10 light, 3x = 4y heavy.
    assert_eq!(totals.recipe_rate(f.recipe("oil-processing")), Some(&q("40/29")));
    assert_eq!(totals.recipe_rate(f.recipe("heavy-cracking")), Some(&q("30/29")));
    assert_eq!(totals.recipe_rate(f.recipe("crude")), Some(&q("400/29")));
    assert_eq!(totals.recipe_rate(fallback), None);
    assert!(totals.surplus().is_empty());
    assert_balanced(&f, totals);
}

#[test]
fn ignored_target_leaves_co_product_as_surplus() {
    let mut f = multi_output_fixture();
    let heavy = f.item("heavy-oil");
    f.config.ignore(heavy);

    let solution = solve(&f.ctx(), &[(heavy, q("3"))]).unwrap();
    let totals = &solution.totals;
    assert_eq!(totals.recipe_rate(f.recipe("oil-processing")), Some(&q("1")));
    assert_eq!(totals.recipe_rate(f.recipe("crude")), Some(&q("10")));
    assert_eq!(totals.surplus().get(&f.item("light-oil")), Some(&q("5")));
    assert_eq!(totals.rate(SolutionNode::Surplus), Some(&q("1")));
    assert_balanced(&f, totals);
}
