//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::Configuration;
use crate::context::SolverContext;
use crate::id::*;
use crate::rational::Rational;
use crate::registry::{Ingredient, Phase, Registry, RegistryBuilder};
use crate::totals::Totals;

// ===========================================================================
// Helpers
// ===========================================================================

/// Parse a rational literal. Panics on malformed input.
pub fn q(s: &str) -> Rational {
    s.parse()
        .unwrap_or_else(|e| panic!("bad rational literal {s:?}: {e}"))
}

pub fn ing(item: ItemId, amount: &str) -> Ingredient {
    Ingredient::new(item, q(amount))
}

/// A registry with a configuration at its defaults.
pub struct Fixture {
    pub registry: Registry,
    pub config: Configuration,
}

impl Fixture {
    pub fn new(registry: Registry) -> Self {
        let config = Configuration::new(&registry);
        Self { registry, config }
    }

    pub fn ctx(&self) -> SolverContext<'_> {
        SolverContext::new(&self.registry, &self.config)
    }

    pub fn item(&self, key: &str) -> ItemId {
        self.registry
            .item_id(key)
            .unwrap_or_else(|| panic!("unknown item {key}"))
    }

    pub fn recipe(&self, key: &str) -> RecipeId {
        self.registry
            .recipe_id(key)
            .unwrap_or_else(|| panic!("unknown recipe {key}"))
    }
}

/// Every item's production equals its consumption, targets and surplus
/// included.
pub fn assert_balanced(f: &Fixture, totals: &Totals) {
    for (id, item) in f.registry.items() {
        let flow = totals.item_flow(&f.registry, id);
        assert!(
            flow.is_balanced(),
            "{} unbalanced: produced {} consumed {}",
            item.key,
            flow.production,
            flow.consumption
        );
    }
}

fn add_buildings(b: &mut RegistryBuilder) {
    b.register_miner("miner", "Miner", "mineral", q("1/2"), q("5"));
    b.register_crafter("smelter", "Smelter", "smelter", q("1"), q("4"));
    b.register_crafter("assembler", "Assembler", "assembler", q("1"), q("15"));
    b.register_crafter("refinery", "Refinery", "refinery", q("1"), q("30"));
    b.register_belt("belt1", "Belt Mk.1", q("10"));
    b.register_belt("belt2", "Belt Mk.2", q("20"));
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// ore -> plate -> gear. Three single-choice recipes, no branching.
pub fn chain_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let ore = b.register_item("ore", "Ore", 0, Phase::Solid);
    let plate = b.register_item("plate", "Plate", 1, Phase::Solid);
    let gear = b.register_item("gear", "Gear", 2, Phase::Solid);
    b.register_resource("ore", ore, Some("mineral"), 0, q("1"));
    b.register_recipe(
        "plate",
        "Plate",
        Some("smelter"),
        q("2"),
        vec![ing(ore, "1")],
        vec![ing(plate, "1")],
    );
    b.register_recipe(
        "gear",
        "Gear",
        Some("assembler"),
        q("1"),
        vec![ing(plate, "2")],
        vec![ing(gear, "1")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("chain fixture"))
}

/// Ore from a tier-0 vein or a tier-1 scrap heap, smelted into plates.
pub fn two_tier_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let ore = b.register_item("ore", "Ore", 0, Phase::Solid);
    let plate = b.register_item("plate", "Plate", 1, Phase::Solid);
    b.register_resource("ore-vein", ore, Some("mineral"), 0, q("1"));
    b.register_resource("ore-scrap", ore, None, 1, q("1"));
    b.register_recipe(
        "plate-from-ore",
        "Plate",
        Some("smelter"),
        q("1"),
        vec![ing(ore, "1")],
        vec![ing(plate, "1")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("two-tier fixture"))
}

/// make-a: 1 b -> 2 a, make-b: 1 a -> 2 b.
pub fn cycle_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let a = b.register_item("a", "A", 1, Phase::Solid);
    let item_b = b.register_item("b", "B", 1, Phase::Solid);
    b.register_recipe(
        "make-a",
        "Make A",
        Some("assembler"),
        q("1"),
        vec![ing(item_b, "1")],
        vec![ing(a, "2")],
    );
    b.register_recipe(
        "make-b",
        "Make B",
        Some("assembler"),
        q("1"),
        vec![ing(a, "1")],
        vec![ing(item_b, "2")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("cycle fixture"))
}

/// grow: 1 seed + 1 water -> 2 seed. Water is an implicit resource.
pub fn self_loop_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let seed = b.register_item("seed", "Seed", 1, Phase::Solid);
    let water = b.register_item("water", "Water", 0, Phase::Fluid);
    b.register_recipe(
        "grow",
        "Grow",
        Some("assembler"),
        q("4"),
        vec![ing(seed, "1"), ing(water, "1")],
        vec![ing(seed, "2")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("self-loop fixture"))
}

/// widget: 1 ore -> 1 widget. Tests disable the widget recipe.
pub fn disabled_only_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let ore = b.register_item("ore", "Ore", 0, Phase::Solid);
    let widget = b.register_item("widget", "Widget", 1, Phase::Solid);
    b.register_resource("ore", ore, Some("mineral"), 0, q("1"));
    b.register_recipe(
        "widget",
        "Widget",
        Some("assembler"),
        q("1"),
        vec![ing(ore, "1")],
        vec![ing(widget, "1")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("disabled-only fixture"))
}

/// oil-processing: 10 crude -> 3 heavy + 5 light,
/// heavy-cracking: 4 heavy -> 3 light.
pub fn multi_output_fixture() -> Fixture {
    let mut b = RegistryBuilder::new();
    let crude = b.register_item("crude", "Crude Oil", 0, Phase::Fluid);
    let heavy = b.register_item("heavy-oil", "Heavy Oil", 1, Phase::Fluid);
    let light = b.register_item("light-oil", "Light Oil", 1, Phase::Fluid);
    b.register_resource("crude", crude, Some("oil"), 0, q("1"));
    b.register_recipe(
        "oil-processing",
        "Oil Processing",
        Some("refinery"),
        q("5"),
        vec![ing(crude, "10")],
        vec![ing(heavy, "3"), ing(light, "5")],
    );
    b.register_recipe(
        "heavy-cracking",
        "Heavy Cracking",
        Some("refinery"),
        q("2"),
        vec![ing(heavy, "4")],
        vec![ing(light, "3")],
    );
    add_buildings(&mut b);
    Fixture::new(b.build().expect("multi-output fixture"))
}

/// A linear chain `i0 -> i1 -> ... -> in`. Step `k` consumes `steps[k].0`
/// of the previous item and gives `steps[k].1` of the next. `i0` is an
/// implicit resource.
pub fn linear_chain(steps: &[(u32, u32)]) -> Fixture {
    let mut b = RegistryBuilder::new();
    let mut prev = b.register_item("i0", "Item 0", 0, Phase::Solid);
    for (k, (consumes, gives)) in steps.iter().enumerate() {
        let next = b.register_item(
            &format!("i{}", k + 1),
            &format!("Item {}", k + 1),
            k as u32 + 1,
            Phase::Solid,
        );
        b.register_recipe(
            &format!("r{}", k + 1),
            &format!("Recipe {}", k + 1),
            Some("assembler"),
            q("1"),
            vec![Ingredient::new(prev, Rational::from(*consumes))],
            vec![Ingredient::new(next, Rational::from(*gives))],
        );
        prev = next;
    }
    add_buildings(&mut b);
    Fixture::new(b.build().expect("linear chain"))
}

/// Plates from two competing single-choice chains. `vein` starts at
/// `vein-ore` (resource `ore-vein`, tier 0) and `scrap` at `scrap-ore`
/// (resource `ore-scrap`, tier 1). Steps are `(consumed, given)` as in
/// [`linear_chain`] and each chain needs at least one; the last step gives
/// `plate`. Recipes are keyed `vein-1..` and `scrap-1..`.
pub fn tiered_chains(vein: &[(u32, u32)], scrap: &[(u32, u32)]) -> Fixture {
    let mut b = RegistryBuilder::new();
    let plate = b.register_item("plate", "Plate", 10, Phase::Solid);
    for (prefix, tier, steps) in [("vein", 0, vein), ("scrap", 1, scrap)] {
        let raw = b.register_item(&format!("{prefix}-ore"), "Ore", 0, Phase::Solid);
        b.register_resource(&format!("ore-{prefix}"), raw, Some("mineral"), tier, q("1"));
        let mut prev = raw;
        for (k, (consumes, gives)) in steps.iter().enumerate() {
            let next = if k + 1 == steps.len() {
                plate
            } else {
                b.register_item(
                    &format!("{prefix}-part-{}", k + 1),
                    "Part",
                    k as u32 + 1,
                    Phase::Solid,
                )
            };
            b.register_recipe(
                &format!("{prefix}-{}", k + 1),
                "Step",
                Some("assembler"),
                q("1"),
                vec![Ingredient::new(prev, Rational::from(*consumes))],
                vec![Ingredient::new(next, Rational::from(*gives))],
            );
            prev = next;
        }
    }
    add_buildings(&mut b);
    Fixture::new(b.build().expect("tiered chains"))
}
