use crate::context::SolverContext;
use crate::cycle::cyclic_recipes;
use crate::fast_path::{self, PartialSolution};
use crate::id::*;
use crate::matrix::Matrix;
use crate::rational::{Rational, RationalError};
use crate::registry::Ingredient;
use crate::simplex::simplex;
use crate::tableau::Tableau;
use crate::totals::Totals;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// No row bounds an improving column. Signals inconsistent data, since
    /// every item has an ex-nihilo fallback.
    #[error("linear program is unbounded in column {column}")]
    Unbounded { column: usize },
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] RationalError),
    #[error("unknown item: {0:?}")]
    UnknownItem(ItemId),
    #[error("negative target rate {rate} for item {item:?}")]
    NegativeTarget { item: ItemId, rate: Rational },
    #[error("item {0:?} has no tableau column")]
    MissingColumn(ItemId),
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Intermediate state kept for inspection after a solve.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub partial: PartialSolution,
    /// The tableau as built, before pivoting.
    pub tableau: Option<Tableau>,
    /// The tableau's matrix after pivoting.
    pub solved: Option<Matrix>,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub totals: Totals,
    pub diagnostics: Diagnostics,
}

/// Linear-program result for a residual demand.
#[derive(Debug, Clone)]
pub struct Residual {
    pub tableau: Tableau,
    pub solved: Matrix,
    pub recipe_rates: BTreeMap<RecipeId, Rational>,
    pub surplus: BTreeMap<ItemId, Rational>,
}

// ---------------------------------------------------------------------------
// Solve
// ---------------------------------------------------------------------------

/// Compute the recipe rates that satisfy `targets` (item, items/sec).
///
/// The fast path settles every unambiguous acyclic chain; whatever demand it
/// leaves behind is encoded as a tableau and optimized with simplex.
pub fn solve(
    ctx: &SolverContext<'_>,
    targets: &[(ItemId, Rational)],
) -> Result<Solution, SolveError> {
    for (item, rate) in targets {
        if ctx.registry.get_item(*item).is_none() {
            return Err(SolveError::UnknownItem(*item));
        }
        if rate.is_negative() {
            return Err(SolveError::NegativeTarget {
                item: *item,
                rate: rate.clone(),
            });
        }
    }

    let graph = ctx.recipe_graph(
        targets
            .iter()
            .filter(|(_, rate)| !rate.is_zero())
            .map(|(item, _)| *item),
    );
    let cyclic = cyclic_recipes(ctx, &graph);
    tracing::debug!(
        targets = targets.len(),
        recipes = graph.len(),
        cyclic = cyclic.len(),
        "solving"
    );
    let partial = fast_path::resolve(ctx, &cyclic, targets)?;

    let outputs: Vec<Ingredient> = targets
        .iter()
        .map(|(item, rate)| Ingredient::new(*item, rate.clone()))
        .collect();
    let mut rates = partial.recipe_rates.clone();

    if partial.is_complete() {
        let totals = Totals::new(ctx.registry, outputs, rates, BTreeMap::new());
        return Ok(Solution {
            totals,
            diagnostics: Diagnostics {
                partial,
                tableau: None,
                solved: None,
            },
        });
    }

    let residual = solve_residual(ctx, &partial.remaining)?;
    for (recipe, rate) in &residual.recipe_rates {
        *rates.entry(*recipe).or_default() += rate;
    }
    let totals = Totals::new(ctx.registry, outputs, rates, residual.surplus);
    Ok(Solution {
        totals,
        diagnostics: Diagnostics {
            partial,
            tableau: Some(residual.tableau),
            solved: Some(residual.solved),
        },
    })
}

/// Route `demand` straight through the linear program, skipping the fast
/// path.
pub fn solve_residual(
    ctx: &SolverContext<'_>,
    demand: &BTreeMap<ItemId, Rational>,
) -> Result<Residual, SolveError> {
    let tableau = Tableau::build(ctx, demand)?;
    let mut solved = tableau.matrix.clone();
    simplex(&mut solved, tableau.cost_start())?;
    let recipe_rates = tableau.recipe_rates(&solved);
    let surplus = tableau.surplus(&solved);
    Ok(Residual {
        tableau,
        solved,
        recipe_rates,
        surplus,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::totals::SolutionNode;

    #[test]
    fn chain_uses_fast_path_only() {
        let f = chain_fixture();
        let ctx = f.ctx();
        let solution = solve(&ctx, &[(f.item("gear"), q("1"))]).unwrap();
        assert!(solution.diagnostics.tableau.is_none());
        assert!(solution.diagnostics.solved.is_none());
        let totals = &solution.totals;
        assert_eq!(totals.recipe_rate(f.recipe("plate")), Some(&q("2")));
        assert_eq!(totals.rate(SolutionNode::Output), Some(&q("1")));
        assert!(totals.surplus().is_empty());
        assert_balanced(&f, totals);
    }

    #[test]
    fn cycle_goes_through_tableau() {
        let f = cycle_fixture();
        let ctx = f.ctx();
        let solution = solve(&ctx, &[(f.item("a"), q("10"))]).unwrap();
        let tableau = solution.diagnostics.tableau.as_ref().unwrap();
        assert_eq!(tableau.recipes.len(), 2);
        assert_eq!(
            solution.totals.recipe_rate(f.recipe("make-a")),
            Some(&q("20/3"))
        );
        assert_balanced(&f, &solution.totals);
    }

    #[test]
    fn fast_path_and_lp_rates_merge() {
        let f = two_tier_fixture();
        let ctx = f.ctx();
        let solution = solve(&ctx, &[(f.item("plate"), q("4"))]).unwrap();
        let totals = &solution.totals;
        assert_eq!(totals.recipe_rate(f.recipe("plate-from-ore")), Some(&q("4")));
        assert_eq!(totals.recipe_rate(f.recipe("ore-vein")), Some(&q("4")));
        assert_eq!(totals.recipe_rate(f.recipe("ore-scrap")), None);
        assert_balanced(&f, totals);
    }

    #[test]
    fn unknown_item_rejected() {
        let f = chain_fixture();
        let ctx = f.ctx();
        assert_eq!(
            solve(&ctx, &[(ItemId(999), q("1"))]).unwrap_err(),
            SolveError::UnknownItem(ItemId(999))
        );
    }

    #[test]
    fn negative_target_rejected() {
        let f = chain_fixture();
        let ctx = f.ctx();
        assert!(matches!(
            solve(&ctx, &[(f.item("gear"), q("-1"))]),
            Err(SolveError::NegativeTarget { .. })
        ));
    }

    #[test]
    fn empty_targets_give_only_output() {
        let f = chain_fixture();
        let ctx = f.ctx();
        let solution = solve(&ctx, &[]).unwrap();
        assert_eq!(solution.totals.rates().count(), 1);
        assert_eq!(solution.totals.rate(SolutionNode::Output), Some(&q("1")));
    }

    #[test]
    fn residual_solve_without_fast_path() {
        let f = chain_fixture();
        let ctx = f.ctx();
        let demand = BTreeMap::from([(f.item("gear"), q("1"))]);
        let residual = solve_residual(&ctx, &demand).unwrap();
        assert_eq!(residual.recipe_rates[&f.recipe("gear")], q("1"));
        assert_eq!(residual.recipe_rates[&f.recipe("plate")], q("2"));
        assert_eq!(residual.recipe_rates[&f.recipe("ore")], q("2"));
        assert!(residual.surplus.is_empty());
    }
}
