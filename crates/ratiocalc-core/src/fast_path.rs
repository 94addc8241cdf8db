use crate::context::SolverContext;
use crate::id::*;
use crate::rational::Rational;
use crate::solve::SolveError;
use std::collections::{BTreeMap, BTreeSet};

/// Output of the fast path: recipe rates it settled directly, and the item
/// demand it left for the linear program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSolution {
    pub recipe_rates: BTreeMap<RecipeId, Rational>,
    pub remaining: BTreeMap<ItemId, Rational>,
}

impl PartialSolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, recipe: RecipeId, rate: &Rational) {
        *self.recipe_rates.entry(recipe).or_default() += rate;
    }

    pub fn remainder(&mut self, item: ItemId, rate: &Rational) {
        *self.remaining.entry(item).or_default() += rate;
    }

    pub fn combine(&mut self, other: &PartialSolution) {
        for (recipe, rate) in &other.recipe_rates {
            self.add(*recipe, rate);
        }
        for (item, rate) in &other.remaining {
            self.remainder(*item, rate);
        }
    }

    /// True when nothing is left for the linear program.
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Resolve single-choice, single-output, acyclic production top-down.
///
/// An item with several eligible recipes, or whose recipe has several
/// products or sits on a cycle, is recorded as remaining demand. Ignored
/// items are produced by their sole recipe but their ingredients are not
/// followed.
pub fn resolve(
    ctx: &SolverContext<'_>,
    cyclic: &BTreeSet<RecipeId>,
    targets: &[(ItemId, Rational)],
) -> Result<PartialSolution, SolveError> {
    let mut solution = PartialSolution::new();
    let mut work: Vec<(ItemId, Rational)> = targets
        .iter()
        .rev()
        .filter(|(_, rate)| !rate.is_zero())
        .cloned()
        .collect();

    while let Some((item, rate)) = work.pop() {
        let recipes = ctx.recipes_for(item);
        let &[recipe] = recipes.as_slice() else {
            solution.remainder(item, &rate);
            continue;
        };
        let def = &ctx.registry[recipe];
        if def.products.len() > 1 || cyclic.contains(&recipe) {
            solution.remainder(item, &rate);
            continue;
        }
        let Some(gives) = def.gives(item) else {
            solution.remainder(item, &rate);
            continue;
        };
        let recipe_rate = rate.checked_div(&gives)?;
        solution.add(recipe, &recipe_rate);
        if ctx.is_ignored(item) {
            continue;
        }
        for ingredient in def.ingredients.iter().rev() {
            work.push((ingredient.item, &recipe_rate * &ingredient.amount));
        }
    }

    tracing::debug!(
        resolved = solution.recipe_rates.len(),
        remaining = solution.remaining.len(),
        "fast path complete"
    );
    Ok(solution)
}
