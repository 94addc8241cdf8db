//! Linear-program encoding of the residual production problem.
//!
//! Layout:
//!
//! ```text
//! columns: [items] [tax] [one slack per recipe] [result] [costs]
//! rows:    [recipes] [tax] [objective]
//! ```
//!
//! Each recipe row holds `+amount` for its products, `-amount` for its
//! ingredients, `-1` in the tax column and `+1` in its own slack column. The
//! objective row holds `-demand` in each demanded item's column. After
//! pivoting, the objective row's slack columns hold recipe rates and its
//! item columns hold surplus.
//!
//! The cost block is one right-hand side per significance level, most
//! significant first: ex-nihilo fallbacks, then the priority levels from
//! least to most preferred, then the per-recipe tax. Within a level a
//! recipe costs the level's largest weight over its own. Simplex compares
//! the block lexicographically, so no quantity of a cheaper level ever
//! outweighs one unit of a dearer one.

use crate::context::SolverContext;
use crate::id::*;
use crate::matrix::Matrix;
use crate::rational::Rational;
use crate::solve::SolveError;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tableau {
    pub matrix: Matrix,
    /// Item owning each item column.
    pub items: Vec<ItemId>,
    /// Recipe owning each recipe row.
    pub recipes: Vec<RecipeId>,
    /// Priority levels encoded in the cost block.
    pub levels: usize,
}

impl Tableau {
    /// Encode `demand` over the recipes reachable from its items.
    pub fn build(
        ctx: &SolverContext<'_>,
        demand: &BTreeMap<ItemId, Rational>,
    ) -> Result<Tableau, SolveError> {
        let recipes = ctx.recipe_graph(demand.keys().copied());

        let mut items: Vec<ItemId> = Vec::new();
        let mut item_columns: HashMap<ItemId, usize> = HashMap::new();
        for &recipe in &recipes {
            for product in &ctx.registry[recipe].products {
                item_columns.entry(product.item).or_insert_with(|| {
                    items.push(product.item);
                    items.len() - 1
                });
            }
        }
        for &recipe in &recipes {
            for ingredient in &ctx.registry[recipe].ingredients {
                item_columns.entry(ingredient.item).or_insert_with(|| {
                    items.push(ingredient.item);
                    items.len() - 1
                });
            }
        }
        let recipe_rows: HashMap<RecipeId, usize> = recipes
            .iter()
            .enumerate()
            .map(|(row, recipe)| (*recipe, row))
            .collect();

        let levels = ctx.config.priority.len();
        let rows = recipes.len() + 2;
        let cost_start = items.len() + recipes.len() + 2;
        let cols = cost_start + levels + 2;
        let mut matrix = Matrix::new(rows, cols);
        let tax = items.len();
        let minus_one = -Rational::one();

        for (i, &recipe) in recipes.iter().enumerate() {
            let def = &ctx.registry[recipe];
            for product in &def.products {
                matrix.add_to(i, item_columns[&product.item], &product.amount);
            }
            for ingredient in &def.ingredients {
                matrix.add_to(i, item_columns[&ingredient.item], &-&ingredient.amount);
            }
            matrix.set(i, tax, minus_one.clone());
            matrix.set(i, tax + i + 1, Rational::one());
            if def.is_max_priority() {
                matrix.set(i, cost_start, Rational::one());
            }
        }
        matrix.set(rows - 2, tax, Rational::one());
        matrix.set(rows - 2, cols - 1, Rational::one());
        matrix.set(rows - 1, cost_start - 1, Rational::one());

        for (item, rate) in demand {
            let col = *item_columns
                .get(item)
                .ok_or(SolveError::MissingColumn(*item))?;
            matrix.set(rows - 1, col, -rate);
        }

        for (level, entries) in ctx.config.priority.iter().enumerate() {
            let Some(max_weight) = entries.max_weight() else {
                continue;
            };
            let col = cost_start + levels - level;
            for (recipe, weight) in entries.iter() {
                let Some(&row) = recipe_rows.get(&recipe) else {
                    continue;
                };
                matrix.set(row, col, max_weight.checked_div(weight)?);
            }
        }

        tracing::debug!(
            rows,
            cols,
            demand = demand.len(),
            "tableau built"
        );
        Ok(Tableau {
            matrix,
            items,
            recipes,
            levels,
        })
    }

    pub fn tax_column(&self) -> usize {
        self.items.len()
    }

    /// Slack column of the recipe in `row`.
    pub fn slack_column(&self, row: usize) -> usize {
        self.items.len() + 1 + row
    }

    pub fn result_column(&self) -> usize {
        self.cost_start() - 1
    }

    /// First column of the lexicographic cost block.
    pub fn cost_start(&self) -> usize {
        self.items.len() + self.recipes.len() + 2
    }

    /// Most significant cost, carried by ex-nihilo rows only.
    pub fn fallback_cost_column(&self) -> usize {
        self.cost_start()
    }

    /// Cost column of priority `level`; dearer levels sit further left.
    /// `level` must be below [`Tableau::levels`].
    pub fn level_cost_column(&self, level: usize) -> usize {
        self.cost_start() + self.levels - level
    }

    /// Least significant cost: one unit per unit of any recipe.
    pub fn tax_cost_column(&self) -> usize {
        self.matrix.cols() - 1
    }

    /// Strictly positive recipe rates read from a pivoted copy of the matrix.
    pub fn recipe_rates(&self, solved: &Matrix) -> BTreeMap<RecipeId, Rational> {
        let objective = solved.rows() - 1;
        self.recipes
            .iter()
            .enumerate()
            .filter_map(|(row, recipe)| {
                let rate = &solved[(objective, self.slack_column(row))];
                rate.is_positive().then(|| (*recipe, rate.clone()))
            })
            .collect()
    }

    /// Strictly positive surplus per item read from a pivoted matrix.
    pub fn surplus(&self, solved: &Matrix) -> BTreeMap<ItemId, Rational> {
        let objective = solved.rows() - 1;
        self.items
            .iter()
            .enumerate()
            .filter_map(|(col, item)| {
                let rate = &solved[(objective, col)];
                rate.is_positive().then(|| (*item, rate.clone()))
            })
            .collect()
    }
}
