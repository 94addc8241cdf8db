//! Building counts, power and belts for a solved factory.

use crate::config::TargetAmount;
use crate::context::SolverContext;
use crate::id::*;
use crate::rational::{Rational, RationalError};
use crate::registry::BuildingKind;
use crate::solve::{self, Solution, SolveError};
use crate::totals::{SolutionNode, Totals};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("no building runs recipe {0:?}")]
    NoBuilding(RecipeId),
    #[error("item {0:?} has no recipe to count buildings against")]
    NoRecipe(ItemId),
    #[error("no belt selected")]
    NoBelt,
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] RationalError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// One line of a factory summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub recipe: RecipeId,
    pub rate: Rational,
    pub building: Option<BuildingId>,
    pub count: Option<Rational>,
    pub power: Rational,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
    pub total_power: Rational,
}

/// Downstream view of a solve: turns recipe rates into buildings.
#[derive(Debug, Clone, Copy)]
pub struct Factory<'a> {
    ctx: SolverContext<'a>,
}

impl<'a> Factory<'a> {
    pub fn new(ctx: SolverContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SolverContext<'a> {
        &self.ctx
    }

    /// The building that runs `recipe`: the configured miner for resource
    /// recipes, otherwise the first building of the recipe's category.
    pub fn building_for(&self, recipe: RecipeId) -> Option<BuildingId> {
        if let Some(setting) = self.ctx.config.miner_setting(recipe) {
            return Some(setting.miner);
        }
        let category = self.ctx.registry.get_recipe(recipe)?.category.as_deref()?;
        self.ctx.registry.buildings_for(category).first().copied()
    }

    /// Recipe cycles per second one building completes.
    pub fn rate_per_building(&self, recipe: RecipeId) -> Result<Rational, FactoryError> {
        let building_id = self
            .building_for(recipe)
            .ok_or(FactoryError::NoBuilding(recipe))?;
        let building = self
            .ctx
            .registry
            .get_building(building_id)
            .ok_or(FactoryError::NoBuilding(recipe))?;
        let overclock = self.ctx.config.overclock(recipe);
        match &building.kind {
            BuildingKind::Crafter { speed } => {
                let time = &self.ctx.registry[recipe].time;
                Ok((speed * &overclock).checked_div(time)?)
            }
            BuildingKind::Miner { base_rate } => {
                let purity = self
                    .ctx
                    .config
                    .miner_setting(recipe)
                    .map(|s| s.purity.factor())
                    .unwrap_or_else(Rational::one);
                Ok(base_rate * &purity * &overclock)
            }
        }
    }

    /// Buildings needed to run `recipe` at `rate`.
    pub fn building_count(&self, recipe: RecipeId, rate: &Rational) -> Result<Rational, FactoryError> {
        let building_id = self
            .building_for(recipe)
            .ok_or(FactoryError::NoBuilding(recipe))?;
        let building = self
            .ctx
            .registry
            .get_building(building_id)
            .ok_or(FactoryError::NoBuilding(recipe))?;
        let overclock = self.ctx.config.overclock(recipe);
        match &building.kind {
            BuildingKind::Crafter { speed } => {
                let time = &self.ctx.registry[recipe].time;
                Ok((rate * time).checked_div(&(speed * &overclock))?)
            }
            BuildingKind::Miner { .. } => Ok(rate.checked_div(&self.rate_per_building(recipe)?)?),
        }
    }

    pub fn power_usage(&self, recipe: RecipeId, rate: &Rational) -> Result<Rational, FactoryError> {
        let count = self.building_count(recipe, rate)?;
        let building = self
            .building_for(recipe)
            .and_then(|b| self.ctx.registry.get_building(b))
            .ok_or(FactoryError::NoBuilding(recipe))?;
        Ok(count * &building.power)
    }

    /// Belts of the selected tier needed to carry `rate` items per second.
    pub fn belt_count(&self, rate: &Rational) -> Result<Rational, FactoryError> {
        let belt = self
            .ctx
            .config
            .belt()
            .and_then(|b| self.ctx.registry.get_belt(b))
            .ok_or(FactoryError::NoBelt)?;
        Ok(rate.checked_div(&belt.rate)?)
    }

    /// Configured targets as (item, items/sec). A building-count target runs
    /// the item's first eligible real recipe.
    pub fn target_rates(&self) -> Result<Vec<(ItemId, Rational)>, FactoryError> {
        let mut rates = Vec::with_capacity(self.ctx.config.targets().len());
        for target in self.ctx.config.targets() {
            let rate = match &target.amount {
                TargetAmount::Rate(rate) => rate.clone(),
                TargetAmount::Buildings(count) => {
                    let recipe = self
                        .ctx
                        .recipes_for(target.item)
                        .into_iter()
                        .find(|r| self.ctx.registry[*r].is_real())
                        .ok_or(FactoryError::NoRecipe(target.item))?;
                    let gives = self.ctx.registry[recipe]
                        .gives(target.item)
                        .ok_or(FactoryError::NoRecipe(target.item))?;
                    count * &self.rate_per_building(recipe)? * &gives
                }
            };
            rates.push((target.item, rate));
        }
        Ok(rates)
    }

    /// Solve the configured targets.
    pub fn solve(&self) -> Result<Solution, FactoryError> {
        let targets = self.target_rates()?;
        Ok(solve::solve(&self.ctx, &targets)?)
    }

    /// Buildings and power for every recipe in `totals`, tallest first.
    /// Recipes with no building (ex-nihilo, uncategorized resources) get no
    /// count and draw no power.
    pub fn summarize(&self, totals: &Totals) -> Result<Summary, FactoryError> {
        let mut rows = Vec::new();
        let mut total_power = Rational::zero();
        for node in totals.ordered() {
            let SolutionNode::Recipe(recipe) = node else {
                continue;
            };
            let Some(rate) = totals.recipe_rate(recipe) else {
                continue;
            };
            let building = self.building_for(recipe);
            let (count, power) = match building {
                Some(_) => (
                    Some(self.building_count(recipe, rate)?),
                    self.power_usage(recipe, rate)?,
                ),
                None => (None, Rational::zero()),
            };
            total_power += &power;
            rows.push(SummaryRow {
                recipe,
                rate: rate.clone(),
                building,
                count,
                power,
            });
        }
        Ok(Summary { rows, total_power })
    }
}
