//! Resource priority tiers.
//!
//! A [`PriorityList`] is an ordered sequence of [`PriorityLevel`]s. Level 0 is
//! the most preferred: the optimizer assigns it the cheapest cost and only
//! reaches for later levels when earlier ones cannot satisfy demand. Within a
//! level, each recipe carries a positive weight; heavier recipes are cheaper.
//!
//! A recipe appears in at most one level at a time.

use crate::id::RecipeId;
use crate::rational::Rational;
use crate::registry::{RecipeKind, Registry};
use std::collections::BTreeMap;

/// One tier of interchangeable resource recipes with their weights.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityLevel {
    recipes: BTreeMap<RecipeId, Rational>,
}

impl PriorityLevel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, recipe: RecipeId) -> bool {
        self.recipes.contains_key(&recipe)
    }

    pub fn weight(&self, recipe: RecipeId) -> Option<&Rational> {
        self.recipes.get(&recipe)
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Recipes and weights, ordered by recipe id.
    pub fn iter(&self) -> impl Iterator<Item = (RecipeId, &Rational)> {
        self.recipes.iter().map(|(id, w)| (*id, w))
    }

    pub fn max_weight(&self) -> Option<&Rational> {
        self.recipes.values().max()
    }

    fn insert(&mut self, recipe: RecipeId, weight: Rational) {
        self.recipes.insert(recipe, weight);
    }

    fn remove(&mut self, recipe: RecipeId) -> Option<Rational> {
        self.recipes.remove(&recipe)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityList {
    levels: Vec<PriorityLevel>,
}

impl PriorityList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default tiers seeded from every resource recipe's default priority
    /// and weight. Intermediate levels nothing lands in stay empty.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut list = Self::new();
        for (id, recipe) in registry.resource_recipes() {
            if let RecipeKind::Resource {
                default_priority,
                default_weight,
            } = &recipe.kind
            {
                while list.levels.len() < default_priority + 1 {
                    list.levels.push(PriorityLevel::new());
                }
                list.levels[*default_priority].insert(id, default_weight.clone());
            }
        }
        list
    }

    pub fn levels(&self) -> &[PriorityLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriorityLevel> {
        self.levels.iter()
    }

    /// Index of the level holding `recipe`.
    pub fn level_of(&self, recipe: RecipeId) -> Option<usize> {
        self.levels.iter().position(|level| level.contains(recipe))
    }

    pub fn weight_of(&self, recipe: RecipeId) -> Option<&Rational> {
        self.levels.iter().find_map(|level| level.weight(recipe))
    }

    /// Move `recipe` into `level`, keeping its weight (1 if it was unlisted).
    ///
    /// Returns `true` if the recipe's old level became empty and was removed.
    /// With `preserve_empty` the emptied level is kept in place.
    pub fn set_priority(
        &mut self,
        recipe: RecipeId,
        level: usize,
        preserve_empty: bool,
    ) -> Result<bool, PriorityError> {
        if level >= self.levels.len() {
            return Err(PriorityError::LevelOutOfRange {
                level,
                len: self.levels.len(),
            });
        }
        Ok(self.move_to(recipe, level, preserve_empty))
    }

    /// [`set_priority`](Self::set_priority) without the range check; `level`
    /// must be an existing index.
    fn move_to(&mut self, recipe: RecipeId, level: usize, preserve_empty: bool) -> bool {
        let old = self.level_of(recipe);
        if old == Some(level) {
            return false;
        }
        let weight = old
            .and_then(|idx| self.levels[idx].remove(recipe))
            .unwrap_or_else(Rational::one);
        self.levels[level].insert(recipe, weight);
        if let Some(idx) = old
            && !preserve_empty
            && self.levels[idx].is_empty()
        {
            self.levels.remove(idx);
            return true;
        }
        false
    }

    /// Insert a new empty level immediately before `before`, or at the end
    /// for `None`. Returns the new level's index.
    pub fn add_level_before(&mut self, before: Option<usize>) -> Result<usize, PriorityError> {
        match before {
            None => {
                self.levels.push(PriorityLevel::new());
                Ok(self.levels.len() - 1)
            }
            Some(idx) if idx < self.levels.len() => {
                self.levels.insert(idx, PriorityLevel::new());
                Ok(idx)
            }
            Some(level) => Err(PriorityError::LevelOutOfRange {
                level,
                len: self.levels.len(),
            }),
        }
    }

    /// Drop `recipe` from whichever level holds it, pruning that level if it
    /// empties. Returns whether the recipe was listed.
    pub fn remove(&mut self, recipe: RecipeId) -> bool {
        let Some(idx) = self.level_of(recipe) else {
            return false;
        };
        self.levels[idx].remove(recipe);
        if self.levels[idx].is_empty() {
            self.remove_empty();
        }
        true
    }

    pub fn set_weight(&mut self, recipe: RecipeId, weight: Rational) -> Result<(), PriorityError> {
        if !weight.is_positive() {
            return Err(PriorityError::NonPositiveWeight(weight));
        }
        let idx = self
            .level_of(recipe)
            .ok_or(PriorityError::NotListed(recipe))?;
        self.levels[idx].insert(recipe, weight);
        Ok(())
    }

    pub fn remove_empty(&mut self) {
        self.levels.retain(|level| !level.is_empty());
    }

    /// Rearrange levels from tiers of recipe keys. Tier `i` becomes level
    /// `i`; unknown keys are skipped with a warning. Empty levels are pruned
    /// afterwards.
    pub fn apply_keys<S: AsRef<str>>(&mut self, tiers: &[Vec<S>], registry: &Registry) {
        for (i, tier) in tiers.iter().enumerate() {
            while self.levels.len() < i + 1 {
                self.levels.push(PriorityLevel::new());
            }
            for key in tier {
                let key = key.as_ref();
                let Some(recipe) = registry.recipe_id(key) else {
                    tracing::warn!(key, "unknown recipe in priority tiers, skipping");
                    continue;
                };
                self.move_to(recipe, i, true);
            }
        }
        self.remove_empty();
    }
}

impl<'a> IntoIterator for &'a PriorityList {
    type Item = &'a PriorityLevel;
    type IntoIter = std::slice::Iter<'a, PriorityLevel>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriorityError {
    #[error("priority weight must be positive, got {0}")]
    NonPositiveWeight(Rational),
    #[error("priority level {level} out of range ({len} levels)")]
    LevelOutOfRange { level: usize, len: usize },
    #[error("recipe {0:?} is not in any priority level")]
    NotListed(RecipeId),
}
