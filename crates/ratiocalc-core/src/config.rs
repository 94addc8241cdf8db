use crate::id::*;
use crate::priority::PriorityList;
use crate::rational::Rational;
use crate::registry::{BuildingKind, Registry};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Miner settings
// ---------------------------------------------------------------------------

/// Resource node quality. Scales a miner's extraction rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Purity {
    Impure,
    #[default]
    Normal,
    Pure,
}

impl Purity {
    pub fn factor(self) -> Rational {
        match self {
            Purity::Impure => Rational::ratio(1, 2),
            Purity::Normal => Rational::one(),
            Purity::Pure => Rational::from_integer(2),
        }
    }
}

/// Which miner extracts a resource recipe, and from what node quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinerSetting {
    pub miner: BuildingId,
    pub purity: Purity,
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAmount {
    /// Items per second.
    Rate(Rational),
    /// Number of buildings running the item's recipe.
    Buildings(Rational),
}

/// A requested output item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub item: ItemId,
    pub amount: TargetAmount,
}

impl Target {
    pub fn rate(item: ItemId, rate: Rational) -> Self {
        Self {
            item,
            amount: TargetAmount::Rate(rate),
        }
    }

    pub fn buildings(item: ItemId, count: Rational) -> Self {
        Self {
            item,
            amount: TargetAmount::Buildings(count),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// User-mutable solve settings, stored as side tables keyed by registry ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    disabled: BTreeSet<RecipeId>,
    ignored: BTreeSet<ItemId>,
    overclock: BTreeMap<RecipeId, Rational>,
    miners: BTreeMap<RecipeId, MinerSetting>,
    pub priority: PriorityList,
    targets: Vec<Target>,
    belt: Option<BeltId>,
}

impl Configuration {
    /// Defaults: priority tiers from the resource recipes, the last miner of
    /// each resource's category at normal purity, and the first belt.
    pub fn new(registry: &Registry) -> Self {
        let mut miners = BTreeMap::new();
        for (id, recipe) in registry.resource_recipes() {
            let Some(category) = recipe.category.as_deref() else {
                continue;
            };
            let miner = registry
                .buildings_for(category)
                .iter()
                .rev()
                .find(|b| {
                    registry
                        .get_building(**b)
                        .is_some_and(|b| matches!(b.kind, BuildingKind::Miner { .. }))
                });
            if let Some(&miner) = miner {
                miners.insert(
                    id,
                    MinerSetting {
                        miner,
                        purity: Purity::Normal,
                    },
                );
            }
        }
        Self {
            disabled: BTreeSet::new(),
            ignored: BTreeSet::new(),
            overclock: BTreeMap::new(),
            miners,
            priority: PriorityList::from_registry(registry),
            targets: Vec::new(),
            belt: registry.belts().next().map(|(id, _)| id),
        }
    }

    pub fn disable(&mut self, recipe: RecipeId) {
        self.disabled.insert(recipe);
    }

    pub fn enable(&mut self, recipe: RecipeId) {
        self.disabled.remove(&recipe);
    }

    pub fn is_disabled(&self, recipe: RecipeId) -> bool {
        self.disabled.contains(&recipe)
    }

    pub fn disabled(&self) -> impl Iterator<Item = RecipeId> + '_ {
        self.disabled.iter().copied()
    }

    /// Treat `item` as freely available: the solver stops at it.
    pub fn ignore(&mut self, item: ItemId) {
        self.ignored.insert(item);
    }

    pub fn unignore(&mut self, item: ItemId) {
        self.ignored.remove(&item);
    }

    pub fn is_ignored(&self, item: ItemId) -> bool {
        self.ignored.contains(&item)
    }

    pub fn ignored(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.ignored.iter().copied()
    }

    /// Clock multiplier for `recipe`'s buildings, 1 when unset.
    pub fn overclock(&self, recipe: RecipeId) -> Rational {
        self.overclock
            .get(&recipe)
            .cloned()
            .unwrap_or_else(Rational::one)
    }

    pub fn set_overclock(&mut self, recipe: RecipeId, factor: Rational) -> Result<(), ConfigError> {
        if !factor.is_positive() {
            return Err(ConfigError::NonPositiveOverclock(factor));
        }
        if factor == Rational::one() {
            self.overclock.remove(&recipe);
        } else {
            self.overclock.insert(recipe, factor);
        }
        Ok(())
    }

    pub fn miner_setting(&self, recipe: RecipeId) -> Option<&MinerSetting> {
        self.miners.get(&recipe)
    }

    pub fn set_miner(
        &mut self,
        registry: &Registry,
        recipe: RecipeId,
        miner: BuildingId,
        purity: Purity,
    ) -> Result<(), ConfigError> {
        match registry.get_building(miner) {
            Some(b) if matches!(b.kind, BuildingKind::Miner { .. }) => {}
            _ => return Err(ConfigError::NotAMiner(miner)),
        }
        self.miners.insert(recipe, MinerSetting { miner, purity });
        Ok(())
    }

    pub fn add_target(&mut self, target: Target) {
        self.targets.push(target);
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn belt(&self) -> Option<BeltId> {
        self.belt
    }

    pub fn set_belt(&mut self, belt: BeltId) {
        self.belt = Some(belt);
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("overclock factor must be positive, got {0}")]
    NonPositiveOverclock(Rational),
    #[error("building {0:?} is not a miner")]
    NotAMiner(BuildingId),
}
