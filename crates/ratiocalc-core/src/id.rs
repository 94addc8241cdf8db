use serde::{Deserialize, Serialize};

/// Identifies an item in the registry. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe in the registry, including the per-item disabled
/// (ex-nihilo) recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a building (crafter or miner) in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Identifies a belt tier in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BeltId(pub u32);

impl ItemId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl RecipeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BuildingId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl BeltId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
