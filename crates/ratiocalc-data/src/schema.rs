//! Serde data file structs for game data and planner settings.
//!
//! These structs define the on-disk format. They are deserialized from RON,
//! JSON, or TOML files and then resolved into registry and configuration
//! types by the loader. Everything is referenced by string key.

use serde::Deserialize;
use std::collections::BTreeMap;

// ===========================================================================
// Amounts
// ===========================================================================

/// A quantity as written in a data file.
///
/// Integers are exact, strings are parsed as exact rationals (`"1/3"`,
/// `"2+1/2"`, `"0.75"`), and floats go through the lossy decimal conversion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountData {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Default for AmountData {
    fn default() -> Self {
        AmountData::Integer(1)
    }
}

/// An `(item_key, amount)` pair in a recipe's ingredient or product list.
pub type EntryData = (String, AmountData);

// ===========================================================================
// Game data: items and recipes
// ===========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseData {
    #[default]
    Solid,
    Fluid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub tier: u32,
    #[serde(default)]
    pub phase: PhaseData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub time: AmountData,
    #[serde(default)]
    pub ingredients: Vec<EntryData>,
    pub products: Vec<EntryData>,
}

/// A raw-extraction recipe for one item.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    /// Defaults to the item key.
    #[serde(default)]
    pub key: Option<String>,
    pub item: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: usize,
    #[serde(default)]
    pub weight: AmountData,
}

// ===========================================================================
// Game data: buildings and belts
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CrafterData {
    pub key: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub speed: AmountData,
    #[serde(default = "zero_amount")]
    pub power: AmountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerData {
    pub key: String,
    pub name: String,
    pub category: String,
    pub base_rate: AmountData,
    #[serde(default = "zero_amount")]
    pub power: AmountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeltData {
    pub key: String,
    pub name: String,
    pub rate: AmountData,
}

fn zero_amount() -> AmountData {
    AmountData::Integer(0)
}

/// A complete game data file.
#[derive(Debug, Clone, Deserialize)]
pub struct GameDataFile {
    pub items: Vec<ItemData>,
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub resources: Vec<ResourceData>,
    #[serde(default)]
    pub crafters: Vec<CrafterData>,
    #[serde(default)]
    pub miners: Vec<MinerData>,
    #[serde(default)]
    pub belts: Vec<BeltData>,
}

// ===========================================================================
// Settings
// ===========================================================================

/// A requested output: either a rate or a building count, not both.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetData {
    pub item: String,
    #[serde(default)]
    pub rate: Option<AmountData>,
    #[serde(default)]
    pub buildings: Option<AmountData>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurityData {
    Impure,
    #[default]
    Normal,
    Pure,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerSettingData {
    pub miner: String,
    #[serde(default)]
    pub purity: PurityData,
}

/// Planner settings, resolved against a registry by the loader.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub targets: Vec<TargetData>,
    /// Recipe keys to disable.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Item keys to treat as freely available.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Recipe key to clock factor.
    #[serde(default)]
    pub overclock: BTreeMap<String, AmountData>,
    /// Resource recipe keys, most preferred tier first. Replaces the default
    /// tiers when present.
    #[serde(default)]
    pub priority: Option<Vec<Vec<String>>>,
    /// Resource recipe key to priority weight.
    #[serde(default)]
    pub weights: BTreeMap<String, AmountData>,
    /// Resource recipe key to miner choice.
    #[serde(default)]
    pub miners: BTreeMap<String, MinerSettingData>,
    #[serde(default)]
    pub belt: Option<String>,
}

// ===========================================================================
// Tests
// ===========================================================================
