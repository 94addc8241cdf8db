//! Resolution pipeline: reads data files, resolves key references, builds the
//! registry and the planner configuration.
//!
//! Game data must be self-consistent: a recipe naming an unknown item is an
//! error. Settings are user-edited and may go stale against newer game data,
//! so unknown keys there are logged and skipped.

use ratiocalc_core::config::{ConfigError, Configuration, Purity, Target};
use ratiocalc_core::id::*;
use ratiocalc_core::priority::PriorityError;
use ratiocalc_core::rational::{Rational, RationalError};
use ratiocalc_core::registry::{Ingredient, Phase, Registry, RegistryBuilder, RegistryError};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A key reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A quantity could not be turned into an exact rational.
    #[error("invalid amount in {file}: {detail}")]
    InvalidAmount { file: PathBuf, detail: String },

    /// A target gave both a rate and a building count, or neither.
    #[error("target '{item}' in {file} needs exactly one of rate or buildings")]
    InvalidTarget { file: PathBuf, item: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Priority(#[from] PriorityError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `file` only labels errors.
pub fn parse_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(&content, format, path)
}

/// Convert a data-file quantity to an exact rational.
pub fn resolve_amount(amount: &AmountData, file: &Path) -> Result<Rational, DataLoadError> {
    let invalid = |detail: String| DataLoadError::InvalidAmount {
        file: file.to_path_buf(),
        detail,
    };
    match amount {
        AmountData::Integer(n) => Ok(Rational::from_integer(*n)),
        AmountData::Float(x) => Rational::from_float(*x).map_err(|e| invalid(e.to_string())),
        AmountData::Text(s) => s.parse().map_err(|e: RationalError| invalid(e.to_string())),
    }
}

// ===========================================================================
// Game data
// ===========================================================================

/// Load a game data file and build the registry from it.
pub fn load_game_data(path: &Path) -> Result<Registry, DataLoadError> {
    let data: GameDataFile = deserialize_file(path)?;
    build_registry(&data, path)
}

/// Register everything in `data`. Items first, so recipes can reference any
/// item regardless of file order.
pub fn build_registry(data: &GameDataFile, file: &Path) -> Result<Registry, DataLoadError> {
    let mut builder = RegistryBuilder::new();

    for item in &data.items {
        let phase = match item.phase {
            PhaseData::Solid => Phase::Solid,
            PhaseData::Fluid => Phase::Fluid,
        };
        builder.register_item(&item.key, &item.name, item.tier, phase);
    }

    for recipe in &data.recipes {
        let ingredients = resolve_entries(&builder, &recipe.ingredients, file)?;
        let products = resolve_entries(&builder, &recipe.products, file)?;
        builder.register_recipe(
            &recipe.key,
            &recipe.name,
            recipe.category.as_deref(),
            resolve_amount(&recipe.time, file)?,
            ingredients,
            products,
        );
    }

    for resource in &data.resources {
        let item = resolve_item(&builder, &resource.item, file)?;
        builder.register_resource(
            resource.key.as_deref().unwrap_or(&resource.item),
            item,
            resource.category.as_deref(),
            resource.priority,
            resolve_amount(&resource.weight, file)?,
        );
    }

    for crafter in &data.crafters {
        builder.register_crafter(
            &crafter.key,
            &crafter.name,
            &crafter.category,
            resolve_amount(&crafter.speed, file)?,
            resolve_amount(&crafter.power, file)?,
        );
    }
    for miner in &data.miners {
        builder.register_miner(
            &miner.key,
            &miner.name,
            &miner.category,
            resolve_amount(&miner.base_rate, file)?,
            resolve_amount(&miner.power, file)?,
        );
    }
    for belt in &data.belts {
        builder.register_belt(&belt.key, &belt.name, resolve_amount(&belt.rate, file)?);
    }

    let registry = builder.build()?;
    tracing::debug!(
        items = registry.item_count(),
        recipes = registry.recipe_count(),
        buildings = registry.building_count(),
        file = %file.display(),
        "game data loaded"
    );
    Ok(registry)
}

fn resolve_item(builder: &RegistryBuilder, key: &str, file: &Path) -> Result<ItemId, DataLoadError> {
    builder
        .item_id(key)
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: key.to_string(),
            expected_kind: "item",
        })
}

fn resolve_entries(
    builder: &RegistryBuilder,
    entries: &[EntryData],
    file: &Path,
) -> Result<Vec<Ingredient>, DataLoadError> {
    entries
        .iter()
        .map(|(key, amount)| {
            Ok(Ingredient::new(
                resolve_item(builder, key, file)?,
                resolve_amount(amount, file)?,
            ))
        })
        .collect()
}

// ===========================================================================
// Settings
// ===========================================================================

/// Load a settings file and apply it on top of the registry's defaults.
pub fn load_settings(path: &Path, registry: &Registry) -> Result<Configuration, DataLoadError> {
    let settings: SettingsFile = deserialize_file(path)?;
    apply_settings(&settings, registry, path)
}

/// Build a configuration from `settings`. Unknown keys are skipped with a
/// warning; malformed values are errors.
pub fn apply_settings(
    settings: &SettingsFile,
    registry: &Registry,
    file: &Path,
) -> Result<Configuration, DataLoadError> {
    let mut config = Configuration::new(registry);

    for target in &settings.targets {
        let Some(item) = registry.item_id(&target.item) else {
            tracing::warn!(key = %target.item, "unknown target item, skipping");
            continue;
        };
        let target = match (&target.rate, &target.buildings) {
            (Some(rate), None) => Target::rate(item, resolve_amount(rate, file)?),
            (None, Some(count)) => Target::buildings(item, resolve_amount(count, file)?),
            _ => {
                return Err(DataLoadError::InvalidTarget {
                    file: file.to_path_buf(),
                    item: target.item.clone(),
                });
            }
        };
        config.add_target(target);
    }

    for key in &settings.disabled {
        match registry.recipe_id(key) {
            Some(recipe) => config.disable(recipe),
            None => tracing::warn!(key = %key, "unknown disabled recipe, skipping"),
        }
    }

    for key in &settings.ignore {
        match registry.item_id(key) {
            Some(item) => config.ignore(item),
            None => tracing::warn!(key = %key, "unknown ignored item, skipping"),
        }
    }

    for (key, factor) in &settings.overclock {
        let Some(recipe) = registry.recipe_id(key) else {
            tracing::warn!(key = %key, "unknown overclocked recipe, skipping");
            continue;
        };
        config.set_overclock(recipe, resolve_amount(factor, file)?)?;
    }

    if let Some(tiers) = &settings.priority {
        config.priority.apply_keys(tiers, registry);
    }

    for (key, weight) in &settings.weights {
        let Some(recipe) = registry.recipe_id(key) else {
            tracing::warn!(key = %key, "unknown weighted recipe, skipping");
            continue;
        };
        match config.priority.set_weight(recipe, resolve_amount(weight, file)?) {
            Ok(()) => {}
            Err(PriorityError::NotListed(_)) => {
                tracing::warn!(key = %key, "weighted recipe has no priority tier, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    for (key, setting) in &settings.miners {
        let Some(recipe) = registry.recipe_id(key) else {
            tracing::warn!(key = %key, "unknown mined recipe, skipping");
            continue;
        };
        let Some(miner) = registry.building_id(&setting.miner) else {
            tracing::warn!(key = %setting.miner, "unknown miner, skipping");
            continue;
        };
        let purity = match setting.purity {
            PurityData::Impure => Purity::Impure,
            PurityData::Normal => Purity::Normal,
            PurityData::Pure => Purity::Pure,
        };
        config.set_miner(registry, recipe, miner, purity)?;
    }

    if let Some(key) = &settings.belt {
        match registry.belt_id(key) {
            Some(belt) => config.set_belt(belt),
            None => tracing::warn!(key = %key, "unknown belt, skipping"),
        }
    }

    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ratiocalc_core::config::TargetAmount;
    use ratiocalc_core::test_utils::q;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ratiocalc_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const GAME_JSON: &str = r#"{
        "items": [
            {"key": "ore", "name": "Ore"},
            {"key": "plate", "name": "Plate", "tier": 1},
            {"key": "gear", "name": "Gear", "tier": 2}
        ],
        "recipes": [
            {"key": "plate", "name": "Plate", "category": "smelter", "time": 2,
             "ingredients": [["ore", 1]], "products": [["plate", 1]]},
            {"key": "gear", "name": "Gear", "category": "assembler", "time": "1/2",
             "ingredients": [["plate", 2]], "products": [["gear", 1]]}
        ],
        "resources": [
            {"key": "ore-vein", "item": "ore", "category": "mineral"},
            {"key": "ore-scrap", "item": "ore", "priority": 1, "weight": 2}
        ],
        "crafters": [
            {"key": "smelter", "name": "Smelter", "category": "smelter", "power": 4},
            {"key": "assembler", "name": "Assembler", "category": "assembler", "power": 15}
        ],
        "miners": [
            {"key": "miner-mk1", "name": "Miner Mk.1", "category": "mineral", "base_rate": 0.5, "power": 5},
            {"key": "miner-mk2", "name": "Miner Mk.2", "category": "mineral", "base_rate": 1, "power": 12}
        ],
        "belts": [
            {"key": "belt1", "name": "Belt Mk.1", "rate": 10},
            {"key": "belt2", "name": "Belt Mk.2", "rate": 20}
        ]
    }"#;

    fn game_registry() -> Registry {
        let data: GameDataFile = parse_str(GAME_JSON, Format::Json, Path::new("game.json")).unwrap();
        build_registry(&data, Path::new("game.json")).unwrap()
    }

    fn settings(toml: &str) -> Result<Configuration, DataLoadError> {
        let registry = game_registry();
        let file = Path::new("settings.toml");
        let parsed: SettingsFile = parse_str(toml, Format::Toml, file)?;
        apply_settings(&parsed, &registry, file)
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("game.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("game.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("game.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["game.yaml", "game"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // Amounts
    // -----------------------------------------------------------------------

    #[test]
    fn amounts_resolve_exactly() {
        let file = Path::new("x.json");
        assert_eq!(resolve_amount(&AmountData::Integer(3), file).unwrap(), q("3"));
        assert_eq!(resolve_amount(&AmountData::Float(0.25), file).unwrap(), q("1/4"));
        assert_eq!(
            resolve_amount(&AmountData::Text("2+1/3".to_string()), file).unwrap(),
            q("7/3")
        );
    }

    #[test]
    fn bad_amounts_are_rejected() {
        let file = Path::new("x.json");
        assert!(matches!(
            resolve_amount(&AmountData::Text("1/0".to_string()), file),
            Err(DataLoadError::InvalidAmount { .. })
        ));
        assert!(matches!(
            resolve_amount(&AmountData::Text("lots".to_string()), file),
            Err(DataLoadError::InvalidAmount { .. })
        ));
        assert!(matches!(
            resolve_amount(&AmountData::Float(f64::NAN), file),
            Err(DataLoadError::InvalidAmount { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Game data
    // -----------------------------------------------------------------------

    #[test]
    fn registry_from_json() {
        let registry = game_registry();
        let gear = registry.recipe_id("gear").unwrap();
        let plate = registry.item_id("plate").unwrap();
        assert_eq!(registry[gear].time, q("1/2"));
        assert_eq!(registry[gear].consumes(plate), Some(q("2")));
        assert_eq!(registry.item_count(), 3);
        assert_eq!(registry.resource_recipes().count(), 2);
        assert_eq!(registry.buildings_for("mineral").len(), 2);
        assert_eq!(registry.belts().count(), 2);
    }

    #[test]
    fn resource_key_defaults_to_item() {
        let json = r#"{
            "items": [{"key": "ore", "name": "Ore"}],
            "recipes": [],
            "resources": [{"item": "ore"}]
        }"#;
        let data: GameDataFile = parse_str(json, Format::Json, Path::new("g.json")).unwrap();
        let registry = build_registry(&data, Path::new("g.json")).unwrap();
        assert!(registry.recipe_id("ore").is_some());
    }

    #[test]
    fn unknown_item_in_recipe_is_an_error() {
        let json = r#"{
            "items": [{"key": "plate", "name": "Plate"}],
            "recipes": [{"key": "plate", "name": "Plate", "time": 1,
                         "ingredients": [["unobtainium", 1]], "products": [["plate", 1]]}]
        }"#;
        let data: GameDataFile = parse_str(json, Format::Json, Path::new("g.json")).unwrap();
        let result = build_registry(&data, Path::new("g.json"));
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "item", .. }) if name == "unobtainium"
        ));
    }

    #[test]
    fn registry_errors_propagate() {
        let json = r#"{
            "items": [{"key": "plate", "name": "Plate"}, {"key": "plate", "name": "Again"}],
            "recipes": []
        }"#;
        let data: GameDataFile = parse_str(json, Format::Json, Path::new("g.json")).unwrap();
        assert!(matches!(
            build_registry(&data, Path::new("g.json")),
            Err(DataLoadError::Registry(RegistryError::DuplicateKey { .. }))
        ));
    }

    #[test]
    fn load_game_data_from_file() {
        let dir = make_test_dir("load_game");
        let path = dir.join("game.json");
        fs::write(&path, GAME_JSON).unwrap();

        let registry = load_game_data(&path).unwrap();
        assert!(registry.item_id("gear").is_some());

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_parse_error() {
        let dir = make_test_dir("load_game_bad");
        let path = dir.join("game.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        assert!(matches!(load_game_data(&path), Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_missing_file() {
        let path = std::env::temp_dir().join("ratiocalc_no_such_file.json");
        assert!(matches!(load_game_data(&path), Err(DataLoadError::Io(_))));
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    #[test]
    fn settings_resolve_against_registry() {
        let registry = game_registry();
        let config = settings(
            r#"
disabled = ["plate"]
ignore = ["ore"]
belt = "belt2"
priority = [["ore-scrap"], ["ore-vein"]]

[[targets]]
item = "gear"
rate = "5/2"

[[targets]]
item = "plate"
buildings = 3

[overclock]
gear = 1.5

[weights]
ore-vein = 3

[miners.ore-vein]
miner = "miner-mk1"
purity = "impure"
"#,
        )
        .unwrap();

        let gear = registry.item_id("gear").unwrap();
        let vein = registry.recipe_id("ore-vein").unwrap();
        let scrap = registry.recipe_id("ore-scrap").unwrap();
        assert!(config.is_disabled(registry.recipe_id("plate").unwrap()));
        assert!(config.is_ignored(registry.item_id("ore").unwrap()));
        assert_eq!(config.belt(), registry.belt_id("belt2"));
        assert_eq!(config.priority.level_of(scrap), Some(0));
        assert_eq!(config.priority.level_of(vein), Some(1));
        assert_eq!(config.priority.weight_of(vein), Some(&q("3")));
        assert_eq!(config.overclock(registry.recipe_id("gear").unwrap()), q("3/2"));
        assert_eq!(config.targets()[0], Target::rate(gear, q("5/2")));
        assert_eq!(config.targets()[1].amount, TargetAmount::Buildings(q("3")));
        let setting = config.miner_setting(vein).unwrap();
        assert_eq!(Some(setting.miner), registry.building_id("miner-mk1"));
        assert_eq!(setting.purity, Purity::Impure);
    }

    #[test]
    fn unknown_settings_keys_are_skipped() {
        let config = settings(
            r#"
disabled = ["no-such-recipe"]
ignore = ["no-such-item"]
belt = "no-such-belt"
priority = [["no-such-resource"], ["ore-vein"]]

[[targets]]
item = "no-such-item"
rate = 1

[overclock]
no-such-recipe = 2

[miners.ore-vein]
miner = "no-such-miner"
"#,
        )
        .unwrap();
        let registry = game_registry();
        assert_eq!(config.disabled().count(), 0);
        assert_eq!(config.ignored().count(), 0);
        assert!(config.targets().is_empty());
        assert_eq!(config.belt(), registry.belt_id("belt1"));
        // The unknown tier empties out and is pruned.
        assert_eq!(config.priority.level_of(registry.recipe_id("ore-vein").unwrap()), Some(0));
    }

    #[test]
    fn default_miner_is_last_in_category() {
        let registry = game_registry();
        let config = settings("").unwrap();
        let vein = registry.recipe_id("ore-vein").unwrap();
        assert_eq!(
            config.miner_setting(vein).map(|s| s.miner),
            registry.building_id("miner-mk2")
        );
    }

    #[test]
    fn target_needs_exactly_one_amount() {
        let both = settings("[[targets]]\nitem = \"gear\"\nrate = 1\nbuildings = 1\n");
        assert!(matches!(both, Err(DataLoadError::InvalidTarget { .. })));
        let neither = settings("[[targets]]\nitem = \"gear\"\n");
        assert!(matches!(neither, Err(DataLoadError::InvalidTarget { .. })));
    }

    #[test]
    fn bad_setting_values_are_errors() {
        assert!(matches!(
            settings("[overclock]\ngear = 0\n"),
            Err(DataLoadError::Config(ConfigError::NonPositiveOverclock(_)))
        ));
        assert!(matches!(
            settings("[weights]\nore-vein = -1\n"),
            Err(DataLoadError::Priority(PriorityError::NonPositiveWeight(_)))
        ));
        assert!(matches!(
            settings("[miners.ore-vein]\nminer = \"smelter\"\n"),
            Err(DataLoadError::Config(ConfigError::NotAMiner(_)))
        ));
    }

    #[test]
    fn load_settings_from_ron() {
        let dir = make_test_dir("load_settings");
        let game = dir.join("game.json");
        let path = dir.join("settings.ron");
        fs::write(&game, GAME_JSON).unwrap();
        fs::write(
            &path,
            r#"(targets: [(item: "gear", rate: Some(10))], ignore: ["ore"])"#,
        )
        .unwrap();

        let registry = load_game_data(&game).unwrap();
        let config = load_settings(&path, &registry).unwrap();
        assert_eq!(config.targets().len(), 1);
        assert_eq!(config.ignored().count(), 1);

        cleanup(&dir);
    }
}
