use crate::id::*;
use crate::rational::Rational;
use std::collections::HashMap;
use std::ops::Index;

/// Physical phase of an item. Only used downstream (belts vs. pipes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Solid,
    Fluid,
}

/// A produced or consumed good.
#[derive(Debug, Clone)]
pub struct Item {
    pub key: String,
    pub name: String,
    /// Acquisition-difficulty ordering.
    pub tier: u32,
    pub phase: Phase,
    recipes: Vec<RecipeId>,
    uses: Vec<RecipeId>,
}

impl Item {
    /// Real recipes that produce this item, in registration order.
    pub fn recipes(&self) -> &[RecipeId] {
        &self.recipes
    }

    /// Real recipes that consume this item, in registration order.
    pub fn uses(&self) -> &[RecipeId] {
        &self.uses
    }
}

/// A fixed per-cycle quantity of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub item: ItemId,
    pub amount: Rational,
}

impl Ingredient {
    pub fn new(item: ItemId, amount: Rational) -> Self {
        Self { item, amount }
    }
}

/// Discriminates the recipe variants the solver distinguishes.
///
/// Only recipes that can run live here. The terminal Output and Surplus
/// nodes of a solution are [`SolutionNode`](crate::totals::SolutionNode)
/// variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeKind {
    /// An ordinary crafting process.
    Normal,
    /// Raw extraction: zero time, no ingredients.
    Resource {
        default_priority: usize,
        default_weight: Rational,
    },
    /// Ex-nihilo fallback producing one unit of a single item from nothing.
    Disabled,
}

/// A fixed-ratio conversion process.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub key: String,
    pub name: String,
    /// Building category that runs this recipe, `None` for ex-nihilo
    /// recipes and uncategorized resources.
    pub category: Option<String>,
    /// Cycle time in seconds.
    pub time: Rational,
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Ingredient>,
    pub kind: RecipeKind,
}

impl Recipe {
    /// Amount of `item` produced per cycle, if this recipe produces it.
    pub fn gives(&self, item: ItemId) -> Option<Rational> {
        sum_matching(&self.products, item)
    }

    /// Amount of `item` consumed per cycle, if this recipe consumes it.
    pub fn consumes(&self, item: ItemId) -> Option<Rational> {
        sum_matching(&self.ingredients, item)
    }

    /// True for recipes loaded from game data (normal and resource).
    pub fn is_real(&self) -> bool {
        matches!(self.kind, RecipeKind::Normal | RecipeKind::Resource { .. })
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, RecipeKind::Resource { .. })
    }

    /// Recipes the optimizer must only use as a last resort.
    pub fn is_max_priority(&self) -> bool {
        matches!(self.kind, RecipeKind::Disabled)
    }

    fn disabled(id: ItemId, item: &Item) -> Recipe {
        Recipe {
            key: item.key.clone(),
            name: item.name.clone(),
            category: None,
            time: Rational::zero(),
            ingredients: Vec::new(),
            products: vec![Ingredient::new(id, Rational::one())],
            kind: RecipeKind::Disabled,
        }
    }
}

fn sum_matching(entries: &[Ingredient], item: ItemId) -> Option<Rational> {
    entries
        .iter()
        .filter(|ing| ing.item == item)
        .map(|ing| &ing.amount)
        .fold(None, |acc: Option<Rational>, amount| {
            Some(acc.map_or_else(|| amount.clone(), |sum| sum + amount))
        })
}

/// How a building turns recipe cycles into throughput.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingKind {
    /// Runs `speed` recipe cycles per cycle time.
    Crafter { speed: Rational },
    /// Extracts `base_rate` items per second at normal purity.
    Miner { base_rate: Rational },
}

/// A building type that runs recipes of one category.
#[derive(Debug, Clone)]
pub struct Building {
    pub key: String,
    pub name: String,
    pub category: String,
    /// Power draw per building at 100% clock.
    pub power: Rational,
    pub kind: BuildingKind,
}

/// A belt tier with its throughput in items per second.
#[derive(Debug, Clone)]
pub struct Belt {
    pub key: String,
    pub name: String,
    pub rate: Rational,
}

/// Builder for constructing an immutable Registry.
/// Two-phase lifecycle: registration -> finalization.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    items: Vec<Item>,
    item_key_to_id: HashMap<String, ItemId>,
    recipes: Vec<Recipe>,
    recipe_key_to_id: HashMap<String, RecipeId>,
    buildings: Vec<Building>,
    building_key_to_id: HashMap<String, BuildingId>,
    belts: Vec<Belt>,
    belt_key_to_id: HashMap<String, BeltId>,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Returns its ID.
    pub fn register_item(&mut self, key: &str, name: &str, tier: u32, phase: Phase) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.items.push(Item {
            key: key.to_string(),
            name: name.to_string(),
            tier,
            phase,
            recipes: Vec::new(),
            uses: Vec::new(),
        });
        if self.item_key_to_id.insert(key.to_string(), id).is_some() {
            self.errors.push(RegistryError::DuplicateKey {
                kind: "item",
                key: key.to_string(),
            });
        }
        id
    }

    /// Register an ordinary recipe. Returns its ID.
    pub fn register_recipe(
        &mut self,
        key: &str,
        name: &str,
        category: Option<&str>,
        time: Rational,
        ingredients: Vec<Ingredient>,
        products: Vec<Ingredient>,
    ) -> RecipeId {
        self.push_recipe(Recipe {
            key: key.to_string(),
            name: name.to_string(),
            category: category.map(str::to_string),
            time,
            ingredients,
            products,
            kind: RecipeKind::Normal,
        })
    }

    /// Register a raw-extraction recipe yielding one `item` per unit rate.
    pub fn register_resource(
        &mut self,
        key: &str,
        item: ItemId,
        category: Option<&str>,
        default_priority: usize,
        default_weight: Rational,
    ) -> RecipeId {
        let Some(def) = self.items.get(item.index()) else {
            self.errors.push(RegistryError::InvalidItemRef(item));
            return RecipeId(u32::MAX);
        };
        let name = def.name.clone();
        self.push_recipe(Recipe {
            key: key.to_string(),
            name,
            category: category.map(str::to_string),
            time: Rational::zero(),
            ingredients: Vec::new(),
            products: vec![Ingredient::new(item, Rational::one())],
            kind: RecipeKind::Resource {
                default_priority,
                default_weight,
            },
        })
    }

    /// Register a crafting building for a recipe category.
    pub fn register_crafter(
        &mut self,
        key: &str,
        name: &str,
        category: &str,
        speed: Rational,
        power: Rational,
    ) -> BuildingId {
        self.push_building(Building {
            key: key.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            power,
            kind: BuildingKind::Crafter { speed },
        })
    }

    /// Register a miner for a resource category.
    pub fn register_miner(
        &mut self,
        key: &str,
        name: &str,
        category: &str,
        base_rate: Rational,
        power: Rational,
    ) -> BuildingId {
        self.push_building(Building {
            key: key.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            power,
            kind: BuildingKind::Miner { base_rate },
        })
    }

    /// Register a belt tier.
    pub fn register_belt(&mut self, key: &str, name: &str, rate: Rational) -> BeltId {
        let id = BeltId(self.belts.len() as u32);
        if !rate.is_positive() {
            self.errors.push(RegistryError::NonPositiveRate(key.to_string()));
        }
        self.belts.push(Belt {
            key: key.to_string(),
            name: name.to_string(),
            rate,
        });
        if self.belt_key_to_id.insert(key.to_string(), id).is_some() {
            self.errors.push(RegistryError::DuplicateKey {
                kind: "belt",
                key: key.to_string(),
            });
        }
        id
    }

    /// Lookup item ID by key.
    pub fn item_id(&self, key: &str) -> Option<ItemId> {
        self.item_key_to_id.get(key).copied()
    }

    /// Lookup recipe ID by key.
    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_key_to_id.get(key).copied()
    }

    fn push_recipe(&mut self, recipe: Recipe) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        if self.recipe_key_to_id.insert(recipe.key.clone(), id).is_some() {
            self.errors.push(RegistryError::DuplicateKey {
                kind: "recipe",
                key: recipe.key.clone(),
            });
        }
        self.recipes.push(recipe);
        id
    }

    fn push_building(&mut self, building: Building) -> BuildingId {
        let id = BuildingId(self.buildings.len() as u32);
        let rate = match &building.kind {
            BuildingKind::Crafter { speed } => speed,
            BuildingKind::Miner { base_rate } => base_rate,
        };
        if !rate.is_positive() {
            self.errors
                .push(RegistryError::NonPositiveRate(building.key.clone()));
        }
        if self
            .building_key_to_id
            .insert(building.key.clone(), id)
            .is_some()
        {
            self.errors.push(RegistryError::DuplicateKey {
                kind: "building",
                key: building.key.clone(),
            });
        }
        self.buildings.push(building);
        id
    }

    fn validate_recipe(&self, recipe: &Recipe) -> Result<(), RegistryError> {
        for entry in recipe.ingredients.iter().chain(recipe.products.iter()) {
            if entry.item.index() >= self.items.len() {
                return Err(RegistryError::InvalidItemRef(entry.item));
            }
            if !entry.amount.is_positive() {
                return Err(RegistryError::NonPositiveAmount(recipe.key.clone()));
            }
        }
        if recipe.products.is_empty() {
            return Err(RegistryError::NoProducts(recipe.key.clone()));
        }
        if recipe.kind == RecipeKind::Normal && !recipe.time.is_positive() {
            return Err(RegistryError::NonPositiveTime(recipe.key.clone()));
        }
        if let RecipeKind::Resource { default_weight, .. } = &recipe.kind
            && !default_weight.is_positive()
        {
            return Err(RegistryError::NonPositiveAmount(recipe.key.clone()));
        }
        Ok(())
    }

    /// Finalize and build the immutable registry.
    ///
    /// Items that no recipe produces get an implicit resource recipe, and
    /// every item gets its disabled (ex-nihilo) fallback recipe.
    pub fn build(mut self) -> Result<Registry, RegistryError> {
        if let Some(err) = self.errors.drain(..).next() {
            return Err(err);
        }
        for recipe in &self.recipes {
            self.validate_recipe(recipe)?;
        }

        // Link producers and consumers.
        for (idx, recipe) in self.recipes.iter().enumerate() {
            let id = RecipeId(idx as u32);
            for product in &recipe.products {
                let recipes = &mut self.items[product.item.index()].recipes;
                if !recipes.contains(&id) {
                    recipes.push(id);
                }
            }
            for ingredient in &recipe.ingredients {
                let uses = &mut self.items[ingredient.item.index()].uses;
                if !uses.contains(&id) {
                    uses.push(id);
                }
            }
        }

        // Items nothing produces are raw resources.
        for idx in 0..self.items.len() {
            if !self.items[idx].recipes.is_empty() {
                continue;
            }
            let item = ItemId(idx as u32);
            let id = RecipeId(self.recipes.len() as u32);
            let def = &self.items[idx];
            self.recipe_key_to_id.entry(def.key.clone()).or_insert(id);
            self.recipes.push(Recipe {
                key: def.key.clone(),
                name: def.name.clone(),
                category: None,
                time: Rational::zero(),
                ingredients: Vec::new(),
                products: vec![Ingredient::new(item, Rational::one())],
                kind: RecipeKind::Resource {
                    default_priority: 0,
                    default_weight: Rational::one(),
                },
            });
            self.items[idx].recipes.push(id);
        }

        let real_recipe_count = self.recipes.len();
        let mut disable_recipes = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.iter().enumerate() {
            disable_recipes.push(RecipeId(self.recipes.len() as u32));
            self.recipes.push(Recipe::disabled(ItemId(idx as u32), item));
        }

        let mut buildings_by_category: HashMap<String, Vec<BuildingId>> = HashMap::new();
        for (idx, building) in self.buildings.iter().enumerate() {
            buildings_by_category
                .entry(building.category.clone())
                .or_default()
                .push(BuildingId(idx as u32));
        }

        Ok(Registry {
            items: self.items,
            item_key_to_id: self.item_key_to_id,
            recipes: self.recipes,
            recipe_key_to_id: self.recipe_key_to_id,
            real_recipe_count,
            disable_recipes,
            buildings: self.buildings,
            building_key_to_id: self.building_key_to_id,
            buildings_by_category,
            belts: self.belts,
            belt_key_to_id: self.belt_key_to_id,
        })
    }
}

/// Immutable catalog of items, recipes, buildings and belts.
/// Frozen after build(); read-only during every solve.
#[derive(Debug)]
pub struct Registry {
    items: Vec<Item>,
    item_key_to_id: HashMap<String, ItemId>,
    recipes: Vec<Recipe>,
    recipe_key_to_id: HashMap<String, RecipeId>,
    real_recipe_count: usize,
    disable_recipes: Vec<RecipeId>,
    buildings: Vec<Building>,
    building_key_to_id: HashMap<String, BuildingId>,
    buildings_by_category: HashMap<String, Vec<BuildingId>>,
    belts: Vec<Belt>,
    belt_key_to_id: HashMap<String, BeltId>,
}

impl Registry {
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.index())
    }

    pub fn get_building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id.index())
    }

    pub fn get_belt(&self, id: BeltId) -> Option<&Belt> {
        self.belts.get(id.index())
    }

    pub fn item_id(&self, key: &str) -> Option<ItemId> {
        self.item_key_to_id.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_key_to_id.get(key).copied()
    }

    pub fn building_id(&self, key: &str) -> Option<BuildingId> {
        self.building_key_to_id.get(key).copied()
    }

    pub fn belt_id(&self, key: &str) -> Option<BeltId> {
        self.belt_key_to_id.get(key).copied()
    }

    /// The ex-nihilo fallback recipe for `item`.
    pub fn disable_recipe(&self, item: ItemId) -> Option<RecipeId> {
        self.disable_recipes.get(item.index()).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, item)| (ItemId(idx as u32), item))
    }

    /// Real (normal and resource) recipes in registration order.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes[..self.real_recipe_count]
            .iter()
            .enumerate()
            .map(|(idx, recipe)| (RecipeId(idx as u32), recipe))
    }

    pub fn resource_recipes(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes().filter(|(_, recipe)| recipe.is_resource())
    }

    /// Buildings able to run recipes of `category`, in registration order.
    pub fn buildings_for(&self, category: &str) -> &[BuildingId] {
        self.buildings_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn belts(&self) -> impl Iterator<Item = (BeltId, &Belt)> {
        self.belts
            .iter()
            .enumerate()
            .map(|(idx, belt)| (BeltId(idx as u32), belt))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of real recipes, excluding the disabled fallbacks.
    pub fn recipe_count(&self) -> usize {
        self.real_recipe_count
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}

/// Panics on an id minted by a different registry.
impl Index<ItemId> for Registry {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }
}

/// Panics on an id minted by a different registry.
impl Index<RecipeId> for Registry {
    type Output = Recipe;

    fn index(&self, id: RecipeId) -> &Recipe {
        &self.recipes[id.index()]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemId),
    #[error("recipe {0} has a non-positive amount")]
    NonPositiveAmount(String),
    #[error("recipe {0} has a non-positive cycle time")]
    NonPositiveTime(String),
    #[error("recipe {0} has no products")]
    NoProducts(String),
    #[error("{0} has a non-positive rate")]
    NonPositiveRate(String),
}
