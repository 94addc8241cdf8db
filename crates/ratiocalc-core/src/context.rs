use crate::config::Configuration;
use crate::id::*;
use crate::registry::Registry;
use std::collections::HashSet;

/// Everything a solve reads: the frozen registry and the active
/// configuration. Cheap to copy; borrowed for the duration of one solve.
#[derive(Debug, Clone, Copy)]
pub struct SolverContext<'a> {
    pub registry: &'a Registry,
    pub config: &'a Configuration,
}

impl<'a> SolverContext<'a> {
    pub fn new(registry: &'a Registry, config: &'a Configuration) -> Self {
        Self { registry, config }
    }

    pub fn is_disabled(&self, recipe: RecipeId) -> bool {
        self.config.is_disabled(recipe)
    }

    pub fn is_ignored(&self, item: ItemId) -> bool {
        self.config.is_ignored(item)
    }

    /// Recipes currently eligible to produce `item`.
    ///
    /// Enabled real recipes come first. An ignored item keeps only the
    /// multi-output recipes that still yield a non-ignored co-product, and
    /// gains its disabled fallback. An item with no enabled recipe falls back
    /// to its disabled recipe alone.
    pub fn recipes_for(&self, item: ItemId) -> Vec<RecipeId> {
        let Some(def) = self.registry.get_item(item) else {
            return Vec::new();
        };
        let mut recipes: Vec<RecipeId> = def
            .recipes()
            .iter()
            .copied()
            .filter(|r| !self.is_disabled(*r))
            .collect();
        if self.is_ignored(item) {
            recipes.retain(|r| {
                let products = &self.registry[*r].products;
                products.len() > 1
                    && products
                        .iter()
                        .any(|p| p.item != item && !self.is_ignored(p.item))
            });
            recipes.extend(self.registry.disable_recipe(item));
        } else if recipes.is_empty() {
            recipes.extend(self.registry.disable_recipe(item));
        }
        recipes
    }

    /// Enabled real recipes that consume `item`.
    pub fn uses_of(&self, item: ItemId) -> Vec<RecipeId> {
        self.registry
            .get_item(item)
            .map(|def| {
                def.uses()
                    .iter()
                    .copied()
                    .filter(|r| !self.is_disabled(*r))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every recipe reachable from `targets` through eligible producers and
    /// their ingredients, in depth-first discovery order.
    pub fn recipe_graph<I>(&self, targets: I) -> Vec<RecipeId>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut order = Vec::new();
        let mut seen_recipes = HashSet::new();
        let mut seen_items = HashSet::new();
        let mut stack: Vec<ItemId> = targets.into_iter().collect();
        stack.reverse();

        while let Some(item) = stack.pop() {
            if !seen_items.insert(item) {
                continue;
            }
            for recipe in self.recipes_for(item) {
                if !seen_recipes.insert(recipe) {
                    continue;
                }
                order.push(recipe);
                for ingredient in self.registry[recipe].ingredients.iter().rev() {
                    stack.push(ingredient.item);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn enabled_recipes_only() {
        let f = two_tier_fixture();
        let ctx = SolverContext::new(&f.registry, &f.config);
        let plate = f.item("plate");
        assert_eq!(ctx.recipes_for(plate), vec![f.recipe("plate-from-ore")]);
    }

    #[test]
    fn multiple_producers_all_listed() {
        let f = two_tier_fixture();
        let ctx = SolverContext::new(&f.registry, &f.config);
        let ore = f.item("ore");
        assert_eq!(
            ctx.recipes_for(ore),
            vec![f.recipe("ore-vein"), f.recipe("ore-scrap")]
        );
    }

    #[test]
    fn all_disabled_falls_back_to_disable_recipe() {
        let mut f = disabled_only_fixture();
        f.config.disable(f.recipe("widget"));
        let ctx = SolverContext::new(&f.registry, &f.config);
        let widget = f.item("widget");
        let disable = f.registry.disable_recipe(widget).unwrap();
        assert_eq!(ctx.recipes_for(widget), vec![disable]);
    }

    #[test]
    fn ignored_item_keeps_multi_output_with_live_coproduct() {
        let mut f = multi_output_fixture();
        let heavy = f.item("heavy-oil");
        f.config.ignore(heavy);
        let ctx = SolverContext::new(&f.registry, &f.config);
        let recipes = ctx.recipes_for(heavy);
        assert_eq!(
            recipes,
            vec![
                f.recipe("oil-processing"),
                f.registry.disable_recipe(heavy).unwrap()
            ]
        );
    }

    #[test]
    fn ignored_item_drops_multi_output_when_coproducts_ignored() {
        let mut f = multi_output_fixture();
        let heavy = f.item("heavy-oil");
        let light = f.item("light-oil");
        f.config.ignore(heavy);
        f.config.ignore(light);
        let ctx = SolverContext::new(&f.registry, &f.config);
        assert_eq!(
            ctx.recipes_for(heavy),
            vec![f.registry.disable_recipe(heavy).unwrap()]
        );
    }

    #[test]
    fn ignored_item_drops_single_output_recipes() {
        let mut f = chain_fixture();
        let plate = f.item("plate");
        f.config.ignore(plate);
        let ctx = SolverContext::new(&f.registry, &f.config);
        assert_eq!(
            ctx.recipes_for(plate),
            vec![f.registry.disable_recipe(plate).unwrap()]
        );
    }

    #[test]
    fn uses_skip_disabled() {
        let mut f = chain_fixture();
        let plate = f.item("plate");
        let ctx = SolverContext::new(&f.registry, &f.config);
        assert_eq!(ctx.uses_of(plate), vec![f.recipe("gear")]);
        f.config.disable(f.recipe("gear"));
        let ctx = SolverContext::new(&f.registry, &f.config);
        assert!(ctx.uses_of(plate).is_empty());
    }

    #[test]
    fn recipe_graph_walks_chain() {
        let f = chain_fixture();
        let ctx = SolverContext::new(&f.registry, &f.config);
        let graph = ctx.recipe_graph([f.item("gear")]);
        assert_eq!(
            graph,
            vec![f.recipe("gear"), f.recipe("plate"), f.recipe("ore")]
        );
    }

    #[test]
    fn recipe_graph_terminates_on_cycles() {
        let f = cycle_fixture();
        let ctx = SolverContext::new(&f.registry, &f.config);
        let graph = ctx.recipe_graph([f.item("a")]);
        assert_eq!(graph, vec![f.recipe("make-a"), f.recipe("make-b")]);
    }

    #[test]
    fn recipe_graph_stops_at_ignored_items() {
        let mut f = chain_fixture();
        let plate = f.item("plate");
        f.config.ignore(plate);
        let ctx = SolverContext::new(&f.registry, &f.config);
        let graph = ctx.recipe_graph([f.item("gear")]);
        assert_eq!(
            graph,
            vec![f.recipe("gear"), f.registry.disable_recipe(plate).unwrap()]
        );
    }
}
