use crate::id::*;
use crate::rational::Rational;
use crate::registry::{Ingredient, Registry};
use std::collections::{BTreeMap, HashMap};

/// A node of the solution graph: a real (or ex-nihilo) recipe, or one of the
/// two terminal nodes. The terminals exist only in solutions, never in the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SolutionNode {
    Recipe(RecipeId),
    /// Consumes the solve targets.
    Output,
    /// Consumes production nobody needs.
    Surplus,
}

/// Production and consumption of one item across a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFlow {
    pub production: Rational,
    pub consumption: Rational,
}

impl ItemFlow {
    pub fn is_balanced(&self) -> bool {
        self.production == self.consumption
    }
}

/// Aggregated result of a solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    rates: BTreeMap<SolutionNode, Rational>,
    heights: BTreeMap<SolutionNode, usize>,
    outputs: Vec<Ingredient>,
    surplus: BTreeMap<ItemId, Rational>,
}

impl Totals {
    /// Assemble totals from recipe rates. The output node is always present;
    /// the surplus node only when something is left over.
    pub fn new(
        registry: &Registry,
        outputs: Vec<Ingredient>,
        recipe_rates: BTreeMap<RecipeId, Rational>,
        surplus: BTreeMap<ItemId, Rational>,
    ) -> Self {
        let mut rates: BTreeMap<SolutionNode, Rational> = recipe_rates
            .into_iter()
            .filter(|(_, rate)| rate.is_positive())
            .map(|(recipe, rate)| (SolutionNode::Recipe(recipe), rate))
            .collect();
        rates.insert(SolutionNode::Output, Rational::one());
        if !surplus.is_empty() {
            rates.insert(SolutionNode::Surplus, Rational::one());
        }
        let mut totals = Totals {
            rates,
            heights: BTreeMap::new(),
            outputs,
            surplus,
        };
        totals.heights = totals.compute_heights(registry);
        totals
    }

    pub fn rate(&self, node: SolutionNode) -> Option<&Rational> {
        self.rates.get(&node)
    }

    pub fn recipe_rate(&self, recipe: RecipeId) -> Option<&Rational> {
        self.rate(SolutionNode::Recipe(recipe))
    }

    pub fn rates(&self) -> impl Iterator<Item = (SolutionNode, &Rational)> {
        self.rates.iter().map(|(node, rate)| (*node, rate))
    }

    /// Rates of real and ex-nihilo recipes, without the pseudo nodes.
    pub fn recipe_rates(&self) -> impl Iterator<Item = (RecipeId, &Rational)> {
        self.rates.iter().filter_map(|(node, rate)| match node {
            SolutionNode::Recipe(recipe) => Some((*recipe, rate)),
            _ => None,
        })
    }

    pub fn height(&self, node: SolutionNode) -> Option<usize> {
        self.heights.get(&node).copied()
    }

    pub fn outputs(&self) -> &[Ingredient] {
        &self.outputs
    }

    pub fn surplus(&self) -> &BTreeMap<ItemId, Rational> {
        &self.surplus
    }

    /// Nodes ordered for display: tallest first, ties by node order.
    pub fn ordered(&self) -> Vec<SolutionNode> {
        let mut nodes: Vec<SolutionNode> = self.rates.keys().copied().collect();
        nodes.sort_by_key(|node| (std::cmp::Reverse(self.heights.get(node).copied()), *node));
        nodes
    }

    /// Per-cycle inputs of `node`.
    pub fn consumed(&self, registry: &Registry, node: SolutionNode) -> Vec<Ingredient> {
        match node {
            SolutionNode::Recipe(recipe) => registry
                .get_recipe(recipe)
                .map(|r| r.ingredients.clone())
                .unwrap_or_default(),
            SolutionNode::Output => self.outputs.clone(),
            SolutionNode::Surplus => self
                .surplus
                .iter()
                .map(|(item, rate)| Ingredient::new(*item, rate.clone()))
                .collect(),
        }
    }

    /// Per-cycle outputs of `node`. Pseudo nodes produce nothing.
    pub fn produced(&self, registry: &Registry, node: SolutionNode) -> Vec<Ingredient> {
        match node {
            SolutionNode::Recipe(recipe) => registry
                .get_recipe(recipe)
                .map(|r| r.products.clone())
                .unwrap_or_default(),
            SolutionNode::Output | SolutionNode::Surplus => Vec::new(),
        }
    }

    /// Total production and consumption of `item`, counting targets and
    /// surplus as consumption.
    pub fn item_flow(&self, registry: &Registry, item: ItemId) -> ItemFlow {
        let mut production = Rational::zero();
        let mut consumption = Rational::zero();
        for (node, rate) in &self.rates {
            for product in self.produced(registry, *node) {
                if product.item == item {
                    production += &(rate * &product.amount);
                }
            }
            for ingredient in self.consumed(registry, *node) {
                if ingredient.item == item {
                    consumption += &(rate * &ingredient.amount);
                }
            }
        }
        ItemFlow {
            production,
            consumption,
        }
    }

    /// Merge `other` into `self`: recipe rates and surplus add, target lists
    /// merge, and every height only ever grows.
    pub fn combine(&mut self, other: &Totals) {
        for (node, rate) in &other.rates {
            match node {
                SolutionNode::Recipe(_) => {
                    *self.rates.entry(*node).or_default() += rate;
                }
                SolutionNode::Output | SolutionNode::Surplus => {
                    self.rates.insert(*node, Rational::one());
                }
            }
        }
        for output in &other.outputs {
            match self.outputs.iter_mut().find(|o| o.item == output.item) {
                Some(existing) => existing.amount += &output.amount,
                None => self.outputs.push(output.clone()),
            }
        }
        for (item, rate) in &other.surplus {
            *self.surplus.entry(*item).or_default() += rate;
        }
        for (node, height) in &other.heights {
            let entry = self.heights.entry(*node).or_insert(*height);
            *entry = (*entry).max(*height);
        }
    }

    /// Height of each node: zero for sinks, otherwise one more than the
    /// tallest consumer of its products. DFS back edges are dropped.
    fn compute_heights(&self, registry: &Registry) -> BTreeMap<SolutionNode, usize> {
        let nodes: Vec<SolutionNode> = self.rates.keys().copied().collect();
        let mut consumers: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            for ingredient in self.consumed(registry, *node) {
                let list = consumers.entry(ingredient.item).or_default();
                if !list.contains(&idx) {
                    list.push(idx);
                }
            }
        }
        let successors: Vec<Vec<usize>> = nodes
            .iter()
            .map(|node| {
                let mut next: Vec<usize> = Vec::new();
                for product in self.produced(registry, *node) {
                    for &c in consumers.get(&product.item).into_iter().flatten() {
                        if !next.contains(&c) {
                            next.push(c);
                        }
                    }
                }
                next
            })
            .collect();

        #[derive(Clone, Copy, PartialEq)]
        enum State {
            New,
            Open,
            Done,
        }
        let mut state = vec![State::New; nodes.len()];
        let mut height = vec![0usize; nodes.len()];
        let mut frames: Vec<(usize, usize)> = Vec::new();
        for root in 0..nodes.len() {
            if state[root] != State::New {
                continue;
            }
            state[root] = State::Open;
            frames.push((root, 0));
            while let Some(frame) = frames.last_mut() {
                let v = frame.0;
                if frame.1 < successors[v].len() {
                    let w = successors[v][frame.1];
                    frame.1 += 1;
                    match state[w] {
                        State::New => {
                            state[w] = State::Open;
                            frames.push((w, 0));
                        }
                        State::Done => height[v] = height[v].max(height[w] + 1),
                        State::Open => {}
                    }
                    continue;
                }
                frames.pop();
                state[v] = State::Done;
                if let Some(&(parent, _)) = frames.last() {
                    height[parent] = height[parent].max(height[v] + 1);
                }
            }
        }
        nodes.into_iter().zip(height).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solve::solve;
    use crate::test_utils::*;

    #[test]
    fn chain_heights_increase_upstream() {
        let f = chain_fixture();
        let totals = solve(&f.ctx(), &[(f.item("gear"), q("1"))]).unwrap().totals;
        assert_eq!(totals.height(SolutionNode::Output), Some(0));
        assert_eq!(totals.height(SolutionNode::Recipe(f.recipe("gear"))), Some(1));
        assert_eq!(totals.height(SolutionNode::Recipe(f.recipe("plate"))), Some(2));
        assert_eq!(totals.height(SolutionNode::Recipe(f.recipe("ore"))), Some(3));
        assert_eq!(
            totals.ordered().first(),
            Some(&SolutionNode::Recipe(f.recipe("ore")))
        );
    }

    #[test]
    fn cycle_heights_terminate() {
        let f = cycle_fixture();
        let totals = solve(&f.ctx(), &[(f.item("a"), q("10"))]).unwrap().totals;
        // make-a feeds the output; the edge back into it from make-b is dropped.
        assert_eq!(totals.height(SolutionNode::Recipe(f.recipe("make-a"))), Some(1));
        assert_eq!(totals.height(SolutionNode::Recipe(f.recipe("make-b"))), Some(0));
        assert_eq!(totals.height(SolutionNode::Output), Some(0));
    }

    #[test]
    fn surplus_node_only_when_needed() {
        let f = chain_fixture();
        let registry = &f.registry;
        let plate = f.item("plate");
        let no_surplus = Totals::new(registry, vec![], BTreeMap::new(), BTreeMap::new());
        assert!(no_surplus.rate(SolutionNode::Surplus).is_none());
        assert_eq!(no_surplus.rate(SolutionNode::Output), Some(&q("1")));

        let with_surplus = Totals::new(
            registry,
            vec![],
            BTreeMap::from([(f.recipe("plate"), q("1"))]),
            BTreeMap::from([(plate, q("1"))]),
        );
        assert_eq!(with_surplus.rate(SolutionNode::Surplus), Some(&q("1")));
        assert!(with_surplus.item_flow(registry, plate).is_balanced());
    }

    #[test]
    fn terminal_nodes_consume_targets_and_surplus() {
        let f = chain_fixture();
        let registry = &f.registry;
        let (plate, gear) = (f.item("plate"), f.item("gear"));
        let totals = Totals::new(
            registry,
            vec![Ingredient::new(gear, q("1"))],
            BTreeMap::from([
                (f.recipe("gear"), q("1")),
                (f.recipe("plate"), q("3")),
                (f.recipe("ore"), q("3")),
            ]),
            BTreeMap::from([(plate, q("1"))]),
        );
        assert_eq!(
            totals.consumed(registry, SolutionNode::Output),
            vec![Ingredient::new(gear, q("1"))]
        );
        assert_eq!(
            totals.consumed(registry, SolutionNode::Surplus),
            vec![Ingredient::new(plate, q("1"))]
        );
        assert!(totals.produced(registry, SolutionNode::Output).is_empty());
        assert!(totals.produced(registry, SolutionNode::Surplus).is_empty());
        // Terminals are not recipes: they never show up as recipe rates.
        assert_eq!(totals.recipe_rates().count(), 3);
        assert_eq!(totals.rates().count(), 5);
        assert_balanced(&f, &totals);
    }

    #[test]
    fn zero_rates_are_dropped() {
        let f = chain_fixture();
        let totals = Totals::new(
            &f.registry,
            vec![],
            BTreeMap::from([(f.recipe("plate"), Rational::zero())]),
            BTreeMap::new(),
        );
        assert!(totals.recipe_rate(f.recipe("plate")).is_none());
    }

    #[test]
    fn combine_adds_rates_and_keeps_max_height() {
        let f = chain_fixture();
        let ctx = f.ctx();
        let mut gear = solve(&ctx, &[(f.item("gear"), q("1"))]).unwrap().totals;
        let plate = solve(&ctx, &[(f.item("plate"), q("1"))]).unwrap().totals;
        let plate_node = SolutionNode::Recipe(f.recipe("plate"));
        let before = gear.height(plate_node).unwrap();
        gear.combine(&plate);
        assert_eq!(gear.recipe_rate(f.recipe("plate")), Some(&q("3")));
        assert_eq!(gear.rate(SolutionNode::Output), Some(&q("1")));
        assert_eq!(gear.outputs().len(), 2);
        assert!(gear.height(plate_node).unwrap() >= before);
        assert_balanced(&f, &gear);
    }

    #[test]
    fn combine_merges_duplicate_targets() {
        let f = chain_fixture();
        let ctx = f.ctx();
        let mut a = solve(&ctx, &[(f.item("gear"), q("1"))]).unwrap().totals;
        let b = solve(&ctx, &[(f.item("gear"), q("1/2"))]).unwrap().totals;
        a.combine(&b);
        assert_eq!(a.outputs(), &[Ingredient::new(f.item("gear"), q("3/2"))]);
        assert_balanced(&f, &a);
    }
}
