//! Cycle membership for the recipe graph.
//!
//! Items and recipes form a bipartite dependency graph: an item points at
//! each of its eligible recipes, a recipe points at each item it ingests.
//! A recipe is cyclic when its strongly connected component holds more than
//! one node, or a single node with a self-loop. Components are found with an
//! iterative Tarjan so deep chains cannot overflow the stack.

use crate::context::SolverContext;
use crate::id::*;
use std::collections::{BTreeSet, HashMap};

/// Recipes among `recipes` that lie on a dependency cycle.
pub fn cyclic_recipes(ctx: &SolverContext<'_>, recipes: &[RecipeId]) -> BTreeSet<RecipeId> {
    // Node layout: recipes first, then items in discovery order.
    let mut node_of_recipe: HashMap<RecipeId, usize> = HashMap::with_capacity(recipes.len());
    for (idx, &recipe) in recipes.iter().enumerate() {
        node_of_recipe.entry(recipe).or_insert(idx);
    }
    let mut node_of_item: HashMap<ItemId, usize> = HashMap::new();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); recipes.len()];
    let mut items: Vec<ItemId> = Vec::new();

    for (idx, &recipe) in recipes.iter().enumerate() {
        for ingredient in &ctx.registry[recipe].ingredients {
            let node = *node_of_item.entry(ingredient.item).or_insert_with(|| {
                items.push(ingredient.item);
                adj.push(Vec::new());
                adj.len() - 1
            });
            adj[idx].push(node);
        }
    }
    for (i, &item) in items.iter().enumerate() {
        let node = recipes.len() + i;
        for recipe in ctx.recipes_for(item) {
            if let Some(&target) = node_of_recipe.get(&recipe) {
                adj[node].push(target);
            }
        }
    }

    let mut cyclic = BTreeSet::new();
    for component in strongly_connected(&adj) {
        let on_cycle = component.len() > 1
            || component
                .first()
                .is_some_and(|&v| adj[v].contains(&v));
        if !on_cycle {
            continue;
        }
        cyclic.extend(
            component
                .into_iter()
                .filter(|&v| v < recipes.len())
                .map(|v| recipes[v]),
        );
    }
    tracing::debug!(
        recipes = recipes.len(),
        cyclic = cyclic.len(),
        "cycle detection complete"
    );
    cyclic
}

const UNVISITED: usize = usize::MAX;

/// Tarjan's algorithm with an explicit call stack.
fn strongly_connected(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut index = vec![UNVISITED; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut frames: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0usize;
    let mut components = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        index[root] = next_index;
        low[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let v = frame.0;
            if frame.1 < adj[v].len() {
                let w = adj[v][frame.1];
                frame.1 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    low[w] = next_index;
                    next_index += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    frames.push((w, 0));
                } else if on_stack[w] {
                    low[v] = low[v].min(index[w]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                low[parent] = low[parent].min(low[v]);
            }
            if low[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }
    components
}
