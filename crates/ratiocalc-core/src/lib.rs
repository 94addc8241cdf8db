//! Ratiocalc Core -- the exact-rational production planner.
//!
//! Given target output rates for some items, this crate computes how fast
//! every upstream recipe must run, with exact fractions throughout so long
//! chains never accumulate rounding error.
//!
//! # Solve Pipeline
//!
//! Each call to [`solve::solve`] runs these stages:
//!
//! 1. **Graph** -- Collect every recipe reachable from the targets through
//!    eligible producers ([`context::SolverContext::recipe_graph`]).
//! 2. **Cycles** -- Flag recipes on dependency cycles ([`cycle`]).
//! 3. **Fast path** -- Resolve single-choice, acyclic chains top-down
//!    ([`fast_path`]), leaving ambiguous demand behind.
//! 4. **Tableau** -- Encode the leftover demand as a linear program with
//!    tiered resource costs ([`tableau`]).
//! 5. **Simplex** -- Pivot to the cheapest feasible production ([`simplex`]).
//! 6. **Totals** -- Merge both stages into recipe rates, surplus and display
//!    heights ([`totals`]).
//!
//! ```rust,ignore
//! let registry = builder.build()?;
//! let config = Configuration::new(&registry);
//! let ctx = SolverContext::new(&registry, &config);
//! let solution = solve(&ctx, &[(gear, Rational::from_integer(10))])?;
//! ```
//!
//! # Key Types
//!
//! - [`rational::Rational`] -- Arbitrary-precision exact fraction.
//! - [`registry::Registry`] -- Immutable catalog of items, recipes,
//!   buildings and belts (frozen after build).
//! - [`config::Configuration`] -- Disabled recipes, ignored items, priority
//!   tiers, overclocks, miners, targets and belt.
//! - [`priority::PriorityList`] -- Ordered resource tiers with weights.
//! - [`totals::Totals`] -- Per-recipe rates, surplus and heights.
//! - [`factory::Factory`] -- Building counts, power and belts.

pub mod config;
pub mod context;
pub mod cycle;
pub mod factory;
pub mod fast_path;
pub mod id;
pub mod matrix;
pub mod priority;
pub mod rational;
pub mod registry;
pub mod simplex;
pub mod solve;
pub mod tableau;
pub mod totals;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
