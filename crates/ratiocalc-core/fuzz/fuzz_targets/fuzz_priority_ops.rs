#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ratiocalc_core::id::RecipeId;
use ratiocalc_core::rational::Rational;
use ratiocalc_core::solve::solve;
use ratiocalc_core::test_utils::*;

/// A structured priority-list edit for fuzzing.
#[derive(Arbitrary, Debug)]
enum FuzzOp {
    SetPriority { recipe: u8, level: u8, preserve_empty: bool },
    AddLevel { before: Option<u8> },
    Remove { recipe: u8 },
    SetWeight { recipe: u8, num: u8, den: u8 },
    RemoveEmpty,
    Solve { rate: u8 },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    let mut f = two_tier_fixture();
    let recipes: Vec<RecipeId> = f.registry.recipes().map(|(id, _)| id).collect();
    let pick = |i: u8| recipes[i as usize % recipes.len()];
    let plate = f.item("plate");

    let max_ops = input.ops.len().min(100);
    for op in &input.ops[..max_ops] {
        let priority = &mut f.config.priority;
        match op {
            FuzzOp::SetPriority {
                recipe,
                level,
                preserve_empty,
            } => {
                let _ = priority.set_priority(pick(*recipe), *level as usize, *preserve_empty);
            }
            FuzzOp::AddLevel { before } => {
                let _ = priority.add_level_before(before.map(usize::from));
            }
            FuzzOp::Remove { recipe } => {
                priority.remove(pick(*recipe));
            }
            FuzzOp::SetWeight { recipe, num, den } => {
                let weight = Rational::ratio(i64::from(*num), i64::from(*den).max(1));
                let _ = priority.set_weight(pick(*recipe), weight);
            }
            FuzzOp::RemoveEmpty => priority.remove_empty(),
            FuzzOp::Solve { rate } => {
                // Errors are fine; panics are not.
                let _ = solve(&f.ctx(), &[(plate, Rational::from_integer(i64::from(*rate)))]);
            }
        }

        // No recipe may sit in two levels at once.
        for &recipe in &recipes {
            let count = f
                .config
                .priority
                .iter()
                .filter(|level| level.contains(recipe))
                .count();
            assert!(count <= 1);
        }
    }
});
