use crate::matrix::Matrix;
use crate::rational::Rational;
use crate::solve::SolveError;
use std::cmp::Ordering;

/// Run simplex pivoting on `tableau` in place until the objective row has no
/// negative entry. Returns the number of pivots taken.
///
/// The last row is the objective. Columns from `rhs` onwards form the
/// right-hand side, most significant first; the minimum-ratio test compares
/// those ratios lexicographically, so a single column is the classic
/// method. Comparisons are exact. The entering column is the most negative
/// objective entry (lowest index on ties); the leaving row wins the
/// minimum-ratio test (lowest index on ties).
pub fn simplex(tableau: &mut Matrix, rhs: usize) -> Result<usize, SolveError> {
    let rows = tableau.rows();
    let cols = tableau.cols();
    if rows < 2 || rhs == 0 || rhs >= cols {
        return Ok(0);
    }
    let objective = rows - 1;
    let mut pivots = 0usize;

    loop {
        let Some(column) = entering_column(tableau, objective, rhs) else {
            break;
        };
        let row = leaving_row(tableau, column, objective, rhs)?
            .ok_or(SolveError::Unbounded { column })?;
        tracing::trace!(row, column, "pivot");
        tableau.pivot(row, column)?;
        pivots += 1;
    }
    tracing::debug!(rows, cols, pivots, "simplex converged");
    Ok(pivots)
}

fn entering_column(tableau: &Matrix, objective: usize, rhs: usize) -> Option<usize> {
    let mut best: Option<usize> = None;
    for col in 0..rhs {
        let value = &tableau[(objective, col)];
        if !value.is_negative() {
            continue;
        }
        match best {
            Some(b) if tableau[(objective, b)] <= *value => {}
            _ => best = Some(col),
        }
    }
    best
}

fn leaving_row(
    tableau: &Matrix,
    column: usize,
    objective: usize,
    rhs: usize,
) -> Result<Option<usize>, SolveError> {
    let mut best: Option<(usize, Vec<Rational>)> = None;
    for row in 0..objective {
        let entry = &tableau[(row, column)];
        if !entry.is_positive() {
            continue;
        }
        let ratios = tableau.row(row)[rhs..]
            .iter()
            .map(|value| value.checked_div(entry))
            .collect::<Result<Vec<_>, _>>()?;
        let better = best
            .as_ref()
            .is_none_or(|(_, min)| ratios.cmp(min) == Ordering::Less);
        if better {
            best = Some((row, ratios));
        }
    }
    Ok(best.map(|(row, _)| row))
}
