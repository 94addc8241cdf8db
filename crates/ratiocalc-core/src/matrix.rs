use crate::rational::{Rational, RationalError};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Dense row-major matrix of exact rationals.
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Rational>,
}

impl Matrix {
    /// A `rows x cols` matrix of zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![Rational::zero(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Rational> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn set(&mut self, row: usize, col: usize, value: Rational) {
        self[(row, col)] = value;
    }

    pub fn add_to(&mut self, row: usize, col: usize, value: &Rational) {
        self[(row, col)] += value;
    }

    pub fn row(&self, row: usize) -> &[Rational] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// All entries in row-major order.
    pub fn values(&self) -> impl Iterator<Item = &Rational> {
        self.data.iter()
    }

    /// Scale `row` so the pivot entry becomes one, then eliminate `col` from
    /// every other row.
    pub fn pivot(&mut self, row: usize, col: usize) -> Result<(), RationalError> {
        let inverse = self[(row, col)].reciprocal()?;
        let cols = self.cols;
        for value in &mut self.data[row * cols..(row + 1) * cols] {
            *value *= &inverse;
        }
        let pivot_row: Vec<Rational> = self.row(row).to_vec();
        for r in 0..self.rows {
            if r == row {
                continue;
            }
            let factor = self[(r, col)].clone();
            if factor.is_zero() {
                continue;
            }
            for (c, pivot_value) in pivot_row.iter().enumerate() {
                if pivot_value.is_zero() {
                    continue;
                }
                let delta = &factor * pivot_value;
                self.data[r * cols + c] -= &delta;
            }
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = Rational;

    fn index(&self, (row, col): (usize, usize)) -> &Rational {
        assert!(row < self.rows && col < self.cols, "matrix index out of bounds");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Rational {
        assert!(row < self.rows && col < self.cols, "matrix index out of bounds");
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix {}x{}", self.rows, self.cols)?;
        fmt::Display::fmt(self, f)
    }
}

/// Tab-separated rows.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let line: Vec<String> = self.row(r).iter().map(ToString::to_string).collect();
            writeln!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(p: i64, d: i64) -> Rational {
        Rational::ratio(p, d)
    }

    #[test]
    fn new_is_zeroed() {
        let m = Matrix::new(2, 3);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert!(m.values().all(Rational::is_zero));
    }

    #[test]
    fn set_and_add() {
        let mut m = Matrix::new(2, 2);
        m.set(0, 1, q(1, 2));
        m.add_to(0, 1, &q(1, 3));
        assert_eq!(m[(0, 1)], q(5, 6));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn pivot_eliminates_column() {
        // [2 4 | 6]
        // [1 3 | 5]
        let mut m = Matrix::new(2, 3);
        for (c, v) in [2, 4, 6].into_iter().enumerate() {
            m.set(0, c, Rational::from_integer(v));
        }
        for (c, v) in [1, 3, 5].into_iter().enumerate() {
            m.set(1, c, Rational::from_integer(v));
        }
        m.pivot(0, 0).unwrap();
        assert_eq!(m.row(0), &[q(1, 1), q(2, 1), q(3, 1)]);
        assert_eq!(m.row(1), &[q(0, 1), q(1, 1), q(2, 1)]);
    }

    #[test]
    fn pivot_on_zero_fails() {
        let mut m = Matrix::new(1, 1);
        assert_eq!(m.pivot(0, 0), Err(RationalError::DivisionByZero));
    }

    #[test]
    fn display_is_tab_separated() {
        let mut m = Matrix::new(1, 2);
        m.set(0, 0, q(-1, 2));
        assert_eq!(m.to_string(), "-1/2\t0\n");
    }
}
