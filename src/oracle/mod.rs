//! Reference arithmetic for matrix circuits
//!
//! Plain integer reimplementations of each matrix operation that a circuit may compute. Every
//! function is pure and allocates a fresh result. Arithmetic is native `i64` and wraps on
//! overflow, in debug and release builds alike.

use rug::Integer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt::{self, Display, Formatter};

#[cfg(test)]
mod test;

/// A matrix entry. Sums and products wrap around `i64`.
pub type Entry = i64;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
/// An error from the oracle
pub enum OracleError {
    #[error("{op}: incompatible shapes {left:?} and {right:?}")]
    /// Operand shapes do not fit the operation
    DimensionMismatch {
        /// operation
        op: &'static str,
        /// (rows, cols) of the left operand
        left: (usize, usize),
        /// (rows, cols) of the right operand
        right: (usize, usize),
    },
    #[error("{op}: expected a square matrix, got {rows}x{cols}")]
    /// A square-only operation got a non-square matrix
    NotSquare {
        /// operation
        op: &'static str,
        /// rows
        rows: usize,
        /// columns
        cols: usize,
    },
    #[error("row {row} has length {len}, expected {expected}")]
    /// Rows of different lengths
    Ragged {
        /// offending row
        row: usize,
        /// its length
        len: usize,
        /// the first row's length
        expected: usize,
    },
    #[error("determinant of an empty matrix")]
    /// Determinant of a 0x0 matrix
    Empty,
    #[error("convolution stride must be positive")]
    /// Zero stride
    ZeroStride,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Entry>>", into = "Vec<Vec<Entry>>")]
/// A rectangular integer matrix, stored row-major
pub struct Matrix {
    rows: usize,
    cols: usize,
    entries: Vec<Entry>,
}

impl Matrix {
    /// Build from rows; every row must have the same length.
    pub fn new(rows: Vec<Vec<Entry>>) -> Result<Self, OracleError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(n_rows * n_cols);
        for (row, r) in rows.into_iter().enumerate() {
            if r.len() != n_cols {
                return Err(OracleError::Ragged {
                    row,
                    len: r.len(),
                    expected: n_cols,
                });
            }
            entries.extend(r);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            entries,
        })
    }

    /// Build from a row-major vector.
    ///
    /// Panics if `entries.len() != rows * cols`.
    #[track_caller]
    pub fn from_flat(rows: usize, cols: usize, entries: Vec<Entry>) -> Self {
        assert_eq!(rows * cols, entries.len(), "bad flat matrix length");
        Self {
            rows,
            cols,
            entries,
        }
    }

    /// An all-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_flat(rows, cols, vec![0; rows * cols])
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Is this square?
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Entry `(i, j)`
    #[track_caller]
    pub fn get(&self, i: usize, j: usize) -> Entry {
        self.entries[i * self.cols + j]
    }

    fn get_mut(&mut self, i: usize, j: usize) -> &mut Entry {
        &mut self.entries[i * self.cols + j]
    }

    /// Row `i`
    pub fn row(&self, i: usize) -> &[Entry] {
        &self.entries[i * self.cols..(i + 1) * self.cols]
    }

    /// Row-major entries; how circuits expose a flat output vector.
    pub fn flat(&self) -> &[Entry] {
        &self.entries
    }

    /// Nested rows
    pub fn to_rows(&self) -> Vec<Vec<Entry>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<Entry>>> for Matrix {
    type Error = OracleError;
    fn try_from(rows: Vec<Vec<Entry>>) -> Result<Self, Self::Error> {
        Matrix::new(rows)
    }
}

impl From<Matrix> for Vec<Vec<Entry>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "[")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", self.row(i))?;
        }
        write!(f, "]")
    }
}

fn same_shape(op: &'static str, a: &Matrix, b: &Matrix) -> Result<(), OracleError> {
    if a.shape() != b.shape() {
        return Err(OracleError::DimensionMismatch {
            op,
            left: a.shape(),
            right: b.shape(),
        });
    }
    Ok(())
}

fn zip_with(a: &Matrix, b: &Matrix, f: impl Fn(Entry, Entry) -> Entry) -> Matrix {
    let entries = a
        .entries
        .iter()
        .zip(&b.entries)
        .map(|(x, y)| f(*x, *y))
        .collect();
    Matrix::from_flat(a.rows, a.cols, entries)
}

/// Element-wise sum
pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix, OracleError> {
    same_shape("add", a, b)?;
    Ok(zip_with(a, b, Entry::wrapping_add))
}

/// Element-wise product
pub fn hadamard(a: &Matrix, b: &Matrix) -> Result<Matrix, OracleError> {
    same_shape("hadamard", a, b)?;
    Ok(zip_with(a, b, Entry::wrapping_mul))
}

/// Multiply every entry by `s`
pub fn scalar_mult(a: &Matrix, s: Entry) -> Matrix {
    Matrix::from_flat(a.rows, a.cols, a.entries.iter().map(|x| x.wrapping_mul(s)).collect())
}

/// Swap rows and columns
pub fn transpose(a: &Matrix) -> Matrix {
    let mut t = Matrix::zeros(a.cols, a.rows);
    for i in 0..a.rows {
        for j in 0..a.cols {
            *t.get_mut(j, i) = a.get(i, j);
        }
    }
    t
}

/// The standard product, accumulated entry by entry.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, OracleError> {
    if a.cols != b.rows {
        return Err(OracleError::DimensionMismatch {
            op: "multiply",
            left: a.shape(),
            right: b.shape(),
        });
    }
    let mut c = Matrix::zeros(a.rows, b.cols);
    for i in 0..a.rows {
        for j in 0..b.cols {
            for k in 0..a.cols {
                let e = c.get_mut(i, j);
                *e = e.wrapping_add(a.get(i, k).wrapping_mul(b.get(k, j)));
            }
        }
    }
    Ok(c)
}

/// [multiply], flattened row-major
pub fn multiply_flat(a: &Matrix, b: &Matrix) -> Result<Vec<Entry>, OracleError> {
    Ok(multiply(a, b)?.entries)
}

/// `a * a * a`
pub fn power3(a: &Matrix) -> Result<Matrix, OracleError> {
    if !a.is_square() {
        return Err(OracleError::NotSquare {
            op: "power",
            rows: a.rows,
            cols: a.cols,
        });
    }
    multiply(&multiply(a, a)?, a)
}

/// `a` without row `row` and column `col`
///
/// Panics if `row` or `col` is out of range.
#[track_caller]
pub fn minor(a: &Matrix, row: usize, col: usize) -> Matrix {
    let rows = a.rows.saturating_sub(1);
    let cols = a.cols.saturating_sub(1);
    let mut entries = Vec::with_capacity(rows * cols);
    for i in (0..a.rows).filter(|i| *i != row) {
        entries.extend(
            a.row(i)
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != col)
                .map(|(_, x)| *x),
        );
    }
    Matrix::from_flat(rows, cols, entries)
}

/// Determinant by cofactor expansion along row 0.
///
/// Exponential in the size of `a`. Circuits expand in the same order with the same signs, so
/// results agree with the field computation whenever they fit in the field.
pub fn determinant(a: &Matrix) -> Result<Entry, OracleError> {
    if !a.is_square() {
        return Err(OracleError::NotSquare {
            op: "determinant",
            rows: a.rows,
            cols: a.cols,
        });
    }
    if a.rows == 0 {
        return Err(OracleError::Empty);
    }
    Ok(cofactor_det(a))
}

fn cofactor_det(a: &Matrix) -> Entry {
    match a.rows {
        1 => a.get(0, 0),
        2 => a
            .get(0, 0)
            .wrapping_mul(a.get(1, 1))
            .wrapping_sub(a.get(0, 1).wrapping_mul(a.get(1, 0))),
        n => (0..n).fold(0, |det: Entry, col| {
            let term = a.get(0, col).wrapping_mul(cofactor_det(&minor(a, 0, col)));
            if col % 2 == 0 {
                det.wrapping_add(term)
            } else {
                det.wrapping_sub(term)
            }
        }),
    }
}

/// Determinant by fraction-free (Bareiss) elimination over arbitrary-precision integers.
///
/// Polynomial time and exact; every division is exact so no rationals appear.
pub fn determinant_elim(a: &Matrix) -> Result<Integer, OracleError> {
    if !a.is_square() {
        return Err(OracleError::NotSquare {
            op: "determinant",
            rows: a.rows,
            cols: a.cols,
        });
    }
    let n = a.rows;
    if n == 0 {
        return Err(OracleError::Empty);
    }
    let mut m: Vec<Vec<Integer>> = (0..n)
        .map(|i| a.row(i).iter().map(|x| Integer::from(*x)).collect())
        .collect();
    let mut sign = 1;
    let mut prev = Integer::from(1);
    for k in 0..n - 1 {
        if m[k][k] == 0 {
            match (k + 1..n).find(|i| m[*i][k] != 0) {
                Some(p) => {
                    m.swap(k, p);
                    sign = -sign;
                }
                None => return Ok(Integer::new()),
            }
        }
        for i in k + 1..n {
            for j in k + 1..n {
                let v = Integer::from(&m[i][j] * &m[k][k]) - Integer::from(&m[i][k] * &m[k][j]);
                m[i][j] = v / &prev;
            }
        }
        prev = m[k][k].clone();
    }
    Ok(Integer::from(&m[n - 1][n - 1] * sign))
}

/// Valid (unpadded) sliding-window convolution.
///
/// Window origins are `0, stride, 2*stride, ..` while the window fits, independently on each
/// axis, so the output is `(n - f) / stride + 1` along an axis. A filter larger than the matrix
/// on either axis yields the empty matrix.
pub fn convolve(matrix: &Matrix, filter: &Matrix, stride: usize) -> Result<Matrix, OracleError> {
    if stride == 0 {
        return Err(OracleError::ZeroStride);
    }
    if filter.rows == 0 || filter.cols == 0 {
        return Err(OracleError::DimensionMismatch {
            op: "convolve",
            left: matrix.shape(),
            right: filter.shape(),
        });
    }
    if filter.rows > matrix.rows || filter.cols > matrix.cols {
        return Ok(Matrix::zeros(0, 0));
    }
    let out_rows = (matrix.rows - filter.rows) / stride + 1;
    let out_cols = (matrix.cols - filter.cols) / stride + 1;
    let mut out = Matrix::zeros(out_rows, out_cols);
    for oi in 0..out_rows {
        for oj in 0..out_cols {
            let (i, j) = (oi * stride, oj * stride);
            let mut sum: Entry = 0;
            for fi in 0..filter.rows {
                for fj in 0..filter.cols {
                    sum = matrix
                        .get(i + fi, j + fj)
                        .wrapping_mul(filter.get(fi, fj))
                        .wrapping_add(sum);
                }
            }
            *out.get_mut(oi, oj) = sum;
        }
    }
    Ok(out)
}
