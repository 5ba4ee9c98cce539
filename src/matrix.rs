//! Matrix storage for Ventana
//!
//! Provides the dense row-major matrix every transform reads from and writes
//! into, together with the linear-algebra collaborators the transforms lean on
//! (reshape, flatten, multiply, transpose).
//!
//! # Example
//!
//! ```
//! use ventana::Matrix;
//!
//! // Create a 2x3 matrix
//! let m = Matrix::zeros(2, 3);
//! assert_eq!(m.rows(), 2);
//! assert_eq!(m.cols(), 3);
//! ```

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::view::View;
use crate::{Result, VentanaError};

/// A 2D matrix with row-major storage
///
/// Data is stored in row-major format (C-style), where consecutive elements
/// in memory belong to the same row. Rows are therefore contiguous slices,
/// which is what lets a [`View`] hand out borrowed rows without copying.
///
/// # Storage Layout
///
/// For a 2x3 matrix:
/// ```text
/// [[a, b, c],
///  [d, e, f]]
/// ```
/// Data is stored as: [a, b, c, d, e, f]
///
/// # Example
///
/// ```
/// use ventana::Matrix;
///
/// let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(m.get(0, 0), Some(&1.0));
/// assert_eq!(m.get(0, 1), Some(&2.0));
/// assert_eq!(m.get(1, 0), Some(&3.0));
/// assert_eq!(m.get(1, 1), Some(&4.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl Matrix<f64> {
    /// Creates a new zero-filled matrix
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`; use [`Matrix::from_vec`]
    /// to get an error instead
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::new(3, 4);
    /// assert_eq!(m.rows(), 3);
    /// assert_eq!(m.cols(), 4);
    /// ```
    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; element_count(rows, cols)],
        }
    }

    /// Creates a matrix from a vector of data
    ///
    /// # Arguments
    ///
    /// * `rows` - Number of rows
    /// * `cols` - Number of columns
    /// * `data` - Vector containing matrix elements in row-major order
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `data.len() != rows * cols`
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.rows(), 2);
    /// assert!(Matrix::from_vec(2, 2, vec![1.0]).is_err());
    /// ```
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or_else(|| VentanaError::PreconditionViolation(format!(
                "Matrix dimensions {rows}x{cols} overflow"
            )))?;
        if data.len() != expected {
            return Err(VentanaError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Matrix { rows, cols, data })
    }

    /// Creates a matrix from a slice by copying the data
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `data.len() != rows * cols`
    pub fn from_slice(rows: usize, cols: usize, data: &[f64]) -> Result<Self> {
        Self::from_vec(rows, cols, data.to_vec())
    }

    /// Creates a matrix filled with zeros
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::zeros(3, 3);
    /// assert_eq!(m.get(1, 1), Some(&0.0));
    /// ```
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix::new(rows, cols)
    }

    /// Creates a matrix of uniform samples in `[0, 1)` drawn from `rng`
    ///
    /// The generator is owned by the caller, so reproducible runs only need a
    /// seeded generator and no process-wide state is touched.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`
    ///
    /// # Example
    ///
    /// ```
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    /// use ventana::Matrix;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let m = Matrix::random(2, 3, &mut rng);
    /// assert!(m.as_slice().iter().all(|v| (0.0..1.0).contains(v)));
    /// ```
    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..element_count(rows, cols))
            .map(|_| rng.gen::<f64>())
            .collect();
        Matrix { rows, cols, data }
    }

    /// Creates a random matrix from a fresh generator seeded with `seed`
    pub fn random_seeded(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random(rows, cols, &mut rng)
    }

    /// Returns the number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the matrix holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets a reference to an element at (row, col)
    ///
    /// Returns `None` if indices are out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<&f64> {
        if row >= self.rows || col >= self.cols {
            None
        } else {
            self.data.get(row * self.cols + col)
        }
    }

    /// Gets a mutable reference to an element at (row, col)
    ///
    /// Returns `None` if indices are out of bounds
    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut f64> {
        if row >= self.rows || col >= self.cols {
            None
        } else {
            let idx = row * self.cols + col;
            self.data.get_mut(idx)
        }
    }

    /// Returns row `row` as a contiguous slice
    ///
    /// Returns `None` if `row` is out of bounds
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            None
        } else {
            Some(self.row_slice(row))
        }
    }

    /// Assemble a matrix from storage already sized `rows * cols`
    pub(crate) fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Matrix { rows, cols, data }
    }

    /// Row slice for an index already known to be in range
    pub(crate) fn row_slice(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns a reference to the underlying data
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consumes the matrix and returns its row-major storage
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Borrow a `height x width` window whose top-left corner is `(row0, col0)`
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if the window does not fit inside the matrix
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(3, 3, (1..=9).map(f64::from).collect()).unwrap();
    /// let v = m.view(1, 1, 2, 2).unwrap();
    /// assert_eq!(v.get(0, 0), Some(&5.0));
    /// assert!(m.view(2, 2, 2, 2).is_err());
    /// ```
    pub fn view(&self, row0: usize, col0: usize, height: usize, width: usize) -> Result<View<'_>> {
        View::new(self, row0, col0, height, width)
    }

    /// Reinterpret the elements as a `rows x cols` matrix
    ///
    /// Row-major element order is preserved: flattening the source and the
    /// result yields the same sequence.
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `rows * cols` differs from the element count
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let r = m.reshape(3, 2).unwrap();
    /// assert_eq!(r.get(1, 0), Some(&3.0));
    /// assert!(m.reshape(4, 2).is_err());
    /// ```
    pub fn reshape(&self, rows: usize, cols: usize) -> Result<Matrix<f64>> {
        self.clone().into_shape(rows, cols)
    }

    /// Consuming variant of [`Matrix::reshape`] that reuses the storage
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `rows * cols` differs from the element count
    pub fn into_shape(self, rows: usize, cols: usize) -> Result<Matrix<f64>> {
        let expected = rows.checked_mul(cols).unwrap_or(usize::MAX);
        if expected != self.data.len() {
            return Err(VentanaError::SizeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(Matrix {
            rows,
            cols,
            data: self.data,
        })
    }

    /// Flatten into a `1 x (rows * cols)` row vector in row-major order
    ///
    /// Each source row is copied by its own worker.
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// let flat = m.flatten();
    /// assert_eq!(flat.shape(), (1, 4));
    /// assert_eq!(flat.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    /// ```
    pub fn flatten(&self) -> Matrix<f64> {
        self.flatten_with(&Executor::default())
    }

    /// [`Matrix::flatten`] on an explicit executor
    #[cfg_attr(feature = "tracing", instrument(skip(self, executor), fields(dims = %format!("{}x{}", self.rows, self.cols))))]
    pub fn flatten_with(&self, executor: &Executor) -> Matrix<f64> {
        let mut data = vec![0.0; self.data.len()];
        executor.fill_chunks(&mut data, self.cols, |y, out| {
            out.copy_from_slice(self.row_slice(y));
        });
        Matrix {
            rows: 1,
            cols: self.data.len(),
            data,
        }
    }

    /// Matrix multiplication (matmul)
    ///
    /// Computes `C = A × B` where A is `m×n`, B is `n×p`, and C is `m×p`.
    /// Output rows are computed independently and fanned out across workers.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `self.cols != other.rows`
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    /// let c = a.matmul(&b).unwrap();
    ///
    /// // [[1, 2],   [[5, 6],   [[19, 22],
    /// //  [3, 4]] ×  [7, 8]] =  [43, 50]]
    /// assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    /// ```
    pub fn matmul(&self, other: &Matrix<f64>) -> Result<Matrix<f64>> {
        self.matmul_with(&Executor::default(), other)
    }

    /// [`Matrix::matmul`] on an explicit executor
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `self.cols != other.rows`
    #[cfg_attr(feature = "tracing", instrument(skip(self, executor, other), fields(dims = %format!("{}x{} @ {}x{}", self.rows, self.cols, other.rows, other.cols))))]
    pub fn matmul_with(&self, executor: &Executor, other: &Matrix<f64>) -> Result<Matrix<f64>> {
        if self.cols != other.rows {
            return Err(VentanaError::DimensionMismatch {
                left: self.cols,
                right: other.rows,
            });
        }

        let mut result = Matrix::zeros(self.rows, other.cols);

        // i-k-j order: the inner loop streams a row of `other` into a row of
        // the result, both contiguous.
        executor.for_each_chunk(&mut result.data, other.cols, |i, out| {
            for (k, &a) in self.row_slice(i).iter().enumerate() {
                for (c, &b) in out.iter_mut().zip(other.row_slice(k)) {
                    *c += a * b;
                }
            }
            Ok(())
        })?;

        Ok(result)
    }

    /// Transpose the matrix (swap rows and columns)
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let t = m.transpose();
    ///
    /// // [[1, 2, 3],     [[1, 4],
    /// //  [4, 5, 6]]  →   [2, 5],
    /// //                  [3, 6]]
    /// assert_eq!(t.shape(), (3, 2));
    /// assert_eq!(t.get(0, 1), Some(&4.0));
    /// assert_eq!(t.get(1, 0), Some(&2.0));
    /// ```
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(dims = %format!("{}x{}", self.rows, self.cols))))]
    pub fn transpose(&self) -> Matrix<f64> {
        let mut result = Matrix::zeros(self.cols, self.rows);

        // Block size of 32 keeps a source and destination tile in L1 for f64
        const BLOCK_SIZE: usize = 32;

        for i_block in (0..self.rows).step_by(BLOCK_SIZE) {
            for j_block in (0..self.cols).step_by(BLOCK_SIZE) {
                let i_end = (i_block + BLOCK_SIZE).min(self.rows);
                let j_end = (j_block + BLOCK_SIZE).min(self.cols);

                for i in i_block..i_end {
                    let src_row_start = i * self.cols;
                    for j in j_block..j_end {
                        // result[j, i] = self[i, j]
                        result.data[j * result.cols + i] = self.data[src_row_start + j];
                    }
                }
            }
        }

        result
    }
}

impl fmt::Display for Matrix<f64> {
    /// One line per row, elements with four decimals separated by spaces
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            for (x, v) in self.row_slice(y).iter().enumerate() {
                if x > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{v:.4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Element count of a `rows x cols` matrix, panicking on overflow in every build profile
fn element_count(rows: usize, cols: usize) -> usize {
    match rows.checked_mul(cols) {
        Some(n) => n,
        None => panic!("Matrix dimensions {rows}x{cols} overflow"),
    }
}
