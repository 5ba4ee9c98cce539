//! Read-only rectangular windows into a [`Matrix`]
//!
//! A `View` is an offset plus an extent over borrowed storage. Nothing is
//! copied when it is created; every element access is translated through the
//! offset. Bounds are validated once, at construction.

use crate::matrix::Matrix;
use crate::{Result, VentanaError};

/// A borrowed `height x width` window of a matrix starting at `(row0, col0)`
///
/// # Example
///
/// ```
/// use ventana::{Matrix, View};
///
/// let m = Matrix::from_vec(3, 4, (0..12).map(f64::from).collect()).unwrap();
/// let v = View::new(&m, 1, 1, 2, 2).unwrap();
///
/// // [[5, 6],
/// //  [9, 10]]
/// assert_eq!(v.row(1), Some(&[9.0, 10.0][..]));
/// assert_eq!(v.max(), Some(10.0));
/// assert_eq!(v.sum(), 30.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    base: &'a Matrix<f64>,
    row0: usize,
    col0: usize,
    height: usize,
    width: usize,
}

impl<'a> View<'a> {
    /// Create a window over `base`
    ///
    /// # Errors
    ///
    /// Returns `PreconditionViolation` if `row0 + height > base.rows()` or
    /// `col0 + width > base.cols()`
    pub fn new(
        base: &'a Matrix<f64>,
        row0: usize,
        col0: usize,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        let fits = |start: usize, extent: usize, limit: usize| {
            start.checked_add(extent).is_some_and(|end| end <= limit)
        };
        if !fits(row0, height, base.rows()) || !fits(col0, width, base.cols()) {
            return Err(VentanaError::PreconditionViolation(format!(
                "View {height}x{width} at ({row0}, {col0}) exceeds {}x{} matrix",
                base.rows(),
                base.cols()
            )));
        }

        Ok(Self {
            base,
            row0,
            col0,
            height,
            width,
        })
    }

    /// Number of rows in the window
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns in the window
    pub fn width(&self) -> usize {
        self.width
    }

    /// Top-left corner of the window in base coordinates
    pub fn offset(&self) -> (usize, usize) {
        (self.row0, self.col0)
    }

    /// Total number of elements in the window
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// Returns true if the window covers no elements
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Element at window coordinates `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> Option<&'a f64> {
        if i >= self.height || j >= self.width {
            None
        } else {
            self.base.get(self.row0 + i, self.col0 + j)
        }
    }

    /// Row `i` of the window, borrowed straight from the base storage
    pub fn row(&self, i: usize) -> Option<&'a [f64]> {
        if i >= self.height {
            None
        } else {
            Some(self.row_unchecked(i))
        }
    }

    fn row_unchecked(&self, i: usize) -> &'a [f64] {
        let row = self.base.row_slice(self.row0 + i);
        &row[self.col0..self.col0 + self.width]
    }

    /// Iterate over the rows of the window
    pub fn rows(&self) -> impl Iterator<Item = &'a [f64]> + 'a {
        let view = *self;
        (0..view.height).map(move |i| view.row_unchecked(i))
    }

    /// Iterate over the elements in row-major order
    pub fn iter(&self) -> impl Iterator<Item = &'a f64> + 'a {
        self.rows().flatten()
    }

    /// Largest element, or `None` for an empty window
    ///
    /// Any NaN element makes the result NaN.
    pub fn max(&self) -> Option<f64> {
        self.iter().copied().reduce(|acc, v| {
            if acc.is_nan() || v.is_nan() {
                f64::NAN
            } else {
                acc.max(v)
            }
        })
    }

    /// Sum of all elements
    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Arithmetic mean of all elements, or `None` for an empty window
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    /// Copy the window into `out` in row-major order
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `out.len() != self.len()`
    pub fn copy_to(&self, out: &mut [f64]) -> Result<()> {
        if out.len() != self.len() {
            return Err(VentanaError::SizeMismatch {
                expected: self.len(),
                actual: out.len(),
            });
        }
        if self.width == 0 {
            return Ok(());
        }
        for (dst, src) in out.chunks_exact_mut(self.width).zip(self.rows()) {
            dst.copy_from_slice(src);
        }
        Ok(())
    }

    /// Copy the window into a freshly owned matrix
    pub fn to_matrix(&self) -> Matrix<f64> {
        Matrix::from_raw(self.height, self.width, self.iter().copied().collect())
    }
}

/// Validate a square `kernel x kernel` window sliding with `stride` over a
/// `rows x cols` matrix
pub(crate) fn check_window(rows: usize, cols: usize, kernel: usize, stride: usize) -> Result<()> {
    if kernel == 0 {
        return Err(VentanaError::PreconditionViolation(
            "kernel size must be non-zero".to_string(),
        ));
    }
    if stride == 0 {
        return Err(VentanaError::PreconditionViolation(
            "stride must be non-zero".to_string(),
        ));
    }
    if kernel > rows || kernel > cols {
        return Err(VentanaError::PreconditionViolation(format!(
            "kernel size {kernel} larger than {rows}x{cols} matrix"
        )));
    }
    Ok(())
}
