//! Sliding-window unrolling (im2col)
//!
//! Rewrites every `k x k` window of a matrix, stepped by `s`, as one row of a
//! new matrix. Windows are enumerated top-left to bottom-right: the outer loop
//! walks window-rows, the inner loop window-columns, and window `(y, x)` has
//! its top-left corner at `(y * s, x * s)`. Each window is flattened
//! row-major.
//!
//! ```text
//! window_rows = floor((rows - k) / s) + 1
//! window_cols = floor((cols - k) / s) + 1
//! output      = (window_rows * window_cols) x (k * k)
//! ```
//!
//! With every window laid out as a row, a 2D correlation collapses into a
//! single matrix multiply (see [`crate::convolution`]).

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::matrix::Matrix;
use crate::view::{check_window, View};
use crate::Result;

/// Number of window positions along each axis (floor form, no partial windows)
///
/// # Errors
///
/// Returns `PreconditionViolation` if `kernel` or `stride` is zero, or the
/// kernel does not fit inside the matrix
///
/// # Example
///
/// ```
/// use ventana::im2col::window_grid;
///
/// assert_eq!(window_grid(7, 7, 3, 2).unwrap(), (3, 3));
/// assert_eq!(window_grid(6, 5, 2, 2).unwrap(), (3, 2));
/// ```
pub fn window_grid(rows: usize, cols: usize, kernel: usize, stride: usize) -> Result<(usize, usize)> {
    check_window(rows, cols, kernel, stride)?;
    Ok(((rows - kernel) / stride + 1, (cols - kernel) / stride + 1))
}

/// Unroll every `kernel x kernel` window of `source` into a row
///
/// Each worker handles one window-row, i.e. `window_cols` consecutive output
/// rows, so workers write disjoint ranges of the output.
///
/// # Errors
///
/// Returns `PreconditionViolation` if `kernel` or `stride` is zero, or the
/// kernel does not fit inside the matrix
#[cfg_attr(feature = "tracing", instrument(skip(executor, source), fields(dims = %format!("{}x{}", source.rows(), source.cols()))))]
pub fn im2col(
    executor: &Executor,
    source: &Matrix<f64>,
    kernel: usize,
    stride: usize,
) -> Result<Matrix<f64>> {
    let (window_rows, window_cols) = window_grid(source.rows(), source.cols(), kernel, stride)?;
    let area = kernel * kernel;

    let mut data = vec![0.0; window_rows * window_cols * area];
    executor.for_each_chunk(&mut data, window_cols * area, |y, out| {
        for (x, dst) in out.chunks_exact_mut(area).enumerate() {
            View::new(source, y * stride, x * stride, kernel, kernel)?.copy_to(dst)?;
        }
        Ok(())
    })?;

    Ok(Matrix::from_raw(window_rows * window_cols, area, data))
}

impl Matrix<f64> {
    /// Unroll sliding `kernel x kernel` windows into rows
    ///
    /// # Errors
    ///
    /// See [`im2col`]
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::Matrix;
    ///
    /// let m = Matrix::from_vec(3, 3, (1..=9).map(f64::from).collect()).unwrap();
    /// let cols = m.im2col(2, 1).unwrap();
    /// assert_eq!(cols.shape(), (4, 4));
    /// assert_eq!(cols.row(0), Some(&[1.0, 2.0, 4.0, 5.0][..]));
    /// assert_eq!(cols.row(3), Some(&[5.0, 6.0, 8.0, 9.0][..]));
    /// ```
    pub fn im2col(&self, kernel: usize, stride: usize) -> Result<Matrix<f64>> {
        im2col(&Executor::default(), self, kernel, stride)
    }
}
