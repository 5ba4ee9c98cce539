//! Window pooling
//!
//! Reduces every `k x k` window, stepped by `s` along both axes, to one scalar.
//! The output shape uses the ceiling form
//!
//! ```text
//! rows_out = ceil((rows - k) / s) + 1
//! cols_out = ceil((cols - k) / s) + 1
//! ```
//!
//! so a stride that does not divide `rows - k` still produces a last, partial
//! window. That window would run past the source, so the source is first
//! extended at the bottom and right with zeros by exactly the amount the last
//! window needs (see [`remainder_extension`]). The extension is applied to a
//! copy; the caller's matrix is never modified.
//!
//! # Example
//!
//! ```
//! use ventana::{Matrix, PoolingMode};
//!
//! let m = Matrix::from_vec(4, 4, vec![
//!     12.0, 20.0, 30.0, 0.0,
//!     8.0, 12.0, 2.0, 0.0,
//!     34.0, 70.0, 37.0, 4.0,
//!     112.0, 100.0, 25.0, 12.0,
//! ]).unwrap();
//!
//! let max = m.pooling(2, 2, PoolingMode::Max).unwrap();
//! assert_eq!(max.as_slice(), &[20.0, 30.0, 112.0, 37.0]);
//!
//! let avg = m.pooling(2, 2, PoolingMode::Avg).unwrap();
//! assert_eq!(avg.as_slice(), &[13.0, 8.0, 79.0, 19.5]);
//! ```

use std::borrow::Cow;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::matrix::Matrix;
use crate::view::{check_window, View};
use crate::{Result, VentanaError};

/// Window reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolingMode {
    /// Largest element of the window, NaN if the window holds a NaN
    Max,
    /// Arithmetic mean of the `k * k` window elements
    Avg,
}

/// Output shape of pooling a `rows x cols` matrix with a `kernel` window and `stride`
///
/// # Errors
///
/// Returns `PreconditionViolation` if `kernel` or `stride` is zero, or the
/// kernel does not fit inside the matrix
///
/// # Example
///
/// ```
/// use ventana::pooling::output_dims;
///
/// assert_eq!(output_dims(4, 4, 2, 2).unwrap(), (2, 2));
/// assert_eq!(output_dims(5, 7, 2, 2).unwrap(), (3, 4));
/// ```
pub fn output_dims(rows: usize, cols: usize, kernel: usize, stride: usize) -> Result<(usize, usize)> {
    check_window(rows, cols, kernel, stride)?;
    Ok((
        (rows - kernel).div_ceil(stride) + 1,
        (cols - kernel).div_ceil(stride) + 1,
    ))
}

/// Rows and columns of zero fill the last pooling window needs beyond the source
///
/// Zero when the stride divides `rows - kernel` (resp. `cols - kernel`)
/// exactly, otherwise the distance from the source edge to the far edge of the
/// last window. Always less than `stride`.
///
/// # Errors
///
/// Same preconditions as [`output_dims`]
///
/// # Example
///
/// ```
/// use ventana::pooling::remainder_extension;
///
/// assert_eq!(remainder_extension(4, 4, 2, 2).unwrap(), (0, 0));
/// assert_eq!(remainder_extension(5, 4, 2, 2).unwrap(), (1, 0));
/// assert_eq!(remainder_extension(6, 6, 2, 3).unwrap(), (2, 2));
/// ```
pub fn remainder_extension(
    rows: usize,
    cols: usize,
    kernel: usize,
    stride: usize,
) -> Result<(usize, usize)> {
    let (out_rows, out_cols) = output_dims(rows, cols, kernel, stride)?;
    Ok((
        (out_rows - 1) * stride + kernel - rows,
        (out_cols - 1) * stride + kernel - cols,
    ))
}

/// Copy of `source` with `extra_rows` zero rows below and `extra_cols` zero columns to the right
fn extend_bottom_right(source: &Matrix<f64>, extra_rows: usize, extra_cols: usize) -> Matrix<f64> {
    let (rows, cols) = source.shape();
    let new_cols = cols + extra_cols;
    let mut data = vec![0.0; (rows + extra_rows) * new_cols];
    for (y, out) in data.chunks_exact_mut(new_cols).take(rows).enumerate() {
        out[..cols].copy_from_slice(source.row_slice(y));
    }
    Matrix::from_raw(rows + extra_rows, new_cols, data)
}

/// Pool `source` with a `kernel x kernel` window stepped by `stride`
///
/// One worker per output row; each worker evaluates its windows
/// independently through a [`View`] on the (possibly extended) source.
///
/// # Errors
///
/// Returns `PreconditionViolation` if `kernel` or `stride` is zero, or the
/// kernel does not fit inside the matrix
#[cfg_attr(feature = "tracing", instrument(skip(executor, source), fields(dims = %format!("{}x{}", source.rows(), source.cols()))))]
pub fn pool(
    executor: &Executor,
    source: &Matrix<f64>,
    kernel: usize,
    stride: usize,
    mode: PoolingMode,
) -> Result<Matrix<f64>> {
    let (rows, cols) = source.shape();
    let (out_rows, out_cols) = output_dims(rows, cols, kernel, stride)?;
    let (extra_rows, extra_cols) = remainder_extension(rows, cols, kernel, stride)?;

    let extended: Cow<'_, Matrix<f64>> = if extra_rows == 0 && extra_cols == 0 {
        Cow::Borrowed(source)
    } else {
        #[cfg(feature = "tracing")]
        tracing::debug!(extra_rows, extra_cols, "extending pooling source with zeros");
        Cow::Owned(extend_bottom_right(source, extra_rows, extra_cols))
    };
    let src: &Matrix<f64> = &extended;
    let area = (kernel * kernel) as f64;

    let mut data = vec![0.0; out_rows * out_cols];
    executor.for_each_chunk(&mut data, out_cols, |y, out| {
        for (x, cell) in out.iter_mut().enumerate() {
            let window = View::new(src, y * stride, x * stride, kernel, kernel)?;
            *cell = match mode {
                PoolingMode::Max => window.max().ok_or_else(|| {
                    VentanaError::PreconditionViolation("empty pooling window".to_string())
                })?,
                PoolingMode::Avg => window.sum() / area,
            };
        }
        Ok(())
    })?;

    Ok(Matrix::from_raw(out_rows, out_cols, data))
}

impl Matrix<f64> {
    /// Pool with a `kernel x kernel` window stepped by `stride`
    ///
    /// `self` is left untouched, including when the window count does not
    /// divide evenly.
    ///
    /// # Errors
    ///
    /// See [`pool`]
    pub fn pooling(&self, kernel: usize, stride: usize, mode: PoolingMode) -> Result<Matrix<f64>> {
        pool(&Executor::default(), self, kernel, stride, mode)
    }
}
