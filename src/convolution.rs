//! 2D convolution via im2col and a single matrix multiply
//!
//! Computes "valid" cross-correlation: only fully in-bounds kernel placements
//! contribute and the kernel is not flipped.
//!
//! ```text
//! source ──im2col(k, s)──► windows (n × k²) ──ᵀ──► (k² × n)
//! kernel ──flatten──────► (1 × k²) ──────────────────┴──► (1 × n) ──reshape──► (rows × cols)
//! ```
//!
//! with `rows = (source.rows - k) / s + 1` and `cols = (source.cols - k) / s + 1`.
//!
//! # Example
//!
//! ```
//! use ventana::Matrix;
//!
//! let image = Matrix::from_vec(3, 3, vec![
//!     1.0, 2.0, 3.0,
//!     4.0, 5.0, 6.0,
//!     7.0, 8.0, 9.0,
//! ]).unwrap();
//! let kernel = Matrix::from_vec(2, 2, vec![1.0, 0.0, 0.0, -1.0]).unwrap();
//!
//! let out = image.convolve2d(1, &kernel).unwrap();
//! assert_eq!(out.as_slice(), &[-4.0, -4.0, -4.0, -4.0]);
//! ```

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::im2col::{im2col, window_grid};
use crate::matrix::Matrix;
use crate::padding::{pad, PaddingMode};
use crate::{Result, VentanaError};

/// Output shape of a valid convolution with a square `kernel_size` kernel
///
/// # Errors
///
/// Returns `PreconditionViolation` if `kernel_size` or `stride` is zero, or the
/// kernel does not fit inside the source
pub fn output_dims(
    rows: usize,
    cols: usize,
    kernel_size: usize,
    stride: usize,
) -> Result<(usize, usize)> {
    window_grid(rows, cols, kernel_size, stride)
}

/// Valid 2D cross-correlation of `source` with a square `kernel`
///
/// # Errors
///
/// - `DimensionMismatch` if the kernel is not square (carrying its rows and cols)
/// - `PreconditionViolation` if `stride` is zero or the kernel is larger than the source
/// - `SizeMismatch` if the product cannot be reshaped to the output shape
#[cfg_attr(feature = "tracing", instrument(skip(executor, source, kernel), fields(dims = %format!("{}x{} * {}x{}", source.rows(), source.cols(), kernel.rows(), kernel.cols()))))]
pub fn convolve2d(
    executor: &Executor,
    source: &Matrix<f64>,
    stride: usize,
    kernel: &Matrix<f64>,
) -> Result<Matrix<f64>> {
    let (kernel_rows, kernel_cols) = kernel.shape();
    if kernel_rows != kernel_cols {
        return Err(VentanaError::DimensionMismatch {
            left: kernel_rows,
            right: kernel_cols,
        });
    }

    let (rows, cols) = output_dims(source.rows(), source.cols(), kernel_rows, stride)?;

    let windows = im2col(executor, source, kernel_rows, stride)?;
    let flat = kernel.flatten_with(executor);
    let product = flat.matmul_with(executor, &windows.transpose())?;

    product.into_shape(rows, cols)
}

/// Pad `source` by `padding` cells with `mode`, then correlate with `kernel`
///
/// With an odd `k x k` kernel, stride 1 and `padding = k / 2` the output has
/// the source's shape.
///
/// # Errors
///
/// Any error of [`pad`] or [`convolve2d`]
pub fn convolve2d_padded(
    executor: &Executor,
    source: &Matrix<f64>,
    stride: usize,
    padding: usize,
    mode: PaddingMode,
    kernel: &Matrix<f64>,
) -> Result<Matrix<f64>> {
    if padding == 0 {
        return convolve2d(executor, source, stride, kernel);
    }
    let padded = pad(executor, source, padding, mode)?;
    convolve2d(executor, &padded, stride, kernel)
}

impl Matrix<f64> {
    /// Valid 2D cross-correlation with a square `kernel`
    ///
    /// # Errors
    ///
    /// See [`convolve2d`]
    pub fn convolve2d(&self, stride: usize, kernel: &Matrix<f64>) -> Result<Matrix<f64>> {
        convolve2d(&Executor::default(), self, stride, kernel)
    }

    /// Replace `self` with its convolution by `kernel`
    ///
    /// The whole storage is swapped in one step once the result is complete;
    /// on error `self` is unchanged.
    ///
    /// # Errors
    ///
    /// See [`convolve2d`]
    ///
    /// # Example
    ///
    /// ```
    /// use ventana::{Matrix, VentanaError};
    ///
    /// let mut m = Matrix::from_vec(3, 3, vec![1.0; 9]).unwrap();
    /// let bad = Matrix::zeros(2, 3);
    /// assert_eq!(
    ///     m.convolve2d_assign(1, &bad),
    ///     Err(VentanaError::DimensionMismatch { left: 2, right: 3 })
    /// );
    /// assert_eq!(m.shape(), (3, 3));
    ///
    /// m.convolve2d_assign(1, &Matrix::from_vec(2, 2, vec![1.0; 4]).unwrap()).unwrap();
    /// assert_eq!(m.as_slice(), &[4.0; 4]);
    /// ```
    pub fn convolve2d_assign(&mut self, stride: usize, kernel: &Matrix<f64>) -> Result<()> {
        *self = self.convolve2d(stride, kernel)?;
        Ok(())
    }
}
