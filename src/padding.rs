//! Border padding
//!
//! Produces a new matrix of shape `(rows + 2w, cols + 2w)` with the source
//! copied into the interior and the border filled according to a
//! [`PaddingMode`].
//!
//! Edge mode partitions the output into nine regions around the interior
//! rectangle. Corners repeat the nearest source corner, edges repeat the
//! nearest source border row or column, which is the same as clamping every
//! out-of-range coordinate into `[0, rows-1] × [0, cols-1]`. Each output row is
//! built from one clamped source row: left border, interior copy, right border.
//!
//! # Example
//!
//! ```
//! use ventana::{Matrix, PaddingMode};
//!
//! let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! let zero = m.zero_padding(1).unwrap();
//! assert_eq!(zero.row(0), Some(&[0.0, 0.0, 0.0, 0.0][..]));
//! assert_eq!(zero.row(1), Some(&[0.0, 1.0, 2.0, 0.0][..]));
//!
//! let edge = m.pad(1, PaddingMode::Edge).unwrap();
//! assert_eq!(edge.row(0), Some(&[1.0, 1.0, 2.0, 2.0][..]));
//! assert_eq!(edge.row(3), Some(&[3.0, 3.0, 4.0, 4.0][..]));
//! ```

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::matrix::Matrix;
use crate::{Result, VentanaError};

/// Border fill strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaddingMode {
    /// Border cells are `0.0`
    Zero,
    /// Border cells repeat the nearest source value
    Edge,
}

/// Output dimensions of padding a `rows x cols` matrix by `width` on every side
///
/// # Errors
///
/// Returns `PreconditionViolation` if the padded shape overflows `usize`
pub fn padded_dims(rows: usize, cols: usize, width: usize) -> Result<(usize, usize)> {
    let grow = |n: usize| {
        width
            .checked_mul(2)
            .and_then(|border| n.checked_add(border))
            .ok_or_else(|| {
                VentanaError::PreconditionViolation(format!(
                    "Padding width {width} overflows a {rows}x{cols} matrix"
                ))
            })
    };
    Ok((grow(rows)?, grow(cols)?))
}

/// Pad `source` by `width` cells on every side
///
/// A width of 0 returns a copy of the source.
///
/// # Errors
///
/// Returns `PreconditionViolation` if the padded shape overflows, or if edge
/// padding is requested for a matrix with no rows or no columns (there is no
/// border value to replicate)
#[cfg_attr(feature = "tracing", instrument(skip(executor, source), fields(dims = %format!("{}x{}", source.rows(), source.cols()))))]
pub fn pad(
    executor: &Executor,
    source: &Matrix<f64>,
    width: usize,
    mode: PaddingMode,
) -> Result<Matrix<f64>> {
    if width == 0 {
        return Ok(source.clone());
    }

    let (rows, cols) = source.shape();
    if mode == PaddingMode::Edge && (rows == 0 || cols == 0) {
        return Err(VentanaError::PreconditionViolation(format!(
            "Edge padding needs a non-empty matrix, got {rows}x{cols}"
        )));
    }

    let (new_rows, new_cols) = padded_dims(rows, cols, width)?;
    let mut data = vec![0.0; new_rows * new_cols];

    executor.for_each_chunk(&mut data, new_cols, |y, out| {
        match mode {
            PaddingMode::Zero => zero_pad_row(source, width, y, out),
            PaddingMode::Edge => edge_pad_row(source, width, y, out),
        }
        Ok(())
    })?;

    Ok(Matrix::from_raw(new_rows, new_cols, data))
}

/// Fill output row `y`; `out` arrives zeroed
fn zero_pad_row(source: &Matrix<f64>, width: usize, y: usize, out: &mut [f64]) {
    if y < width || y >= source.rows() + width {
        return;
    }
    out[width..width + source.cols()].copy_from_slice(source.row_slice(y - width));
}

fn edge_pad_row(source: &Matrix<f64>, width: usize, y: usize, out: &mut [f64]) {
    let src_y = y.saturating_sub(width).min(source.rows() - 1);
    let src = source.row_slice(src_y);
    let cols = src.len();

    let (left, rest) = out.split_at_mut(width);
    let (interior, right) = rest.split_at_mut(cols);
    left.fill(src[0]);
    interior.copy_from_slice(src);
    right.fill(src[cols - 1]);
}

impl Matrix<f64> {
    /// Pad with `width` cells on every side using `mode`
    ///
    /// # Errors
    ///
    /// See [`pad`]
    pub fn pad(&self, width: usize, mode: PaddingMode) -> Result<Matrix<f64>> {
        pad(&Executor::default(), self, width, mode)
    }

    /// Pad with a `width`-cell border of zeros
    ///
    /// # Errors
    ///
    /// See [`pad`]
    pub fn zero_padding(&self, width: usize) -> Result<Matrix<f64>> {
        self.pad(width, PaddingMode::Zero)
    }

    /// Pad with a `width`-cell border replicating the nearest edge value
    ///
    /// # Errors
    ///
    /// See [`pad`]
    pub fn edge_padding(&self, width: usize) -> Result<Matrix<f64>> {
        self.pad(width, PaddingMode::Edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clamp_reference(source: &Matrix<f64>, width: usize) -> Matrix<f64> {
        let (rows, cols) = source.shape();
        let (new_rows, new_cols) = (rows + 2 * width, cols + 2 * width);
        let mut data = Vec::with_capacity(new_rows * new_cols);
        for y in 0..new_rows {
            for x in 0..new_cols {
                let sy = (y as isize - width as isize).clamp(0, rows as isize - 1) as usize;
                let sx = (x as isize - width as isize).clamp(0, cols as isize - 1) as usize;
                data.push(*source.get(sy, sx).unwrap());
            }
        }
        Matrix::from_vec(new_rows, new_cols, data).unwrap()
    }

    #[test]
    fn test_zero_padding_ones() {
        let m = Matrix::from_vec(3, 4, vec![1.0; 12]).unwrap();
        let res = m.zero_padding(1).unwrap();
        assert_eq!(res.shape(), (5, 6));
        for y in 0..5 {
            for x in 0..6 {
                let border = y == 0 || y == 4 || x == 0 || x == 5;
                let expected = if border { 0.0 } else { 1.0 };
                assert_eq!(res.get(y, x), Some(&expected), "cell ({y}, {x})");
            }
        }
    }

    #[test]
    fn test_edge_padding_ones() {
        let m = Matrix::from_vec(3, 4, vec![1.0; 12]).unwrap();
        let res = m.edge_padding(1).unwrap();
        assert_eq!(res, Matrix::from_vec(5, 6, vec![1.0; 30]).unwrap());
    }

    #[test]
    fn test_edge_padding_regions() {
        // [[1, 2, 3],
        //  [4, 5, 6]]
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let res = m.edge_padding(2).unwrap();
        assert_eq!(res.shape(), (6, 7));
        #[rustfmt::skip]
        let expected = vec![
            1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0,
            1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0,
            1.0, 1.0, 1.0, 2.0, 3.0, 3.0, 3.0,
            4.0, 4.0, 4.0, 5.0, 6.0, 6.0, 6.0,
            4.0, 4.0, 4.0, 5.0, 6.0, 6.0, 6.0,
            4.0, 4.0, 4.0, 5.0, 6.0, 6.0, 6.0,
        ];
        assert_eq!(res.as_slice(), &expected[..]);
    }

    #[test]
    fn test_padding_width_zero_is_copy() {
        let m = Matrix::random_seeded(3, 5, 1);
        assert_eq!(m.zero_padding(0).unwrap(), m);
        assert_eq!(m.edge_padding(0).unwrap(), m);
    }

    #[test]
    fn test_edge_padding_empty_matrix() {
        let m = Matrix::zeros(0, 3);
        assert!(matches!(
            m.edge_padding(1),
            Err(VentanaError::PreconditionViolation(_))
        ));
        let zero = m.zero_padding(1).unwrap();
        assert_eq!(zero, Matrix::zeros(2, 5));
    }

    #[test]
    fn test_padding_overflow() {
        assert!(padded_dims(3, 3, usize::MAX).is_err());
        assert_eq!(padded_dims(3, 4, 2).unwrap(), (7, 8));
    }

    #[test]
    fn test_padding_sequential_matches_parallel() {
        let m = Matrix::random_seeded(17, 9, 5);
        for mode in [PaddingMode::Zero, PaddingMode::Edge] {
            let seq = pad(&Executor::sequential(), &m, 3, mode).unwrap();
            let par = pad(&Executor::default(), &m, 3, mode).unwrap();
            assert_eq!(seq, par);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: edge padding equals coordinate clamping
        #[test]
        fn test_edge_padding_is_clamping(
            rows in 1usize..8,
            cols in 1usize..8,
            width in 0usize..4,
            seed in any::<u64>(),
        ) {
            let m = Matrix::random_seeded(rows, cols, seed);
            prop_assert_eq!(m.edge_padding(width).unwrap(), clamp_reference(&m, width));
        }

        /// Property: zero padding keeps the interior and zeroes the rest
        #[test]
        fn test_zero_padding_interior(
            rows in 0usize..8,
            cols in 0usize..8,
            width in 0usize..4,
            seed in any::<u64>(),
        ) {
            let m = Matrix::random_seeded(rows, cols, seed);
            let res = m.zero_padding(width).unwrap();
            prop_assert_eq!(res.shape(), (rows + 2 * width, cols + 2 * width));
            let interior = res.view(width, width, rows, cols).unwrap().to_matrix();
            prop_assert_eq!(interior, m.clone());
            let border_sum: f64 = res.as_slice().iter().sum::<f64>() - m.as_slice().iter().sum::<f64>();
            prop_assert!(border_sum.abs() < 1e-9);
        }
    }
}
