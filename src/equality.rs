//! Parallel exact equality
//!
//! Two matrices are equal when their shapes match and every element has the
//! same bit pattern. There is no tolerance. Because the comparison is on bits,
//! a matrix containing NaN still equals itself, while `0.0` and `-0.0` differ.
//!
//! Each worker compares one row and writes exactly one verdict into its own
//! slot of a per-row verdict buffer. After the join a single sequential pass
//! reduces the buffer, so there is exactly one answer per matrix pair no matter
//! how many elements differ.

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::executor::Executor;
use crate::matrix::Matrix;

/// Returns true if `a` and `b` have the same shape and identical elements
///
/// Shapes are compared first; on a mismatch no element is inspected.
///
/// # Example
///
/// ```
/// use ventana::executor::Executor;
/// use ventana::equality::equals;
/// use ventana::Matrix;
///
/// let a = Matrix::from_vec(2, 2, vec![1.0; 4]).unwrap();
/// let b = Matrix::from_vec(2, 2, vec![2.0; 4]).unwrap();
/// let executor = Executor::default();
/// assert!(equals(&executor, &a, &a));
/// assert!(!equals(&executor, &a, &b));
/// assert!(!equals(&executor, &a, &Matrix::from_vec(1, 4, vec![1.0; 4]).unwrap()));
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(executor, a, b), fields(dims = %format!("{}x{} == {}x{}", a.rows(), a.cols(), b.rows(), b.cols()))))]
pub fn equals(executor: &Executor, a: &Matrix<f64>, b: &Matrix<f64>) -> bool {
    if a.shape() != b.shape() {
        return false;
    }

    let mut verdicts = vec![false; a.rows()];
    executor.fill_chunks(&mut verdicts, 1, |y, slot| {
        slot[0] = rows_identical(a.row_slice(y), b.row_slice(y));
    });

    verdicts.iter().all(|&same| same)
}

fn rows_identical(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl Matrix<f64> {
    /// Exact, shape-aware equality computed one row per worker
    ///
    /// See [`equals`].
    pub fn equals(&self, other: &Matrix<f64>) -> bool {
        equals(&Executor::default(), self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equals() {
        let m1 = Matrix::from_vec(2, 2, vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        let m2 = Matrix::from_vec(2, 2, vec![2.0, 2.0, 2.0, 2.0]).unwrap();
        assert!(m1.equals(&m1));
        assert!(!m1.equals(&m2));
    }

    #[test]
    fn test_equals_shape_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(3, 2);
        assert!(!a.equals(&b));
        assert!(!a.equals(&a.reshape(1, 6).unwrap()));
    }

    #[test]
    fn test_equals_many_mismatches() {
        // Every element differs; still exactly one verdict per pair
        let a = Matrix::zeros(200, 50);
        let b = Matrix::from_vec(200, 50, vec![1.0; 10_000]).unwrap();
        let executor = Executor::default();
        for _ in 0..10 {
            assert!(!equals(&executor, &a, &b));
        }
    }

    #[test]
    fn test_equals_single_difference_in_last_row() {
        let a = Matrix::random_seeded(64, 8, 21);
        let mut b = a.clone();
        *b.get_mut(63, 7).unwrap() += 1.0;
        assert!(!a.equals(&b));
        assert!(!equals(&Executor::sequential(), &a, &b));
    }

    #[test]
    fn test_equals_is_bitwise() {
        let nan = Matrix::from_vec(1, 2, vec![f64::NAN, 1.0]).unwrap();
        assert!(nan.equals(&nan));

        let pos = Matrix::from_vec(1, 1, vec![0.0]).unwrap();
        let neg = Matrix::from_vec(1, 1, vec![-0.0]).unwrap();
        assert!(!pos.equals(&neg));

        let a = Matrix::from_vec(1, 1, vec![0.1 + 0.2]).unwrap();
        let b = Matrix::from_vec(1, 1, vec![0.3]).unwrap();
        assert!(!a.equals(&b));
    }

    #[test]
    fn test_equals_empty() {
        assert!(Matrix::zeros(0, 4).equals(&Matrix::zeros(0, 4)));
        assert!(Matrix::zeros(4, 0).equals(&Matrix::zeros(4, 0)));
        assert!(!Matrix::zeros(0, 4).equals(&Matrix::zeros(4, 0)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: every matrix equals itself and its clone
        #[test]
        fn test_equals_reflexive(rows in 0usize..20, cols in 0usize..20, seed in any::<u64>()) {
            let m = Matrix::random_seeded(rows, cols, seed);
            prop_assert!(m.equals(&m));
            prop_assert!(m.equals(&m.clone()));
        }

        /// Property: changing any single element breaks equality
        #[test]
        fn test_equals_detects_any_change(
            rows in 1usize..16,
            cols in 1usize..16,
            seed in any::<u64>(),
            pick in any::<prop::sample::Index>(),
        ) {
            let a = Matrix::random_seeded(rows, cols, seed);
            let idx = pick.index(rows * cols);
            let mut b = a.clone();
            *b.get_mut(idx / cols, idx % cols).unwrap() += 1.0;
            prop_assert!(!a.equals(&b));
        }
    }
}
