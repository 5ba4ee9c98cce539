//! Ventana: Windowed Dense-Matrix Transforms
//!
//! **Ventana** (Spanish: "window") supplies the building blocks of 2D
//! convolutional computation on dense `f64` matrices:
//!
//! 1. **Padding** - zero-fill or edge-replicate borders
//! 2. **Pooling** - max or average reduction of sliding windows
//! 3. **im2col** - unroll every sliding window into one row
//! 4. **Convolution** - im2col + flattened kernel + one matrix multiply
//!
//! # Design Principles
//!
//! - **Zero-copy windows**: a [`View`] borrows the source, bounds checked once
//! - **Row fan-out**: every transform writes disjoint rows of one pre-sized
//!   buffer from a bounded worker pool, joined before the result is returned
//! - **Inputs are never mutated**: every transform allocates a fresh output
//! - **Declared failures**: out-of-range windows, zero strides and shape
//!   mismatches are [`VentanaError`]s, never panics
//!
//! # Quick Start
//!
//! ```rust
//! use ventana::{Matrix, PoolingMode};
//!
//! let image = Matrix::from_vec(4, 4, vec![
//!     1.0, 2.0, 3.0, 4.0,
//!     5.0, 6.0, 7.0, 8.0,
//!     9.0, 10.0, 11.0, 12.0,
//!     13.0, 14.0, 15.0, 16.0,
//! ]).unwrap();
//!
//! let pooled = image.pooling(2, 2, PoolingMode::Max).unwrap();
//! assert_eq!(pooled.as_slice(), &[6.0, 8.0, 14.0, 16.0]);
//!
//! let kernel = Matrix::from_vec(3, 3, vec![1.0; 9]).unwrap();
//! let same = image.edge_padding(1).unwrap().convolve2d(1, &kernel).unwrap();
//! assert_eq!(same.shape(), (4, 4));
//! ```
//!
//! # Executors
//!
//! The methods on [`Matrix`] run on the default executor (rayon's global pool).
//! The free functions in each module take an explicit [`Executor`], which can
//! be bounded or forced sequential through [`ExecutorConfig`].
//!
//! ```rust
//! use ventana::{im2col, Executor, ExecutorConfig, Matrix};
//!
//! let executor = Executor::new(ExecutorConfig::new().with_max_threads(2)).unwrap();
//! let m = Matrix::random_seeded(6, 6, 42);
//! let windows = im2col::im2col(&executor, &m, 3, 1).unwrap();
//! assert_eq!(windows.shape(), (16, 9));
//! ```

pub mod convolution;
pub mod equality;
pub mod error;
pub mod executor;
pub mod im2col;
pub mod matrix;
pub mod padding;
pub mod pooling;
pub mod view;

pub use error::{Result, VentanaError};
pub use executor::{Executor, ExecutorConfig};
pub use matrix::Matrix;
pub use padding::PaddingMode;
pub use pooling::PoolingMode;
pub use view::View;
