//! Row Fan-Out Executor
//!
//! Every transform in Ventana writes into a single pre-sized output buffer.
//! The executor splits that buffer into disjoint chunks (one per output row,
//! or one per window-row for im2col) and hands each chunk to a worker. The
//! call returns only after every worker has finished.
//!
//! Workers run on a bounded rayon pool when the `parallel` feature is enabled
//! and inline otherwise.
//!
//! # Examples
//!
//! ```
//! use ventana::executor::{Executor, ExecutorConfig};
//!
//! // Default: rayon global pool sized to available parallelism
//! let global = Executor::default();
//!
//! // Bounded pool with four workers
//! let bounded = Executor::new(ExecutorConfig::new().with_max_threads(4)).unwrap();
//!
//! let mut out = vec![0usize; 12];
//! bounded
//!     .for_each_chunk(&mut out, 4, |row, chunk| {
//!         chunk.iter_mut().for_each(|v| *v = row);
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(out, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
//! # let _ = global;
//! ```

#[cfg(feature = "parallel")]
use std::sync::Arc;

use crate::Result;

/// Worker pool configuration
///
/// A `max_threads` of 0 means "use the rayon global pool", which is sized to
/// the available parallelism of the host. A value of 1 runs every chunk inline
/// on the calling thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Upper bound on worker threads (0 = global pool, 1 = inline)
    pub max_threads: usize,
    /// Minimum number of chunks before work is fanned out
    pub min_parallel_chunks: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            min_parallel_chunks: 2,
        }
    }
}

impl ExecutorConfig {
    /// Create a configuration with default values (global pool)
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of worker threads
    ///
    /// # Examples
    ///
    /// ```
    /// use ventana::executor::ExecutorConfig;
    ///
    /// let config = ExecutorConfig::new().with_max_threads(8);
    /// assert_eq!(config.max_threads, 8);
    /// ```
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Set the minimum chunk count for fan-out
    ///
    /// Values below 1 are raised to 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use ventana::executor::ExecutorConfig;
    ///
    /// let config = ExecutorConfig::new().with_min_parallel_chunks(0);
    /// assert_eq!(config.min_parallel_chunks, 1);
    /// ```
    pub fn with_min_parallel_chunks(mut self, chunks: usize) -> Self {
        self.min_parallel_chunks = chunks.max(1);
        self
    }

    /// Finalize configuration (no-op, for builder pattern consistency)
    pub fn build(self) -> Self {
        self
    }

    /// Run every chunk inline on the calling thread
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            min_parallel_chunks: 1,
        }
    }

    /// One worker per available core, fan out even for a single chunk
    pub fn saturating() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_threads: threads,
            min_parallel_chunks: 1,
        }
    }

    /// Returns true if this configuration never leaves the calling thread
    pub fn is_sequential(&self) -> bool {
        self.max_threads == 1
    }
}

/// Fan-out/join executor over disjoint chunks of an output buffer
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ExecutorConfig,
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Executor {
    /// Create an executor, building a dedicated pool when `max_threads > 1`
    ///
    /// # Errors
    ///
    /// Returns `ThreadPool` if the worker threads cannot be spawned
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        #[cfg(feature = "parallel")]
        {
            let pool = if config.max_threads > 1 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(config.max_threads)
                    .thread_name(|i| format!("ventana-worker-{i}"))
                    .build()
                    .map_err(|e| crate::VentanaError::ThreadPool(e.to_string()))?;
                Some(Arc::new(pool))
            } else {
                None
            };
            Ok(Self { config, pool })
        }

        #[cfg(not(feature = "parallel"))]
        {
            Ok(Self { config })
        }
    }

    /// Executor that runs every chunk on the calling thread
    pub fn sequential() -> Self {
        Self {
            config: ExecutorConfig::sequential(),
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Returns the configuration this executor was built from
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Number of workers that may run chunks concurrently
    pub fn num_workers(&self) -> usize {
        if self.config.is_sequential() {
            return 1;
        }

        #[cfg(feature = "parallel")]
        {
            match &self.pool {
                Some(pool) => pool.current_num_threads(),
                None => rayon::current_num_threads(),
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }

    /// Apply `f` to every `chunk_len`-sized chunk of `out`, then join
    ///
    /// `f` receives the chunk index and exclusive access to that chunk.
    /// Chunks never overlap, so workers write without locks. The first error
    /// returned by any worker is propagated after all workers have stopped.
    ///
    /// An empty buffer or a `chunk_len` of 0 is a no-op.
    ///
    /// # Errors
    ///
    /// Returns whatever error `f` produced
    pub fn for_each_chunk<T, F>(&self, out: &mut [T], chunk_len: usize, f: F) -> Result<()>
    where
        T: Send,
        F: Fn(usize, &mut [T]) -> Result<()> + Sync,
    {
        if chunk_len == 0 || out.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "parallel")]
        if self.fans_out(out.len(), chunk_len) {
            return match &self.pool {
                Some(pool) => pool.install(|| par_for_each_chunk(out, chunk_len, &f)),
                None => par_for_each_chunk(out, chunk_len, &f),
            };
        }

        out.chunks_mut(chunk_len)
            .enumerate()
            .try_for_each(|(idx, chunk)| f(idx, chunk))
    }

    /// Infallible counterpart of [`Executor::for_each_chunk`]
    ///
    /// For workers that only copy or compare and have no error to report.
    ///
    /// # Examples
    ///
    /// ```
    /// use ventana::Executor;
    ///
    /// let mut out = vec![0usize; 6];
    /// Executor::default().fill_chunks(&mut out, 2, |row, chunk| chunk.fill(row));
    /// assert_eq!(out, vec![0, 0, 1, 1, 2, 2]);
    /// ```
    pub fn fill_chunks<T, F>(&self, out: &mut [T], chunk_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        if chunk_len == 0 || out.is_empty() {
            return;
        }

        #[cfg(feature = "parallel")]
        if self.fans_out(out.len(), chunk_len) {
            use rayon::prelude::*;

            let run = |out: &mut [T]| {
                out.par_chunks_mut(chunk_len)
                    .enumerate()
                    .for_each(|(idx, chunk)| f(idx, chunk))
            };
            match &self.pool {
                Some(pool) => pool.install(|| run(out)),
                None => run(out),
            }
            return;
        }

        out.chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(idx, chunk)| f(idx, chunk));
    }

    /// Whether `len` elements split into `chunk_len` chunks go to the pool
    #[cfg(feature = "parallel")]
    fn fans_out(&self, len: usize, chunk_len: usize) -> bool {
        let chunks = len.div_ceil(chunk_len);
        let parallel = !self.config.is_sequential() && chunks >= self.config.min_parallel_chunks;

        #[cfg(feature = "tracing")]
        if parallel {
            tracing::trace!(chunks, chunk_len, "fan-out");
        }

        parallel
    }
}

/// Parallel body of [`Executor::for_each_chunk`] on the current rayon pool
#[cfg(feature = "parallel")]
fn par_for_each_chunk<T, F>(out: &mut [T], chunk_len: usize, f: &F) -> Result<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> Result<()> + Sync,
{
    use rayon::prelude::*;

    out.par_chunks_mut(chunk_len)
        .enumerate()
        .try_for_each(|(idx, chunk)| f(idx, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VentanaError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fill_with_index(executor: &Executor, rows: usize, cols: usize) -> Vec<usize> {
        let mut out = vec![usize::MAX; rows * cols];
        executor
            .for_each_chunk(&mut out, cols, |row, chunk| {
                for (col, v) in chunk.iter_mut().enumerate() {
                    *v = row * cols + col;
                }
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_threads, 0);
        assert_eq!(config.min_parallel_chunks, 2);
        assert!(!config.is_sequential());
    }

    #[test]
    fn test_config_builder() {
        let config = ExecutorConfig::new()
            .with_max_threads(3)
            .with_min_parallel_chunks(16)
            .build();
        assert_eq!(config.max_threads, 3);
        assert_eq!(config.min_parallel_chunks, 16);
    }

    #[test]
    fn test_config_presets() {
        assert!(ExecutorConfig::sequential().is_sequential());
        let saturating = ExecutorConfig::saturating();
        assert!(saturating.max_threads >= 1);
        assert_eq!(saturating.min_parallel_chunks, 1);
    }

    #[test]
    fn test_sequential_executor_has_one_worker() {
        assert_eq!(Executor::sequential().num_workers(), 1);
    }

    #[test]
    fn test_every_cell_written_once() {
        let expected: Vec<usize> = (0..37 * 11).collect();
        assert_eq!(fill_with_index(&Executor::sequential(), 37, 11), expected);
        assert_eq!(fill_with_index(&Executor::default(), 37, 11), expected);
    }

    #[test]
    fn test_every_chunk_visited_once() {
        let visits = AtomicUsize::new(0);
        let mut out = vec![0u8; 100 * 3];
        Executor::default()
            .for_each_chunk(&mut out, 3, |_, chunk| {
                visits.fetch_add(1, Ordering::SeqCst);
                assert_eq!(chunk.len(), 3);
                Ok(())
            })
            .unwrap();
        assert_eq!(visits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let mut out: Vec<f64> = Vec::new();
        let result = Executor::default().for_each_chunk(&mut out, 4, |_, _| {
            Err(VentanaError::PreconditionViolation("called".to_string()))
        });
        assert!(result.is_ok());

        let mut out = vec![1.0; 4];
        let result = Executor::default().for_each_chunk(&mut out, 0, |_, _| {
            Err(VentanaError::PreconditionViolation("called".to_string()))
        });
        assert!(result.is_ok());
    }

    #[test]
    fn test_worker_error_propagates() {
        let mut out = vec![0.0f64; 64];
        let result = Executor::default().for_each_chunk(&mut out, 8, |row, _| {
            if row == 5 {
                Err(VentanaError::SizeMismatch {
                    expected: 5,
                    actual: row,
                })
            } else {
                Ok(())
            }
        });
        assert_eq!(
            result,
            Err(VentanaError::SizeMismatch {
                expected: 5,
                actual: 5
            })
        );
    }

    #[test]
    fn test_fill_chunks_matches_for_each_chunk() {
        for executor in [Executor::sequential(), Executor::default()] {
            let mut out = vec![usize::MAX; 23 * 7];
            executor.fill_chunks(&mut out, 7, |row, chunk| {
                for (col, v) in chunk.iter_mut().enumerate() {
                    *v = row * 7 + col;
                }
            });
            assert_eq!(out, fill_with_index(&executor, 23, 7));
        }
    }

    #[test]
    fn test_fill_chunks_short_last_chunk() {
        let mut out = vec![0usize; 10];
        Executor::default().fill_chunks(&mut out, 4, |row, chunk| chunk.fill(row + 1));
        assert_eq!(out, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3]);

        let mut empty: Vec<usize> = Vec::new();
        Executor::default().fill_chunks(&mut empty, 4, |_, _| unreachable!());
        Executor::default().fill_chunks(&mut out, 0, |_, _| unreachable!());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_bounded_pool_size() {
        let executor = Executor::new(ExecutorConfig::new().with_max_threads(3)).unwrap();
        assert_eq!(executor.num_workers(), 3);

        let expected: Vec<usize> = (0..64 * 5).collect();
        assert_eq!(fill_with_index(&executor, 64, 5), expected);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_bounded_pool_runs_on_named_workers() {
        let executor = Executor::new(ExecutorConfig::saturating().with_max_threads(2)).unwrap();
        let mut names = vec![String::new(); 8];
        executor
            .for_each_chunk(&mut names, 1, |_, slot| {
                slot[0] = std::thread::current().name().unwrap_or("").to_string();
                Ok(())
            })
            .unwrap();
        assert!(names.iter().all(|n| n.starts_with("ventana-worker-")));
    }
}
