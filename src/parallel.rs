//! Parallel processing configuration
//!
//! Only the per-pixel statistics run on the rayon pool; archive reads are
//! always sequential.

use crate::errors::{GimmsError, Result};
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Set up the global Rayon thread pool with the specified configuration
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    GimmsError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {} threads: {}",
                        num_threads, e
                    ))
                })?;

            log::info!("Configured parallel processing with {} threads", num_threads);
        } else {
            log::debug!("Using default thread pool configuration");
        }

        Ok(())
    }
}
