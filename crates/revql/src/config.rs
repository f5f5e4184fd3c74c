use std::num::NonZeroUsize;
use std::thread;

/// Rows handed to a streaming operator per `step`, and the output cap per step.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Library-side settings for [`crate::SqlEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub chunk_size: usize,
    /// Worker threads used for streaming tables.
    pub threads: usize,
    /// Content limit for the `git_read` tables.
    pub max_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: Self::default_threads(),
            max_bytes: None,
        }
    }
}

impl EngineConfig {
    pub fn default_threads() -> usize {
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: Option<usize>) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}
