//! Error taxonomy.
//!
//! Only "key not found" is ever recovered (by the calling cache engine,
//! which folds it into a miss); everything else — bad configuration, short
//! reads/writes, invariant violations — is fatal and bubbles up to `main`
//! as a diagnostic.

use thiserror::Error;

/// Configuration and construction preconditions failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("blocksize must be greater than 0")]
    ZeroBlockSize,

    #[error("maxfilesize must be greater than 0")]
    ZeroMaxFileSize,

    #[error("reads must be between 0 and 100, got {0}")]
    ReadPercentOutOfRange(i64),

    #[error("deletions must be between 0 and 100, got {0}")]
    DeletionPercentOutOfRange(i64),

    #[error("cachesize must be greater than 0")]
    ZeroCacheSize,

    #[error("backend '{0}' is not implemented by this simulator")]
    UnsupportedBackend(String),

    #[error("cache capacity must be at least 1 block")]
    ZeroCacheBlocks,

    #[error("backend construction failed: {0}")]
    BackendInit(#[from] KvError),
}

/// Backend key/value store failures.
#[derive(Debug, Error)]
pub enum KvError {
    /// Recoverable: the caller treats this as a cache miss.
    #[error("key not found")]
    NotFound,

    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short write: expected {expected} bytes, got {got}")]
    ShortWrite { expected: usize, got: usize },

    #[error("integrity check failed for key '{key}' at index {index}")]
    IntegrityMismatch { key: String, index: u64 },

    #[error("index {index} lies outside any segment's data region")]
    IndexOutOfRange { index: u64 },

    #[error("writer task is no longer running")]
    WriterGone,
}

impl KvError {
    /// True for the one recoverable variant — everything else is a bug, not
    /// a workload condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound)
    }
}
