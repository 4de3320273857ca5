use std::path::PathBuf;

/// Error taxonomy for all public `semcode` operations (spec §7).
///
/// `ParseError` is deliberately absent: per-file parse failures are recovered
/// internally (chunker falls back to a whole-file chunk), logged, and counted
/// in the run summary rather than surfaced here.
#[derive(Debug, thiserror::Error)]
pub enum SearchCodeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no index found at {root}; run `indexFull` first")]
    NoIndex { root: PathBuf },

    #[error(
        "embedding model mismatch: index was built with `{indexed}` (dim {indexed_dim}), \
         current embedder is `{current}` (dim {current_dim}); reindex required"
    )]
    ModelMismatch {
        indexed: String,
        indexed_dim: usize,
        current: String,
        current_dim: usize,
    },

    #[error("index schema version {found} is incompatible with {expected}; rebuild required")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("discovery failed: {0}")]
    DiscoveryError(String),

    #[error("embedder error ({kind}): {message}")]
    EmbedderError { message: String, kind: EmbedderErrorKind },

    #[error("vector store error: {0}")]
    StoreError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("index corrupted at {root}: {reason}; repair with deleteIndex + indexFull")]
    IndexCorrupted { root: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderErrorKind {
    /// Worth retrying (rate limit, transient network failure).
    Transient,
    /// Not worth retrying (misconfiguration, unknown model id).
    Fatal,
}

impl std::fmt::Display for EmbedderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedderErrorKind::Transient => write!(f, "transient"),
            EmbedderErrorKind::Fatal => write!(f, "fatal"),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchCodeError>;
