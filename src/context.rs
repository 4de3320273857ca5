//! Per-run `Context` replacing global/singleton state (Design Notes §9).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::embedder::Embedder;
use crate::error::{Result, SearchCodeError};
use crate::vector_store::VectorStore;

/// Cooperative cancellation handle, checked between pipeline/indexing stages
/// (spec §5: "Search must accept a cancellation signal and check it between
/// pipeline stages"). A plain `AtomicBool` is enough since only polling is
/// required, never cross-task propagation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(Cancelled)` if cancellation was requested, else `Ok(())`.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SearchCodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Constructs and owns everything one repository's operations need: root
/// path, resolved configuration, cancellation handle, and handles to the
/// Embedder and VectorStore (Design Notes §9, "Context value passed through
/// operations").
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub cancellation: CancellationToken,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
}

impl Context {
    /// Builds a `Context` once per run; subsequent operations borrow from it
    /// (Design Notes §9, "lazy initialization of heavy singletons").
    pub fn build(
        root: impl AsRef<Path>,
        config: Config,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(SearchCodeError::DiscoveryError(format!(
                "root {} does not exist or is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
            cancellation: CancellationToken::new(),
            embedder,
            store,
        })
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join(&self.config.index_dir)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.index_dir().join("index.lock")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.index_dir().join("metadata.json")
    }
}
