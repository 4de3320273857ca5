//! Embedder: text → fixed-dim vector, with optional rerank (spec §4.4).

use std::sync::Mutex;

use model2vec_rs::model::StaticModel;

use crate::error::{EmbedderErrorKind, Result, SearchCodeError};

/// A scored rerank candidate (spec §4.8 step 8).
#[derive(Debug, Clone)]
pub struct RerankCandidate {
    pub id: String,
    pub text: String,
}

/// Maps text to a fixed-dimension vector; batch capable, deterministic for
/// fixed inputs within a model version (spec §4.4). Used for both indexing
/// and query-time embedding — the index's authoritative embedder is frozen
/// in `IndexMetadata` (spec §3 invariant 3).
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Optional capability; absence (the default) means rerank is a no-op —
    /// callers should detect this via `supports_rerank()` rather than
    /// relying on behavior, since a default no-op still returns `Ok`.
    fn rerank(&self, _query: &str, candidates: &[RerankCandidate]) -> Result<Vec<f32>> {
        Ok(vec![0.0; candidates.len()])
    }

    fn supports_rerank(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn provider(&self) -> &str;
}

/// Reference implementation: a local static-embedding model loaded via
/// `model2vec-rs`, the same way the teacher's `CodebaseIndex` does
/// (`StaticModel::from_pretrained` + `encode_single`).
pub struct Model2VecEmbedder {
    model: Mutex<StaticModel>,
    model_id: String,
    dim: usize,
}

impl Model2VecEmbedder {
    pub fn load(model_id: &str) -> Result<Self> {
        let model = StaticModel::from_pretrained(model_id, None, None, None).map_err(|e| {
            SearchCodeError::EmbedderError {
                message: e.to_string(),
                kind: EmbedderErrorKind::Fatal,
            }
        })?;
        let dim = model.encode_single("dimension probe").len();
        Ok(Self {
            model: Mutex::new(model),
            model_id: model_id.to_string(),
            dim,
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.lock().map_err(|_| SearchCodeError::EmbedderError {
            message: "embedder lock poisoned".to_string(),
            kind: EmbedderErrorKind::Fatal,
        })?;
        Ok(texts.iter().map(|t| model.encode_single(t)).collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn provider(&self) -> &str {
        "model2vec"
    }
}

/// Runs `embedder.embed` with bounded exponential backoff for transient
/// failures, up to 3 attempts (spec §7). Fatal errors are not retried.
pub fn embed_with_retry(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    const MAX_ATTEMPTS: u32 = 3;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match embedder.embed(texts) {
            Ok(v) => return Ok(v),
            Err(SearchCodeError::EmbedderError { message, kind: EmbedderErrorKind::Transient })
                if attempt < MAX_ATTEMPTS =>
            {
                let backoff_ms = 100u64 * 2u64.pow(attempt - 1);
                tracing::warn!(attempt, backoff_ms, %message, "embedder transient error, retrying");
                std::thread::sleep(std::time::Duration::from_millis(backoff_ms));
            }
            Err(e) => return Err(e),
        }
    }
}
