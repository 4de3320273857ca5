//! Shared fixtures for integration tests: a deterministic bag-of-words
//! `Embedder` (no network/model download needed) and a scratch-repo builder.

use std::path::Path;
use std::sync::Arc;

use semcode::config::Config;
use semcode::context::Context;
use semcode::embedder::Embedder;
use semcode::error::Result;
use semcode::vector_store::{JsonVectorStore, VectorStore};

pub const TEST_DIM: usize = 32;

/// Deterministic hashing-trick embedder: each lowercased word token is hashed
/// into one of `TEST_DIM` bins, then the bin vector is L2-normalized. Same
/// text always yields the same vector; semantically overlapping text (shared
/// words) yields higher cosine similarity, which is all the search pipeline
/// needs from an `Embedder` in tests.
pub struct HashEmbedder {
    model_id: String,
}

impl HashEmbedder {
    pub fn new(model_id: &str) -> Self {
        Self { model_id: model_id.to_string() }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new("test-hash-embedder-v1")
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hash_vector(t)).collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        TEST_DIM
    }

    fn provider(&self) -> &str {
        "test-hash"
    }
}

fn hash_vector(text: &str) -> Vec<f32> {
    let mut bins = vec![0f32; TEST_DIM];
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let bucket = (fxhash(word) as usize) % TEST_DIM;
        bins[bucket] += 1.0;
    }
    let norm: f32 = bins.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for b in &mut bins {
            *b /= norm;
        }
    }
    bins
}

fn fxhash(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Writes `files` (relative path, content) under a fresh temp directory and
/// returns it.
pub fn scratch_repo(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
    dir
}

/// Builds a `Context` over `root` with the deterministic test embedder and a
/// fresh `JsonVectorStore`.
pub fn build_context(root: &Path) -> Context {
    build_context_with_model(root, "test-hash-embedder-v1")
}

pub fn build_context_with_model(root: &Path, model_id: &str) -> Context {
    let config = Config::default();
    let index_dir = root.join(&config.index_dir);
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(model_id));
    let store: Arc<dyn VectorStore> = Arc::new(JsonVectorStore::open(&index_dir).unwrap());
    Context::build(root, config, embedder, store).unwrap()
}
