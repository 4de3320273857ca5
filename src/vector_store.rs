//! VectorStore: persist chunks, filter-then-KNN search (spec §4.5).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, ChunkId, IndexMetadata};
use crate::error::{Result, SearchCodeError};
use crate::filter::Filter;

/// One scored search hit (spec §4.5 `search`).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Raw store distance; `1 - distance` is the cosine similarity for the
    /// reference implementation (spec §4.8 step 6).
    pub distance: f32,
}

/// Operations every vector store backend implements (spec §4.5). `upsertChunks`
/// is idempotent by `ChunkId`; `search` applies `filter` as a pre-filter
/// before KNN when the backend supports it.
pub trait VectorStore: Send + Sync {
    fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<()>;
    fn delete_by_file(&self, file: &str) -> Result<()>;
    fn search(&self, query_vector: &[f32], k: usize, filter: Option<&Filter>) -> Result<Vec<ScoredChunk>>;
    fn iterate_chunks(&self, filter: Option<&Filter>) -> Result<Vec<Chunk>>;

    fn load_metadata(&self) -> Result<Option<IndexMetadata>>;
    fn save_metadata(&self, metadata: &IndexMetadata) -> Result<()>;
    fn chunk_count(&self) -> Result<usize>;
    fn delete_all(&self) -> Result<()>;
}

/// On-disk document for the flat-file JSON store (one entry per chunk,
/// keyed by `ChunkId`), directly evolved from the teacher's `IndexStore`/
/// `FileIndexEntry` schema generalized from file-granularity to
/// chunk-granularity so the filter grammar has fields to filter on.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    chunks: HashMap<String, Chunk>,
}

/// Reference `VectorStore`: a single JSON file under the index directory,
/// guarded by an in-process `RwLock` (readers tolerate concurrent upserts
/// per spec §5; cross-process exclusion is the caller's advisory lock).
pub struct JsonVectorStore {
    chunks_path: PathBuf,
    metadata_path: PathBuf,
    doc: RwLock<StoreDocument>,
}

impl JsonVectorStore {
    pub fn open(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        let chunks_path = index_dir.join("chunks.json");
        let metadata_path = index_dir.join("metadata.json");
        let doc = load_document(&chunks_path)?;
        Ok(Self {
            chunks_path,
            metadata_path,
            doc: RwLock::new(doc),
        })
    }

    fn persist(&self, doc: &StoreDocument) -> Result<()> {
        atomic_write_json(&self.chunks_path, doc)
    }
}

fn load_document(path: &Path) -> Result<StoreDocument> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).map_err(|e| {
            SearchCodeError::IndexCorrupted {
                root: path.to_path_buf(),
                reason: e.to_string(),
            }
        }),
        Err(_) => Ok(StoreDocument::default()),
    }
}

/// Atomic write: serialize to a temp file in the same directory, then
/// rename over the destination (Design Notes §9, teacher's `IndexMetaV2`
/// pattern generalized to the whole document).
fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)
        .map_err(|e| SearchCodeError::StoreError(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for JsonVectorStore {
    fn upsert_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        let mut doc = self.doc.write().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        for chunk in chunks {
            doc.chunks.insert(chunk.id.as_str().to_string(), chunk);
        }
        self.persist(&doc)
    }

    fn delete_by_file(&self, file: &str) -> Result<()> {
        let mut doc = self.doc.write().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        doc.chunks.retain(|_, c| c.file != file);
        self.persist(&doc)
    }

    fn search(&self, query_vector: &[f32], k: usize, filter: Option<&Filter>) -> Result<Vec<ScoredChunk>> {
        let doc = self.doc.read().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        let mut scored: Vec<ScoredChunk> = doc
            .chunks
            .values()
            .filter(|c| filter.map(|f| f.matches(c)).unwrap_or(true))
            .map(|c| {
                let sim = cosine_similarity(query_vector, &c.embedding);
                ScoredChunk {
                    chunk: c.clone(),
                    distance: 1.0 - sim,
                }
            })
            .collect();
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn iterate_chunks(&self, filter: Option<&Filter>) -> Result<Vec<Chunk>> {
        let doc = self.doc.read().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        Ok(doc
            .chunks
            .values()
            .filter(|c| filter.map(|f| f.matches(c)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn load_metadata(&self) -> Result<Option<IndexMetadata>> {
        match std::fs::read_to_string(&self.metadata_path) {
            Ok(text) => {
                let metadata = serde_json::from_str(&text).map_err(|e| SearchCodeError::IndexCorrupted {
                    root: self.metadata_path.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Some(metadata))
            }
            Err(_) => Ok(None),
        }
    }

    fn save_metadata(&self, metadata: &IndexMetadata) -> Result<()> {
        atomic_write_json(&self.metadata_path, metadata)
    }

    fn chunk_count(&self) -> Result<usize> {
        let doc = self.doc.read().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        Ok(doc.chunks.len())
    }

    fn delete_all(&self) -> Result<()> {
        let mut doc = self.doc.write().map_err(|_| SearchCodeError::StoreError("lock poisoned".into()))?;
        doc.chunks.clear();
        self.persist(&doc)?;
        let _ = std::fs::remove_file(&self.metadata_path);
        Ok(())
    }
}

/// Stable key for grouping/joining store entries by chunk id.
pub fn chunk_key(id: &ChunkId) -> &str {
    id.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_empty_is_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn upsert_then_search_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonVectorStore::open(dir.path()).unwrap();
        let chunk = crate::chunk::Chunk {
            id: ChunkId::new("a.rs", 1, 3, Some("foo")),
            file: "a.rs".to_string(),
            start_line: 1,
            end_line: 3,
            content: "fn foo() {}".to_string(),
            content_hash: "h".to_string(),
            file_hash: "fh".to_string(),
            language: crate::chunk::Language::Rust,
            symbol_name: Some("foo".to_string()),
            symbol_type: crate::chunk::SymbolType::Function,
            variant: None,
            modifiers: Default::default(),
            decorators: vec![],
            complexity: 1,
            has_documentation: false,
            parent_scope: None,
            imports: vec![],
            embedding: vec![1.0, 0.0],
        };
        store.upsert_chunks(vec![chunk]).unwrap();
        assert_eq!(store.chunk_count().unwrap(), 1);
        let results = store.search(&[1.0, 0.0], 10, None).unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].distance).abs() < 1e-6);
    }
}
