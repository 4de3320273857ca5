//! Indexer: full/incremental indexing, verification, stats (spec §4.6).

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;

use crate::chunk::{file_hash, Chunk, ChunkId, FileHashEntry, IndexMetadata, Language, SCHEMA_VERSION};
use crate::chunker::chunk_file;
use crate::context::Context;
use crate::discovery::{self, DiscoveredFile, DiscoveryOptions};
use crate::embedder::embed_with_retry;
use crate::error::{Result, SearchCodeError};
use crate::language::LanguageRegistry;

/// Inputs shared by `index_full`/`index_incremental` (spec §6). An empty
/// `languages` list means "all registered languages".
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullIndexSummary {
    pub files: usize,
    pub chunks: usize,
    pub duration_ms: u64,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncrementalSummary {
    pub files: usize,
    pub chunks: usize,
    pub skipped: usize,
    pub removed: usize,
    pub duration_ms: u64,
    pub mode: String,
    pub errors: usize,
}

/// `removed` is always 0: `verifyIndex` only recomputes hashes, it never
/// mutates the store (spec §9 leaves the field's exact meaning for verify
/// underspecified; kept for shape-symmetry with `IncrementalSummary`).
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub indexed: usize,
    pub changed: usize,
    pub missing: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub embed_model_id: String,
    pub embed_dim: usize,
    pub embed_provider: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub schema_version: u32,
    pub file_count: usize,
    pub chunk_count: usize,
}

/// Advisory single-writer lock on a file inside the index directory (spec §5).
/// Held for the duration of any mutating operation; released on drop.
struct LockGuard(std::fs::File);

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.0);
    }
}

fn acquire_lock(ctx: &Context) -> Result<LockGuard> {
    use fs2::FileExt;
    let path = ctx.lock_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new().create(true).write(true).open(&path)?;
    file.try_lock_exclusive().map_err(|_| {
        SearchCodeError::StoreError(format!(
            "index at {} is locked by another writer",
            ctx.index_dir().display()
        ))
    })?;
    Ok(LockGuard(file))
}

fn discovery_options(ctx: &Context) -> DiscoveryOptions {
    DiscoveryOptions {
        include_globs: ctx.config.scan.include_globs.clone(),
        extra_exclude_globs: ctx.config.scan.exclude_globs.clone(),
        exclude_dir_names: ctx.config.scan.exclude_dir_names.clone(),
        max_file_bytes: ctx.config.scan.max_file_bytes,
    }
}

fn restrict_languages(registry: &LanguageRegistry, opts: &IndexOptions) -> Option<HashSet<Language>> {
    if opts.languages.is_empty() {
        None
    } else {
        Some(registry.supported_languages(&opts.languages).into_iter().collect())
    }
}

fn bounded_pool(ctx: &Context) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.config.embedder.max_in_flight.max(1))
        .build()
        .map_err(|e| SearchCodeError::StoreError(e.to_string()))
}

fn rel_path_string(discovered: &DiscoveredFile) -> String {
    discovered.rel_path.to_string_lossy().replace('\\', "/")
}

/// Embeds `chunks` in batches (spec §4.6 "embed all chunks of the file
/// (batched)") and upserts them as one file-granular unit. Any embedder
/// failure aborts the whole file — the caller counts it in `errors` and the
/// file's previous state (if any) stays untouched until a later run succeeds.
fn embed_and_upsert(ctx: &Context, chunks: &mut [Chunk]) -> Result<usize> {
    if chunks.is_empty() {
        return Ok(0);
    }
    let batch_size = ctx.config.embedder.batch_size.max(1);
    for batch in chunks.chunks_mut(batch_size) {
        ctx.cancellation.check()?;
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = embed_with_retry(ctx.embedder.as_ref(), &texts)?;
        for (chunk, vector) in batch.iter_mut().zip(vectors.into_iter()) {
            chunk.embedding = vector;
        }
    }
    ctx.store.upsert_chunks(chunks.to_vec())?;
    Ok(chunks.len())
}

/// Full index algorithm (spec §4.6): enumerate, chunk+embed every file,
/// replace the whole store, then write metadata atomically.
pub fn index_full(ctx: &Context, opts: &IndexOptions) -> Result<FullIndexSummary> {
    let start = Instant::now();
    let _lock = acquire_lock(ctx)?;
    ctx.store.delete_all()?;

    let registry = LanguageRegistry::new();
    let restrict_set = restrict_languages(&registry, opts);

    let files: Vec<DiscoveredFile> = discovery::discover(&ctx.root, &discovery_options(ctx))?.collect();
    ctx.cancellation.check()?;

    let parsed: Vec<(String, String, Vec<Chunk>)> = files
        .par_iter()
        .filter_map(|f| {
            let language = Language::from_path(&f.rel_path)?;
            if let Some(set) = &restrict_set {
                if !set.contains(&language) {
                    return None;
                }
            }
            let bytes = std::fs::read(&f.abs_path).ok()?;
            let hash = file_hash(&bytes);
            let content = String::from_utf8_lossy(&bytes).replace("\r\n", "\n");
            let rel_path = rel_path_string(f);
            let chunks = chunk_file(&registry, &rel_path, &content, &hash, language);
            Some((rel_path, hash, chunks))
        })
        .collect();

    ctx.cancellation.check()?;

    let pool = bounded_pool(ctx)?;
    let outcomes: Vec<(String, Result<(FileHashEntry, usize)>)> = pool.install(|| {
        parsed
            .into_par_iter()
            .map(|(rel_path, file_hash, mut chunks)| {
                let chunk_ids: Vec<ChunkId> = chunks.iter().map(|c| c.id.clone()).collect();
                let res = embed_and_upsert(ctx, &mut chunks)
                    .map(|n| (FileHashEntry { file_hash, chunk_ids }, n));
                (rel_path, res)
            })
            .collect()
    });

    let mut file_hashes = HashMap::new();
    let mut total_chunks = 0usize;
    let mut errors = 0usize;
    let mut files_indexed = 0usize;
    for (rel_path, res) in outcomes {
        match res {
            Ok((entry, n)) => {
                total_chunks += n;
                files_indexed += 1;
                file_hashes.insert(rel_path, entry);
            }
            Err(e) => {
                tracing::warn!(file = %rel_path, error = %e, "embedding failed, file skipped");
                errors += 1;
            }
        }
    }

    let mut metadata = IndexMetadata::new(
        ctx.embedder.model_id().to_string(),
        ctx.embedder.dim(),
        ctx.embedder.provider().to_string(),
    );
    metadata.file_hashes = file_hashes;
    ctx.store.save_metadata(&metadata)?;

    Ok(FullIndexSummary {
        files: files_indexed,
        chunks: total_chunks,
        duration_ms: start.elapsed().as_millis() as u64,
        errors,
    })
}

/// Incremental index algorithm (spec §4.6): classify files as
/// unchanged/new/changed/removed against `IndexMetadata.fileHashes`, then
/// process only the delta.
pub fn index_incremental(ctx: &Context, opts: &IndexOptions) -> Result<IncrementalSummary> {
    let start = Instant::now();
    let _lock = acquire_lock(ctx)?;

    let registry = LanguageRegistry::new();
    let restrict_set = restrict_languages(&registry, opts);

    let existing = ctx.store.load_metadata()?;
    let mut metadata = match existing {
        Some(m) => {
            if m.schema_version != SCHEMA_VERSION {
                return Err(SearchCodeError::SchemaMismatch {
                    found: m.schema_version,
                    expected: SCHEMA_VERSION,
                });
            }
            if m.embed_model_id != ctx.embedder.model_id() || m.embed_dim != ctx.embedder.dim() {
                return Err(SearchCodeError::ModelMismatch {
                    indexed: m.embed_model_id,
                    indexed_dim: m.embed_dim,
                    current: ctx.embedder.model_id().to_string(),
                    current_dim: ctx.embedder.dim(),
                });
            }
            m
        }
        None => IndexMetadata::new(
            ctx.embedder.model_id().to_string(),
            ctx.embedder.dim(),
            ctx.embedder.provider().to_string(),
        ),
    };
    let previous_hashes = metadata.file_hashes.clone();

    let files: Vec<DiscoveredFile> = discovery::discover(&ctx.root, &discovery_options(ctx))?.collect();
    ctx.cancellation.check()?;

    let current: Vec<(String, String, Language, Vec<u8>)> = files
        .par_iter()
        .filter_map(|f| {
            let language = Language::from_path(&f.rel_path)?;
            if let Some(set) = &restrict_set {
                if !set.contains(&language) {
                    return None;
                }
            }
            let bytes = std::fs::read(&f.abs_path).ok()?;
            let hash = file_hash(&bytes);
            Some((rel_path_string(f), hash, language, bytes))
        })
        .collect();

    let current_set: HashSet<&str> = current.iter().map(|(p, ..)| p.as_str()).collect();

    let mut to_process: Vec<&(String, String, Language, Vec<u8>)> = Vec::new();
    let mut skipped = 0usize;
    for entry in &current {
        let (rel_path, hash, ..) = entry;
        match previous_hashes.get(rel_path) {
            Some(old) if &old.file_hash == hash => skipped += 1,
            _ => to_process.push(entry),
        }
    }

    let removed_paths: Vec<&String> = previous_hashes
        .keys()
        .filter(|p| !current_set.contains(p.as_str()))
        .collect();
    for p in &removed_paths {
        ctx.store.delete_by_file(p)?;
        metadata.file_hashes.remove(*p);
    }
    let removed = removed_paths.len();

    let parsed: Vec<(String, String, Vec<Chunk>)> = to_process
        .par_iter()
        .map(|(rel_path, hash, language, bytes)| {
            let content = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
            let chunks = chunk_file(&registry, rel_path, &content, hash, *language);
            (rel_path.clone(), hash.clone(), chunks)
        })
        .collect();

    ctx.cancellation.check()?;

    // Changed files: delete their old chunks before reinserting (spec §4.6
    // "changed -> deleteByFile + chunk + embed + insert"); new files have
    // nothing to delete, a harmless no-op.
    for (rel_path, ..) in &parsed {
        ctx.store.delete_by_file(rel_path)?;
    }

    let pool = bounded_pool(ctx)?;
    let outcomes: Vec<(String, Result<(FileHashEntry, usize)>)> = pool.install(|| {
        parsed
            .into_par_iter()
            .map(|(rel_path, file_hash, mut chunks)| {
                let chunk_ids: Vec<ChunkId> = chunks.iter().map(|c| c.id.clone()).collect();
                let res = embed_and_upsert(ctx, &mut chunks)
                    .map(|n| (FileHashEntry { file_hash, chunk_ids }, n));
                (rel_path, res)
            })
            .collect()
    });

    let mut files_changed = 0usize;
    let mut chunks_total = 0usize;
    let mut errors = 0usize;
    for (rel_path, res) in outcomes {
        match res {
            Ok((entry, n)) => {
                metadata.file_hashes.insert(rel_path, entry);
                chunks_total += n;
                files_changed += 1;
            }
            Err(e) => {
                tracing::warn!(file = %rel_path, error = %e, "embedding failed, file skipped");
                errors += 1;
            }
        }
    }

    metadata.updated_at = Utc::now();
    ctx.store.save_metadata(&metadata)?;

    Ok(IncrementalSummary {
        files: files_changed,
        chunks: chunks_total,
        skipped,
        removed,
        duration_ms: start.elapsed().as_millis() as u64,
        mode: "incremental".to_string(),
        errors,
    })
}

/// Recomputes `fileHashes` only, no chunking or embedding (spec §4.6).
pub fn verify_index(ctx: &Context) -> Result<VerifyReport> {
    let metadata = ctx
        .store
        .load_metadata()?
        .ok_or_else(|| SearchCodeError::NoIndex { root: ctx.root.clone() })?;

    let files: Vec<DiscoveredFile> = discovery::discover(&ctx.root, &discovery_options(ctx))?.collect();
    let current_hashes: HashMap<String, String> = files
        .par_iter()
        .filter_map(|f| {
            let bytes = std::fs::read(&f.abs_path).ok()?;
            Some((rel_path_string(f), file_hash(&bytes)))
        })
        .collect();

    let mut changed = 0usize;
    let mut missing = 0usize;
    for (path, entry) in &metadata.file_hashes {
        match current_hashes.get(path) {
            None => missing += 1,
            Some(h) if h != &entry.file_hash => changed += 1,
            _ => {}
        }
    }

    Ok(VerifyReport {
        indexed: metadata.file_hashes.len(),
        changed,
        missing,
        removed: 0,
    })
}

pub fn stats(ctx: &Context) -> Result<IndexStats> {
    let metadata = ctx
        .store
        .load_metadata()?
        .ok_or_else(|| SearchCodeError::NoIndex { root: ctx.root.clone() })?;
    let chunk_count = ctx.store.chunk_count()?;
    Ok(IndexStats {
        embed_model_id: metadata.embed_model_id,
        embed_dim: metadata.embed_dim,
        embed_provider: metadata.embed_provider,
        created_at: metadata.created_at,
        updated_at: metadata.updated_at,
        schema_version: metadata.schema_version,
        file_count: metadata.file_hashes.len(),
        chunk_count,
    })
}

pub fn delete_index(ctx: &Context) -> Result<()> {
    let _lock = acquire_lock(ctx)?;
    ctx.store.delete_all()
}
