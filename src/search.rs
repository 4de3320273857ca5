//! SearchPipeline: vector search + filters + regex post-filter + rerank +
//! dedup (spec §4.8).

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::chunk::{Language, SymbolType};
use crate::context::Context;
use crate::embedder::RerankCandidate;
use crate::error::{Result, SearchCodeError};
use crate::filter::{Filter, FilterOperator, FilterValue, LeafPredicate};
use crate::vector_store::ScoredChunk;

/// Recognized query parameters, with spec-mandated defaults (spec §4.8).
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub limit: usize,
    pub pattern: Option<String>,
    pub include: Option<String>,
    pub symbol_type: Option<SymbolType>,
    pub variant: Option<String>,
    pub decorator: Option<String>,
    pub language: Option<Language>,
    pub is_exported: Option<bool>,
    pub is_async: Option<bool>,
    pub is_static: Option<bool>,
    pub is_abstract: Option<bool>,
    pub min_complexity: Option<u32>,
    pub max_complexity: Option<u32>,
    pub has_documentation: Option<bool>,
    pub parent_scope: Option<String>,
    pub imports: Option<String>,
    pub symbol_name: Option<String>,
    pub min_score: f32,
    pub max_per_file: usize,
    pub max_per_symbol: usize,
    pub rerank: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: 20,
            pattern: None,
            include: None,
            symbol_type: None,
            variant: None,
            decorator: None,
            language: None,
            is_exported: None,
            is_async: None,
            is_static: None,
            is_abstract: None,
            min_complexity: None,
            max_complexity: None,
            has_documentation: None,
            parent_scope: None,
            imports: None,
            symbol_name: None,
            min_score: 0.0,
            max_per_file: 1,
            max_per_symbol: 1,
            rerank: false,
        }
    }
}

/// One formatted result (spec §4.8 output).
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub symbol_name: Option<String>,
    pub symbol_type: SymbolType,
    pub complexity: u32,
    pub parent_scope: Option<String>,
    pub is_exported: bool,
    pub content: String,
    pub semantic_score: f32,
    pub rerank_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutput {
    pub results: Vec<SearchResult>,
    pub matches: usize,
    pub indexed: usize,
}

/// Render a result's content truncated to at most `max_lines` lines, for
/// display purposes only (spec §4.8 "content (possibly truncated to N lines
/// for rendering)").
fn truncate_content(content: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= max_lines {
        content.to_string()
    } else {
        let mut out = lines[..max_lines].join("\n");
        out.push_str("\n...");
        out
    }
}

const RENDER_MAX_LINES: usize = 60;

fn leaf(key: &str, operator: FilterOperator, value: FilterValue) -> Filter {
    Filter::Leaf(LeafPredicate {
        key: key.to_string(),
        operator,
        value,
    })
}

/// Translates structural filter parameters into the VectorStore filter
/// grammar, combined with AND (spec §4.8 step 2).
fn build_filter(params: &SearchParams) -> Option<Filter> {
    let mut leaves = Vec::new();
    if let Some(t) = params.symbol_type {
        leaves.push(leaf("symbolType", FilterOperator::Equals, FilterValue::Str(t.as_str().to_string())));
    }
    if let Some(v) = &params.variant {
        leaves.push(leaf("variant", FilterOperator::Equals, FilterValue::Str(v.clone())));
    }
    if let Some(d) = &params.decorator {
        leaves.push(leaf("decorator", FilterOperator::Equals, FilterValue::Str(d.clone())));
    }
    if let Some(l) = params.language {
        leaves.push(leaf("language", FilterOperator::Equals, FilterValue::Str(l.as_str().to_string())));
    }
    if let Some(b) = params.is_exported {
        leaves.push(leaf("isExported", FilterOperator::Equals, FilterValue::Bool(b)));
    }
    if let Some(b) = params.is_async {
        leaves.push(leaf("isAsync", FilterOperator::Equals, FilterValue::Bool(b)));
    }
    if let Some(b) = params.is_static {
        leaves.push(leaf("isStatic", FilterOperator::Equals, FilterValue::Bool(b)));
    }
    if let Some(b) = params.is_abstract {
        leaves.push(leaf("isAbstract", FilterOperator::Equals, FilterValue::Bool(b)));
    }
    if let Some(n) = params.min_complexity {
        leaves.push(leaf("complexity", FilterOperator::GreaterOrEqual, FilterValue::Number(n as f64)));
    }
    if let Some(n) = params.max_complexity {
        leaves.push(leaf("complexity", FilterOperator::LessOrEqual, FilterValue::Number(n as f64)));
    }
    if let Some(b) = params.has_documentation {
        leaves.push(leaf("hasDocumentation", FilterOperator::Equals, FilterValue::Bool(b)));
    }
    if let Some(s) = &params.parent_scope {
        leaves.push(leaf("parentScope", FilterOperator::Equals, FilterValue::Str(s.clone())));
    }
    if let Some(s) = &params.imports {
        leaves.push(leaf("imports", FilterOperator::Equals, FilterValue::Str(s.clone())));
    }
    if let Some(s) = &params.symbol_name {
        leaves.push(leaf("symbolName", FilterOperator::Equals, FilterValue::Str(s.clone())));
    }
    crate::filter::and(leaves)
}

fn glob_matches(pattern: &str, file: &str) -> Result<bool> {
    let compiled = glob::Pattern::new(pattern)
        .map_err(|e| SearchCodeError::InvalidInput(format!("invalid include glob `{pattern}`: {e}")))?;
    Ok(compiled.matches(file))
}

/// Scopes the regex sweep to exactly the files the semantic search already
/// returned (spec §4.8 step 5: "never a global regex sweep").
fn pattern_matching_lines(root: &std::path::Path, file: &str, regex: &Regex) -> HashSet<u32> {
    let Ok(text) = std::fs::read_to_string(root.join(file)) else {
        return HashSet::new();
    };
    text.lines()
        .enumerate()
        .filter(|(_, line)| regex.is_match(line))
        .map(|(i, _)| (i + 1) as u32)
        .collect()
}

/// The ten-step hybrid retrieval pipeline (spec §4.8).
pub fn search(ctx: &Context, params: &SearchParams) -> Result<SearchOutput> {
    if params.query.trim().is_empty() {
        return Err(SearchCodeError::InvalidInput("query must not be empty".to_string()));
    }

    let metadata = ctx
        .store
        .load_metadata()?
        .ok_or_else(|| SearchCodeError::NoIndex { root: ctx.root.clone() })?;

    if metadata.schema_version != crate::chunk::SCHEMA_VERSION {
        return Err(SearchCodeError::SchemaMismatch {
            found: metadata.schema_version,
            expected: crate::chunk::SCHEMA_VERSION,
        });
    }

    if ctx.embedder.model_id() != metadata.embed_model_id || ctx.embedder.dim() != metadata.embed_dim {
        return Err(SearchCodeError::ModelMismatch {
            indexed: metadata.embed_model_id,
            indexed_dim: metadata.embed_dim,
            current: ctx.embedder.model_id().to_string(),
            current_dim: ctx.embedder.dim(),
        });
    }

    ctx.cancellation.check()?;

    let structural_filter = build_filter(params);
    let limit = params.limit.max(1);
    let k = limit * if params.pattern.is_some() { 3 } else { 2 };

    let query_vector = ctx.embedder.embed(std::slice::from_ref(&params.query))?
        .into_iter()
        .next()
        .unwrap_or_default();

    ctx.cancellation.check()?;

    let mut candidates: Vec<ScoredChunk> = ctx.store.search(&query_vector, k, structural_filter.as_ref())?;

    if let Some(include) = &params.include {
        let mut kept = Vec::with_capacity(candidates.len());
        for c in candidates {
            if glob_matches(include, &c.chunk.file)? {
                kept.push(c);
            }
        }
        candidates = kept;
    }

    ctx.cancellation.check()?;

    if let Some(pattern) = &params.pattern {
        let regex = Regex::new(pattern)
            .map_err(|e| SearchCodeError::InvalidInput(format!("invalid regex `{pattern}`: {e}")))?;
        let mut line_cache: HashMap<String, HashSet<u32>> = HashMap::new();
        candidates.retain(|c| {
            let lines = line_cache
                .entry(c.chunk.file.clone())
                .or_insert_with(|| pattern_matching_lines(&ctx.root, &c.chunk.file, &regex));
            (c.chunk.start_line..=c.chunk.end_line).any(|l| lines.contains(&l))
        });
    }

    ctx.cancellation.check()?;

    let mut scored: Vec<(ScoredChunk, f32, Option<f32>)> = candidates
        .into_iter()
        .map(|c| {
            let sim = (1.0 - c.distance).clamp(0.0, 1.0);
            (c, sim, None)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if params.rerank && ctx.embedder.supports_rerank() && !scored.is_empty() {
        let window = params.limit.max(20).min(100).min(scored.len());
        let rerank_candidates: Vec<RerankCandidate> = scored[..window]
            .iter()
            .map(|(c, ..)| RerankCandidate {
                id: c.chunk.id.as_str().to_string(),
                text: c.chunk.content.clone(),
            })
            .collect();
        let rerank_scores = ctx.embedder.rerank(&params.query, &rerank_candidates)?;
        let mut head: Vec<(ScoredChunk, f32, Option<f32>)> = scored
            .drain(..window)
            .zip(rerank_scores)
            .map(|((c, sim, _), score)| (c, sim, Some(score)))
            .collect();
        head.sort_by(|a, b| b.2.unwrap_or(0.0).partial_cmp(&a.2.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal));
        head.extend(scored);
        scored = head;
    }

    ctx.cancellation.check()?;

    scored.retain(|(_, sim, _)| *sim >= params.min_score);

    let max_per_file = params.max_per_file.max(1);
    let max_per_symbol = params.max_per_symbol.max(1);
    let mut per_file: HashMap<String, usize> = HashMap::new();
    let mut per_symbol: HashMap<String, usize> = HashMap::new();
    let mut deduped = Vec::new();
    for (scored_chunk, sim, rerank_score) in scored {
        let file_count = per_file.get(&scored_chunk.chunk.file).copied().unwrap_or(0);
        let symbol_key = scored_chunk
            .chunk
            .symbol_name
            .clone()
            .unwrap_or_else(|| scored_chunk.chunk.id.as_str().to_string());
        let symbol_count = per_symbol.get(&symbol_key).copied().unwrap_or(0);
        if file_count >= max_per_file || symbol_count >= max_per_symbol {
            continue;
        }
        per_file.insert(scored_chunk.chunk.file.clone(), file_count + 1);
        per_symbol.insert(symbol_key, symbol_count + 1);
        deduped.push((scored_chunk, sim, rerank_score));
        if deduped.len() >= limit {
            break;
        }
    }

    let results: Vec<SearchResult> = deduped
        .into_iter()
        .map(|(c, sim, rerank_score)| SearchResult {
            file: c.chunk.file,
            start_line: c.chunk.start_line,
            end_line: c.chunk.end_line,
            symbol_name: c.chunk.symbol_name,
            symbol_type: c.chunk.symbol_type,
            complexity: c.chunk.complexity,
            parent_scope: c.chunk.parent_scope,
            is_exported: c.chunk.modifiers.is_exported,
            content: truncate_content(&c.chunk.content, RENDER_MAX_LINES),
            semantic_score: sim,
            rerank_score,
        })
        .collect();

    Ok(SearchOutput {
        matches: results.len(),
        indexed: ctx.store.chunk_count()?,
        results,
    })
}
