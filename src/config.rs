use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hard safety ceiling: files larger than this are **always** skipped, regardless
/// of config (spec §4.3 edge cases: "files exceeding a per-file byte ceiling").
pub const ABSOLUTE_MAX_FILE_BYTES: u64 = 1_000_000;

/// Controls workspace scanning behavior (spec §4.1 exclusion pipeline).
///
/// `.gitignore` is always respected by discovery; these are additional hard
/// excludes plus the whitelist-negation escape hatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory *names* to skip anywhere in the tree, compared against path
    /// components, not full paths.
    pub exclude_dir_names: Vec<String>,
    /// Extra glob excludes beyond the built-in defaults (stage 3 of discovery).
    pub exclude_globs: Vec<String>,
    /// Whitelist globs that negate any earlier exclusion (stage 4 of discovery).
    pub include_globs: Vec<String>,
    /// Per-file byte ceiling; never exceeds `ABSOLUTE_MAX_FILE_BYTES`.
    pub max_file_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dir_names: vec![],
            exclude_globs: vec![],
            include_globs: vec![],
            max_file_bytes: ABSOLUTE_MAX_FILE_BYTES,
        }
    }
}

/// Chunker tuning (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Languages to restrict indexing to; empty means all registered languages.
    pub languages: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { languages: vec![] }
    }
}

/// Embedding model selection (spec §4.4). `model` is a HuggingFace repo id
/// loaded via `model2vec-rs`, following the teacher's `VectorSearchConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub model: String,
    /// Max number of chunks embedded per batch call.
    pub batch_size: usize,
    /// Max number of in-flight embedding batches (spec §5: bounded concurrency).
    pub max_in_flight: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model: "minishlab/potion-retrieval-32M".to_string(),
            batch_size: 64,
            max_in_flight: 4,
        }
    }
}

/// Search defaults (spec §4.8 input defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub default_max_per_file: usize,
    pub default_max_per_symbol: usize,
    pub default_min_score: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            default_max_per_file: 1,
            default_max_per_symbol: 1,
            default_min_score: 0.0,
        }
    }
}

/// One data-driven acceptable-duplicate rule (spec §9 Open Question decision:
/// "expose it as data, not code"). `pattern` is matched against the
/// identifier-normalized chunk content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptablePattern {
    pub name: String,
    pub description: String,
    pub pattern: String,
}

fn default_acceptable_patterns() -> Vec<AcceptablePattern> {
    vec![
        AcceptablePattern {
            name: "trivial-accessor".to_string(),
            description: "single-statement getter/setter returning a field".to_string(),
            pattern: r"^\s*return\s+(this|self)\.\w+;?\s*$".to_string(),
        },
        AcceptablePattern {
            name: "empty-body".to_string(),
            description: "empty or pass-only body".to_string(),
            pattern: r"^\s*(pass)?\s*$".to_string(),
        },
        AcceptablePattern {
            name: "not-implemented".to_string(),
            description: "single throw/raise NotImplementedError body".to_string(),
            pattern: r"^\s*(throw|raise)\s+.*NotImplementedError.*$".to_string(),
        },
        AcceptablePattern {
            name: "boolean-guard".to_string(),
            description: "single-line boolean guard clause".to_string(),
            pattern: r"^\s*if\s*\(?\s*!\s*\w+\s*\)?\s*(return|continue|break);?\s*$".to_string(),
        },
    ]
}

/// Duplicate-detector defaults (spec §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicatesConfig {
    pub min_lines: usize,
    pub min_complexity: u32,
    pub normalize_identifiers: bool,
    pub rank_by_impact: bool,
    pub threshold_exact: f32,
    pub threshold_high: f32,
    pub threshold_medium: f32,
    pub threshold_low: f32,
    pub ignore_acceptable_patterns: bool,
    pub acceptable_patterns: Vec<AcceptablePattern>,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            min_lines: 10,
            min_complexity: 0,
            normalize_identifiers: true,
            rank_by_impact: true,
            threshold_exact: 0.98,
            threshold_high: 0.90,
            threshold_medium: 0.85,
            threshold_low: 0.80,
            ignore_acceptable_patterns: true,
            acceptable_patterns: default_acceptable_patterns(),
        }
    }
}

/// Watcher defaults (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self { interval_ms: 60_000 }
    }
}

/// Root configuration, loaded from `.semcode.json` at the repository root
/// (teacher's `load_config` convention, generalized to this crate's fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory (relative to root) holding index metadata + vector store files.
    pub index_dir: PathBuf,
    pub scan: ScanConfig,
    pub chunker: ChunkerConfig,
    pub embedder: EmbedderConfig,
    pub search: SearchConfig,
    pub duplicates: DuplicatesConfig,
    pub watcher: WatcherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(".semcode"),
            scan: ScanConfig::default(),
            chunker: ChunkerConfig::default(),
            embedder: EmbedderConfig::default(),
            search: SearchConfig::default(),
            duplicates: DuplicatesConfig::default(),
            watcher: WatcherConfig::default(),
        }
    }
}

/// Loads `.semcode.json` from `repo_root`, falling back to defaults on any
/// read or parse failure (teacher's `load_config` never hard-fails on a
/// missing or malformed config file).
pub fn load_config(repo_root: &Path) -> Config {
    let primary = repo_root.join(".semcode.json");
    let Ok(text) = std::fs::read_to_string(&primary) else {
        return Config::default();
    };
    serde_json::from_str::<Config>(&text).unwrap_or_else(|_| Config::default())
}
