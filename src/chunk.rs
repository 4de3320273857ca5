//! Core data model: `Chunk`, `SymbolType`, `Language`, `IndexMetadata` (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One of the enumerated supported languages (spec §4.2, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Java,
    CSharp,
    Php,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Language::Rust),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            "tsx" => Some(Language::TypeScript),
            "js" | "mjs" | "cjs" | "jsx" => Some(Language::JavaScript),
            "py" | "pyi" | "pyw" => Some(Language::Python),
            "go" => Some(Language::Go),
            "java" => Some(Language::Java),
            "cs" => Some(Language::CSharp),
            "php" => Some(Language::Php),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Php => "php",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::Rust,
            Language::TypeScript,
            Language::JavaScript,
            Language::Python,
            Language::Go,
            Language::Java,
            Language::CSharp,
            Language::Php,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the enumerated symbol types (spec §3, §6 "bit-exact" filter vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    Function,
    Class,
    Method,
    Type,
    Variable,
    Enum,
    Module,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Function => "function",
            SymbolType::Class => "class",
            SymbolType::Method => "method",
            SymbolType::Type => "type",
            SymbolType::Variable => "variable",
            SymbolType::Enum => "enum",
            SymbolType::Module => "module",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "function" => Some(SymbolType::Function),
            "class" => Some(SymbolType::Class),
            "method" => Some(SymbolType::Method),
            "type" => Some(SymbolType::Type),
            "variable" => Some(SymbolType::Variable),
            "enum" => Some(SymbolType::Enum),
            "module" => Some(SymbolType::Module),
            _ => None,
        }
    }
}

impl std::fmt::Display for SymbolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable identifier: `<relativeFile>#<startLine>-<endLine>#<symbolName?>` (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub String);

impl ChunkId {
    pub fn new(file: &str, start_line: u32, end_line: u32, symbol_name: Option<&str>) -> Self {
        let base = format!("{file}#{start_line}-{end_line}");
        match symbol_name {
            Some(name) if !name.is_empty() => ChunkId(format!("{base}#{name}")),
            _ => ChunkId(base),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boolean modifier bundle (spec §3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkModifiers {
    #[serde(default)]
    pub is_exported: bool,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_abstract: bool,
}

/// The atomic unit stored and retrieved (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Repository-relative path, forward-slash form.
    pub file: String,
    /// 1-based inclusive line range.
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub content_hash: String,
    pub file_hash: String,
    pub language: Language,
    pub symbol_name: Option<String>,
    pub symbol_type: SymbolType,
    pub variant: Option<String>,
    #[serde(flatten)]
    pub modifiers: ChunkModifiers,
    /// Ordered list of decorator names (source-appearance order, may repeat).
    pub decorators: Vec<String>,
    /// Non-negative cyclomatic complexity of the chunk body.
    pub complexity: u32,
    pub has_documentation: bool,
    /// Enclosing class or module name, if any.
    pub parent_scope: Option<String>,
    /// Imports of the enclosing file, denormalized onto every chunk for filtering.
    pub imports: Vec<String>,
    /// Fixed-dimension embedding vector; dimension set by the indexing-time Embedder.
    pub embedding: Vec<f32>,
}

/// Per-file entry in `IndexMetadata.file_hashes` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHashEntry {
    pub file_hash: String,
    pub chunk_ids: Vec<ChunkId>,
}

/// Per-repository singleton (spec §3). `embed_model_id`/`embed_dim`/`embed_provider`
/// are frozen at first write; all later reads use these values (spec invariant 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub embed_model_id: String,
    pub embed_dim: usize,
    pub embed_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u32,
    pub file_hashes: HashMap<String, FileHashEntry>,
}

/// Current on-disk schema version. Bumping this forces a full rebuild on open
/// (spec §6 "Schema version is embedded; incompatible versions trigger a full
/// rebuild.").
pub const SCHEMA_VERSION: u32 = 1;

impl IndexMetadata {
    pub fn new(embed_model_id: String, embed_dim: usize, embed_provider: String) -> Self {
        let now = Utc::now();
        Self {
            embed_model_id,
            embed_dim,
            embed_provider,
            created_at: now,
            updated_at: now,
            schema_version: SCHEMA_VERSION,
            file_hashes: HashMap::new(),
        }
    }
}

/// Deterministic content hash: xxh3 of `\n`-normalized bytes (spec §3 invariant 5,
/// §4.3 "Lines are normalized to `\n` before hashing").
pub fn content_hash(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(normalized.as_bytes()))
}

pub fn file_hash(bytes: &[u8]) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(bytes))
}
