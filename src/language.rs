//! LanguageRegistry and LanguageSupport (spec §4.2).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::Node;

use crate::chunk::{ChunkModifiers, Language, SymbolType};

/// Structural metadata extracted for one candidate chunk node, before the
/// chunker fills in id/content/hash/embedding (spec §3).
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    pub symbol_name: Option<String>,
    pub variant: Option<String>,
    pub modifiers: ChunkModifiers,
    pub has_documentation: bool,
}

/// Per-language capability: parser, chunk-boundary predicate, and structural
/// metadata extraction (spec §4.2). Grounded in the teacher's `LanguageDriver`
/// trait, generalized from skeleton/import extraction to the full contract
/// the spec requires.
pub trait LanguageSupport: Send + Sync {
    fn language(&self) -> Language;
    fn ts_language(&self) -> tree_sitter::Language;
    fn reserved_words(&self) -> &'static [&'static str];
    /// Known `variant` values for this language (capabilities summary).
    fn known_variants(&self) -> &'static [&'static str];

    /// Does this AST node start a standalone chunk? Returns the symbol type
    /// if so.
    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType>;

    /// True for node kinds that should push a parent-scope frame (class-like
    /// or module-like containers) even when they are not chunk boundaries
    /// themselves in every language.
    fn is_scope_container(&self, node: &Node) -> bool {
        self.is_chunk_boundary(node)
            .map(|t| matches!(t, SymbolType::Class | SymbolType::Module))
            .unwrap_or(false)
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata;

    /// Counts decision points: branches, loops, catches, boolean operators,
    /// case labels, plus one for the entry (spec §4.2).
    fn calculate_complexity(&self, node: Node, source: &[u8]) -> u32;

    fn is_exported(&self, node: Node, source: &[u8]) -> bool;

    /// Ordered list of decorator/annotation names, including the idiomatic
    /// prefix (`@`) where applicable.
    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String>;

    /// Top-level AST node kinds that represent an import/use statement, used
    /// to populate `Chunk.imports` (spec §3). Default: none.
    fn import_node_kinds(&self) -> &'static [&'static str] {
        &[]
    }
}

pub fn node_text<'a>(source: &'a [u8], node: Node) -> &'a str {
    std::str::from_utf8(&source[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn child_text_by_field<'a>(node: Node, source: &'a [u8], field: &str) -> Option<&'a str> {
    node.child_by_field_name(field).map(|n| node_text(source, n))
}

pub fn symbol_name(node: Node, source: &[u8]) -> Option<String> {
    child_text_by_field(node, source, "name").map(|s| s.to_string())
}

/// Summary of registered languages, symbol types, variants and decorators,
/// exposed to adapter surfaces for discoverability (spec §4.2 "capabilities
/// summary").
#[derive(Debug, Clone, serde::Serialize)]
pub struct CapabilitiesSummary {
    pub languages: Vec<String>,
    pub symbol_types: Vec<String>,
    pub variants_by_language: HashMap<String, Vec<String>>,
}

/// Maps a file path (by extension) to its `LanguageSupport` (spec §4.2).
pub struct LanguageRegistry {
    by_language: HashMap<Language, Arc<dyn LanguageSupport>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut by_language: HashMap<Language, Arc<dyn LanguageSupport>> = HashMap::new();
        by_language.insert(
            Language::Rust,
            Arc::new(crate::languages::rust::RustSupport) as Arc<dyn LanguageSupport>,
        );
        by_language.insert(
            Language::TypeScript,
            Arc::new(crate::languages::typescript::TypeScriptSupport::new(true)),
        );
        by_language.insert(
            Language::JavaScript,
            Arc::new(crate::languages::typescript::TypeScriptSupport::new(false)),
        );
        by_language.insert(
            Language::Python,
            Arc::new(crate::languages::python::PythonSupport),
        );
        #[cfg(feature = "lang-go")]
        by_language.insert(Language::Go, Arc::new(crate::languages::go::GoSupport));
        #[cfg(feature = "lang-java")]
        by_language.insert(Language::Java, Arc::new(crate::languages::java::JavaSupport));
        #[cfg(feature = "lang-csharp")]
        by_language.insert(
            Language::CSharp,
            Arc::new(crate::languages::csharp::CSharpSupport),
        );
        #[cfg(feature = "lang-php")]
        by_language.insert(Language::Php, Arc::new(crate::languages::php::PhpSupport));

        Self { by_language }
    }

    pub fn for_language(&self, language: Language) -> Option<Arc<dyn LanguageSupport>> {
        self.by_language.get(&language).cloned()
    }

    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn LanguageSupport>> {
        Language::from_path(path).and_then(|lang| self.for_language(lang))
    }

    pub fn supported_languages(&self, restrict: &[String]) -> Vec<Language> {
        let mut langs: Vec<Language> = self.by_language.keys().copied().collect();
        if !restrict.is_empty() {
            langs.retain(|l| restrict.iter().any(|r| r.eq_ignore_ascii_case(l.as_str())));
        }
        langs.sort_by_key(|l| l.as_str());
        langs
    }

    pub fn capabilities(&self) -> CapabilitiesSummary {
        let mut languages: Vec<String> = self.by_language.keys().map(|l| l.as_str().to_string()).collect();
        languages.sort();
        let symbol_types = [
            SymbolType::Function,
            SymbolType::Class,
            SymbolType::Method,
            SymbolType::Type,
            SymbolType::Variable,
            SymbolType::Enum,
            SymbolType::Module,
        ]
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
        let mut variants_by_language = HashMap::new();
        for (lang, support) in &self.by_language {
            variants_by_language.insert(
                lang.as_str().to_string(),
                support.known_variants().iter().map(|s| s.to_string()).collect(),
            );
        }
        CapabilitiesSummary {
            languages,
            symbol_types,
            variants_by_language,
        }
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
