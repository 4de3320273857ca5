//! Chunker: produces symbol-aligned `Chunk`s from a file's bytes (spec §4.3).

use tree_sitter::Node;

use crate::chunk::{content_hash, Chunk, ChunkId, Language, SymbolType};
use crate::language::{node_text, LanguageRegistry};
use crate::languages::common::parse_tree;

/// Frame of the parent-scope stack walked alongside the AST (Design Notes §9:
/// "chunks reference parentScope by name, never by pointer").
struct ScopeFrame {
    name: Option<String>,
}

/// Given a file's bytes, produces its list of chunks. Parse failures and
/// unsupported languages fall back to a single whole-file `module` chunk
/// rather than aborting indexing (spec §4.3 point 1).
pub fn chunk_file(
    registry: &LanguageRegistry,
    rel_path: &str,
    content: &str,
    file_hash: &str,
    language: Language,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return vec![];
    }

    let Some(support) = registry.for_language(language) else {
        return vec![whole_file_chunk(rel_path, content, file_hash, language)];
    };

    let source = content.as_bytes();
    let Some(tree) = parse_tree(support.ts_language(), source) else {
        tracing::warn!(file = rel_path, "parse failed, falling back to whole-file chunk");
        return vec![whole_file_chunk(rel_path, content, file_hash, language)];
    };

    let root = tree.root_node();
    if root.has_error() && root.child_count() == 0 {
        tracing::warn!(file = rel_path, "empty/unparseable AST, falling back to whole-file chunk");
        return vec![whole_file_chunk(rel_path, content, file_hash, language)];
    }

    let imports = collect_imports(root, source, support.import_node_kinds());
    let source_lines: Vec<&str> = content.lines().collect();

    let mut chunks = Vec::new();
    let mut scopes: Vec<ScopeFrame> = Vec::new();
    walk(
        root,
        source,
        &*support,
        rel_path,
        &source_lines,
        file_hash,
        language,
        &imports,
        &mut scopes,
        &mut chunks,
    );

    if chunks.is_empty() {
        return vec![whole_file_chunk(rel_path, content, file_hash, language)];
    }
    chunks
}

#[allow(clippy::too_many_arguments)]
fn walk(
    node: Node,
    source: &[u8],
    support: &dyn crate::language::LanguageSupport,
    rel_path: &str,
    source_lines: &[&str],
    file_hash: &str,
    language: Language,
    imports: &[String],
    scopes: &mut Vec<ScopeFrame>,
    out: &mut Vec<Chunk>,
) {
    let boundary = support.is_chunk_boundary(&node);
    let mut pushed_scope = false;

    if let Some(symbol_type) = boundary {
        let metadata = support.extract_metadata(node, source);
        let parent_scope = scopes.iter().rev().find_map(|f| f.name.clone());

        let (start_line, end_line, text) = slice_trimmed(node, source_lines);
        if !text.trim().is_empty() {
            let complexity = support.calculate_complexity(node, source);
            let id = ChunkId::new(rel_path, start_line, end_line, metadata.symbol_name.as_deref());

            out.push(Chunk {
                id,
                file: rel_path.to_string(),
                start_line,
                end_line,
                content_hash: content_hash(&text),
                content: text,
                file_hash: file_hash.to_string(),
                language,
                symbol_name: metadata.symbol_name.clone(),
                symbol_type,
                variant: metadata.variant,
                modifiers: metadata.modifiers,
                decorators: support.extract_decorators(node, source),
                complexity,
                has_documentation: metadata.has_documentation,
                parent_scope,
                imports: imports.to_vec(),
                embedding: Vec::new(),
            });
        }

        if matches!(symbol_type, SymbolType::Class | SymbolType::Module) {
            scopes.push(ScopeFrame { name: metadata.symbol_name });
            pushed_scope = true;
        }
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            walk(
                cursor.node(),
                source,
                support,
                rel_path,
                source_lines,
                file_hash,
                language,
                imports,
                scopes,
                out,
            );
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    if pushed_scope {
        scopes.pop();
    }
}

/// Slices `node`'s lines (1-based inclusive) and trims trailing blank lines
/// (spec §4.3 point 3).
fn slice_trimmed(node: Node, source_lines: &[&str]) -> (u32, u32, String) {
    let start_row = node.start_position().row;
    let mut end_row = node.end_position().row;
    while end_row > start_row && source_lines.get(end_row).map(|l| l.trim().is_empty()).unwrap_or(false) {
        end_row -= 1;
    }
    let slice = source_lines
        .get(start_row..=end_row.min(source_lines.len().saturating_sub(1)))
        .unwrap_or(&[]);
    (start_row as u32 + 1, end_row as u32 + 1, slice.join("\n"))
}

fn collect_imports(root: Node, source: &[u8], kinds: &[&str]) -> Vec<String> {
    if kinds.is_empty() {
        return vec![];
    }
    let mut out = Vec::new();
    let mut cursor = root.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if kinds.contains(&child.kind()) {
                out.push(node_text(source, child).trim().to_string());
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn whole_file_chunk(rel_path: &str, content: &str, file_hash: &str, language: Language) -> Chunk {
    let line_count = content.lines().count().max(1) as u32;
    Chunk {
        id: ChunkId::new(rel_path, 1, line_count, None),
        file: rel_path.to_string(),
        start_line: 1,
        end_line: line_count,
        content_hash: content_hash(content),
        content: content.to_string(),
        file_hash: file_hash.to_string(),
        language,
        symbol_name: None,
        symbol_type: SymbolType::Module,
        variant: None,
        modifiers: Default::default(),
        decorators: vec![],
        complexity: 1,
        has_documentation: false,
        parent_scope: None,
        imports: vec![],
        embedding: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_no_chunks() {
        let registry = LanguageRegistry::new();
        let chunks = chunk_file(&registry, "a.rs", "", "deadbeef", Language::Rust);
        assert!(chunks.is_empty());
    }

    #[test]
    fn rust_function_is_a_chunk() {
        let registry = LanguageRegistry::new();
        let src = "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        let chunks = chunk_file(&registry, "math.rs", src, "abc123", Language::Rust);
        assert!(chunks.iter().any(|c| c.symbol_name.as_deref() == Some("add")));
        let add = chunks.iter().find(|c| c.symbol_name.as_deref() == Some("add")).unwrap();
        assert_eq!(add.symbol_type, SymbolType::Function);
        assert!(add.modifiers.is_exported);
    }

    #[test]
    fn class_chunk_spans_its_methods() {
        let registry = LanguageRegistry::new();
        let src = "export class Widget {\n  render() {\n    return 1;\n  }\n}\n";
        let chunks = chunk_file(&registry, "widget.ts", src, "hash1", Language::TypeScript);
        let class = chunks.iter().find(|c| c.symbol_type == SymbolType::Class).unwrap();
        let method = chunks.iter().find(|c| c.symbol_type == SymbolType::Method).unwrap();
        assert!(class.start_line <= method.start_line && class.end_line >= method.end_line);
        assert_eq!(method.parent_scope.as_deref(), Some("Widget"));
    }
}
