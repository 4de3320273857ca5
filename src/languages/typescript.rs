use tree_sitter::Node;

use super::common::{calculate_complexity, collect_leading_siblings, has_adjacent_leading_comment, is_boolean_operator};
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true",
    "try", "typeof", "var", "void", "while", "with", "yield", "let", "static", "async", "await",
    "interface", "type", "enum", "implements", "private", "protected", "public", "readonly",
];

const VARIANTS: &[&str] = &["interface", "alias", "generator", "arrow", "property", "constant"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "catch_clause",
    "switch_case",
    "ternary_expression",
];

/// TypeScript and JavaScript share the TypeScript grammar's superset parser;
/// `is_tsx` selects the TSX dialect for `.tsx`/`.jsx` files.
pub struct TypeScriptSupport {
    is_typescript: bool,
}

impl TypeScriptSupport {
    pub fn new(is_typescript: bool) -> Self {
        Self { is_typescript }
    }
}

impl LanguageSupport for TypeScriptSupport {
    fn language(&self) -> Language {
        if self.is_typescript {
            Language::TypeScript
        } else {
            Language::JavaScript
        }
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::language_typescript()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "arrow_function" if is_named_assignment(node) => Some(SymbolType::Function),
            "function_declaration" => Some(SymbolType::Function),
            "method_definition" => Some(SymbolType::Method),
            "class_declaration" => Some(SymbolType::Class),
            "interface_declaration" => Some(SymbolType::Type),
            "type_alias_declaration" => Some(SymbolType::Type),
            "enum_declaration" => Some(SymbolType::Enum),
            "lexical_declaration" | "variable_declaration" => Some(SymbolType::Variable),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = match node.kind() {
            "lexical_declaration" | "variable_declaration" => node
                .named_child(0)
                .and_then(|d| d.child_by_field_name("name"))
                .map(|n| crate::language::node_text(source, n).to_string()),
            _ => symbol_name(node, source).or_else(|| {
                node.child_by_field_name("name")
                    .map(|n| crate::language::node_text(source, n).to_string())
            }),
        };

        let is_async = node
            .children(&mut node.walk())
            .any(|c| c.kind() == "async");
        let is_generator = crate::language::node_text(source, node).contains('*')
            && matches!(node.kind(), "function_declaration" | "method_definition");
        let is_static = node.children(&mut node.walk()).any(|c| c.kind() == "static");

        let variant = match node.kind() {
            "interface_declaration" => Some("interface".to_string()),
            "type_alias_declaration" => Some("alias".to_string()),
            "arrow_function" => Some("arrow".to_string()),
            "lexical_declaration" if crate::language::node_text(source, node).starts_with("const") => {
                Some("constant".to_string())
            }
            _ if is_generator => Some("generator".to_string()),
            _ => None,
        };

        ExtractedMetadata {
            symbol_name: name,
            variant,
            modifiers: ChunkModifiers {
                is_exported: self.is_exported(node, source),
                is_async,
                is_static,
                is_abstract: node.children(&mut node.walk()).any(|c| c.kind() == "abstract"),
            },
            has_documentation: has_adjacent_leading_comment(node, &["comment"]),
        }
    }

    fn calculate_complexity(&self, node: Node, source: &[u8]) -> u32 {
        calculate_complexity(node, &|n| {
            DECISION_KINDS.contains(&n.kind())
                || (n.kind() == "binary_expression" && is_boolean_operator(n, source))
        })
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(p) = n.parent() {
                if p.kind() == "export_statement" {
                    return true;
                }
            }
            cur = n.parent();
            if cur.map(|c| c.kind() == "program").unwrap_or(true) {
                break;
            }
        }
        let _ = source;
        false
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        collect_leading_siblings(node, source, "decorator")
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["import_statement"]
    }
}

fn is_named_assignment(node: &Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "variable_declarator")
        .unwrap_or(false)
}
