use tree_sitter::Node;

use super::common::calculate_complexity;
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

const VARIANTS: &[&str] = &["interface", "struct", "alias", "constant"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "expression_case",
    "type_case",
    "communication_case",
];

/// Go identifiers are exported iff the first rune is uppercase (spec §4.2,
/// no `export` keyword exists).
fn is_go_exported_ident(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

pub struct GoSupport;

impl LanguageSupport for GoSupport {
    fn language(&self) -> Language {
        Language::Go
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_go::language()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "function_declaration" => Some(SymbolType::Function),
            "method_declaration" => Some(SymbolType::Method),
            "type_spec" => {
                let is_interface = node
                    .child_by_field_name("type")
                    .map(|t| t.kind() == "interface_type")
                    .unwrap_or(false);
                if is_interface {
                    Some(SymbolType::Type)
                } else {
                    Some(SymbolType::Class)
                }
            }
            "const_spec" | "var_spec" => Some(SymbolType::Variable),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = match node.kind() {
            "method_declaration" => node
                .child_by_field_name("name")
                .map(|n| crate::language::node_text(source, n).to_string()),
            _ => symbol_name(node, source),
        };

        let variant = match node.kind() {
            "type_spec" => node
                .child_by_field_name("type")
                .map(|t| match t.kind() {
                    "interface_type" => "interface".to_string(),
                    "struct_type" => "struct".to_string(),
                    _ => "alias".to_string(),
                }),
            "const_spec" => Some("constant".to_string()),
            _ => None,
        };

        ExtractedMetadata {
            symbol_name: name.clone(),
            variant,
            modifiers: ChunkModifiers {
                is_exported: name.map(|n| is_go_exported_ident(&n)).unwrap_or(false),
                is_async: false,
                is_static: false,
                is_abstract: false,
            },
            has_documentation: super::common::has_adjacent_leading_comment(node, &["comment"]),
        }
    }

    fn calculate_complexity(&self, node: Node, source: &[u8]) -> u32 {
        calculate_complexity(node, &|n| {
            DECISION_KINDS.contains(&n.kind())
                || (n.kind() == "binary_expression" && super::common::is_boolean_operator(n, source))
        })
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        symbol_name(node, source)
            .map(|n| is_go_exported_ident(&n))
            .unwrap_or(false)
    }

    fn extract_decorators(&self, _node: Node, _source: &[u8]) -> Vec<String> {
        // Go has no decorator/annotation syntax.
        vec![]
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["import_declaration"]
    }
}
