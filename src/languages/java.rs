use tree_sitter::Node;

use super::common::{calculate_complexity, has_adjacent_leading_comment, is_boolean_operator};
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while",
];

const VARIANTS: &[&str] = &["interface", "abstract", "constant"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "enhanced_for_statement",
    "while_statement",
    "do_statement",
    "catch_clause",
    "switch_label",
    "ternary_expression",
];

pub struct JavaSupport;

impl LanguageSupport for JavaSupport {
    fn language(&self) -> Language {
        Language::Java
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_java::language()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "class_declaration" => Some(SymbolType::Class),
            "interface_declaration" => Some(SymbolType::Type),
            "enum_declaration" => Some(SymbolType::Enum),
            "method_declaration" | "constructor_declaration" => Some(SymbolType::Method),
            "field_declaration" => Some(SymbolType::Variable),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = symbol_name(node, source).or_else(|| {
            node.children(&mut node.walk())
                .find(|c| c.kind() == "identifier")
                .map(|n| crate::language::node_text(source, n).to_string())
        });
        let modifiers_text = node
            .children(&mut node.walk())
            .find(|c| c.kind() == "modifiers")
            .map(|m| crate::language::node_text(source, m).to_string())
            .unwrap_or_default();

        let variant = if node.kind() == "interface_declaration" {
            Some("interface".to_string())
        } else if modifiers_text.contains("abstract") {
            Some("abstract".to_string())
        } else if modifiers_text.contains("final") && node.kind() == "field_declaration" {
            Some("constant".to_string())
        } else {
            None
        };

        ExtractedMetadata {
            symbol_name: name,
            variant,
            modifiers: ChunkModifiers {
                is_exported: self.is_exported(node, source),
                is_async: false,
                is_static: modifiers_text.contains("static"),
                is_abstract: modifiers_text.contains("abstract"),
            },
            has_documentation: has_adjacent_leading_comment(node, &["block_comment", "line_comment"]),
        }
    }

    fn calculate_complexity(&self, node: Node, source: &[u8]) -> u32 {
        calculate_complexity(node, &|n| {
            DECISION_KINDS.contains(&n.kind())
                || (n.kind() == "binary_expression" && is_boolean_operator(n, source))
        })
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        node.children(&mut node.walk())
            .find(|c| c.kind() == "modifiers")
            .map(|m| crate::language::node_text(source, m).contains("public"))
            .unwrap_or(false)
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let Some(modifiers) = node.children(&mut node.walk()).find(|c| c.kind() == "modifiers") else {
            return vec![];
        };
        modifiers
            .children(&mut modifiers.walk())
            .filter(|c| c.kind() == "annotation" || c.kind() == "marker_annotation")
            .map(|c| crate::language::node_text(source, c).to_string())
            .collect()
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["import_declaration"]
    }
}
