use tree_sitter::Node;

use super::common::{calculate_complexity, has_adjacent_leading_comment, is_boolean_operator};
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sealed", "short", "sizeof",
    "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true", "try",
    "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual", "void",
    "volatile", "while", "async", "await", "var",
];

const VARIANTS: &[&str] = &["interface", "abstract", "record", "constant"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_each_statement",
    "while_statement",
    "do_statement",
    "catch_clause",
    "switch_section",
    "conditional_expression",
];

pub struct CSharpSupport;

impl LanguageSupport for CSharpSupport {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::language()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "class_declaration" | "struct_declaration" => Some(SymbolType::Class),
            "record_declaration" => Some(SymbolType::Class),
            "interface_declaration" => Some(SymbolType::Type),
            "enum_declaration" => Some(SymbolType::Enum),
            "method_declaration" | "constructor_declaration" => Some(SymbolType::Method),
            "property_declaration" | "field_declaration" => Some(SymbolType::Variable),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = symbol_name(node, source);
        let modifiers_text: String = node
            .children(&mut node.walk())
            .filter(|c| c.kind() == "modifier")
            .map(|m| crate::language::node_text(source, m).to_string() + " ")
            .collect();

        let variant = match node.kind() {
            "interface_declaration" => Some("interface".to_string()),
            "record_declaration" => Some("record".to_string()),
            _ if modifiers_text.contains("abstract") => Some("abstract".to_string()),
            "field_declaration" if modifiers_text.contains("const") => Some("constant".to_string()),
            _ => None,
        };

        ExtractedMetadata {
            symbol_name: name,
            variant,
            modifiers: ChunkModifiers {
                is_exported: self.is_exported(node, source),
                is_async: modifiers_text.contains("async"),
                is_static: modifiers_text.contains("static"),
                is_abstract: modifiers_text.contains("abstract"),
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
        node.children(&mut node.walk())
            .any(|c| c.kind() == "modifier" && crate::language::node_text(source, c) == "public")
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        node.children(&mut node.walk())
            .filter(|c| c.kind() == "attribute_list")
            .map(|c| crate::language::node_text(source, c).to_string())
            .collect()
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["using_directive"]
    }
}
