use tree_sitter::Node;

use super::common::{calculate_complexity, has_adjacent_leading_comment, is_boolean_operator};
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class", "clone",
    "const", "continue", "declare", "default", "do", "echo", "else", "elseif", "empty",
    "enddeclare", "endfor", "endforeach", "endif", "endswitch", "endwhile", "extends", "final",
    "finally", "fn", "for", "foreach", "function", "global", "goto", "if", "implements",
    "include", "instanceof", "insteadof", "interface", "isset", "list", "match", "namespace",
    "new", "or", "print", "private", "protected", "public", "readonly", "require", "return",
    "static", "switch", "throw", "trait", "try", "unset", "use", "var", "while", "xor", "yield",
];

const VARIANTS: &[&str] = &["interface", "trait", "abstract", "constant"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "else_if_clause",
    "for_statement",
    "foreach_statement",
    "while_statement",
    "do_statement",
    "catch_clause",
    "case_statement",
    "conditional_expression",
];

pub struct PhpSupport;

impl LanguageSupport for PhpSupport {
    fn language(&self) -> Language {
        Language::Php
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_php::LANGUAGE_PHP.into()
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
            "trait_declaration" => Some(SymbolType::Class),
            "enum_declaration" => Some(SymbolType::Enum),
            "function_definition" => Some(SymbolType::Function),
            "method_declaration" => Some(SymbolType::Method),
            "const_declaration" => Some(SymbolType::Variable),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = symbol_name(node, source);
        let modifiers_text: String = node
            .children(&mut node.walk())
            .filter(|c| c.kind() == "visibility_modifier" || c.kind() == "static_modifier" || c.kind() == "abstract_modifier")
            .map(|m| crate::language::node_text(source, m).to_string() + " ")
            .collect();

        let variant = match node.kind() {
            "interface_declaration" => Some("interface".to_string()),
            "trait_declaration" => Some("trait".to_string()),
            "const_declaration" => Some("constant".to_string()),
            _ if modifiers_text.contains("abstract") => Some("abstract".to_string()),
            _ => None,
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
        // Top-level functions/classes have no visibility keyword in PHP and
        // are implicitly public; class members default to public unless
        // marked otherwise.
        !node
            .children(&mut node.walk())
            .any(|c| c.kind() == "visibility_modifier" && crate::language::node_text(source, c) != "public")
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        // PHP 8 attributes: #[Attr] groups precede the declaration.
        super::common::collect_leading_siblings(node, source, "attribute_list")
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["namespace_use_declaration"]
    }
}
