use tree_sitter::Node;

use super::common::{calculate_complexity, collect_leading_siblings, has_adjacent_leading_comment, is_boolean_operator};
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "async", "await", "dyn",
];

const VARIANTS: &[&str] = &["trait", "impl", "constant", "async"];

const DECISION_KINDS: &[&str] = &[
    "if_expression",
    "if_let_expression",
    "while_expression",
    "while_let_expression",
    "loop_expression",
    "for_expression",
    "match_arm",
];

pub struct RustSupport;

impl LanguageSupport for RustSupport {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_rust::language()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "function_item" => {
                let in_impl_or_trait = node
                    .parent()
                    .and_then(|p| p.parent())
                    .map(|p| p.kind() == "impl_item" || p.kind() == "trait_item")
                    .unwrap_or(false);
                if in_impl_or_trait {
                    Some(SymbolType::Method)
                } else {
                    Some(SymbolType::Function)
                }
            }
            "struct_item" | "impl_item" => Some(SymbolType::Class),
            "trait_item" => Some(SymbolType::Class),
            "enum_item" => Some(SymbolType::Enum),
            "type_item" => Some(SymbolType::Type),
            "const_item" | "static_item" => Some(SymbolType::Variable),
            "mod_item" => Some(SymbolType::Module),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = match node.kind() {
            "impl_item" => node
                .child_by_field_name("type")
                .map(|n| super::super::language::node_text(source, n).to_string()),
            _ => symbol_name(node, source),
        };

        let is_exported = self.is_exported(node, source);
        let is_async = node
            .children(&mut node.walk())
            .any(|c| c.kind() == "async" || c.kind() == "function_modifiers");
        let parent_is_trait = node.kind() == "function_item"
            && node
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.kind() == "trait_item")
                .unwrap_or(false);

        let variant = match node.kind() {
            "trait_item" => Some("trait".to_string()),
            "impl_item" => Some("impl".to_string()),
            "const_item" | "static_item" => Some("constant".to_string()),
            "function_item" if is_async => Some("async".to_string()),
            _ if parent_is_trait => Some("trait".to_string()),
            _ => None,
        };

        ExtractedMetadata {
            symbol_name: name,
            variant,
            modifiers: ChunkModifiers {
                is_exported,
                is_async,
                is_static: node.kind() == "static_item",
                is_abstract: false,
            },
            has_documentation: has_adjacent_leading_comment(node, &["line_comment", "block_comment"]),
        }
    }

    fn calculate_complexity(&self, node: Node, source: &[u8]) -> u32 {
        calculate_complexity(node, &|n| {
            DECISION_KINDS.contains(&n.kind()) || (n.kind() == "binary_expression" && is_boolean_operator(n, source))
        })
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        node.children(&mut node.walk()).any(|c| {
            c.kind() == "visibility_modifier"
                && super::super::language::node_text(source, c).starts_with("pub")
        })
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        collect_leading_siblings(node, source, "attribute_item")
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["use_declaration"]
    }
}
