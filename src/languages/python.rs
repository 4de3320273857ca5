use tree_sitter::Node;

use super::common::calculate_complexity;
use crate::chunk::{ChunkModifiers, Language, SymbolType};
use crate::language::{symbol_name, ExtractedMetadata, LanguageSupport};

const RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield", "self", "cls",
];

const VARIANTS: &[&str] = &["dataclass", "classmethod", "staticmethod", "property", "generator", "async"];

const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "except_clause",
    "conditional_expression",
];

pub struct PythonSupport;

impl LanguageSupport for PythonSupport {
    fn language(&self) -> Language {
        Language::Python
    }

    fn ts_language(&self) -> tree_sitter::Language {
        tree_sitter_python::language()
    }

    fn reserved_words(&self) -> &'static [&'static str] {
        RESERVED
    }

    fn known_variants(&self) -> &'static [&'static str] {
        VARIANTS
    }

    fn is_chunk_boundary(&self, node: &Node) -> Option<SymbolType> {
        match node.kind() {
            "function_definition" => {
                let in_class = node
                    .parent()
                    .and_then(|p| p.parent())
                    .map(|p| p.kind() == "class_definition")
                    .unwrap_or(false);
                if in_class {
                    Some(SymbolType::Method)
                } else {
                    Some(SymbolType::Function)
                }
            }
            "class_definition" => Some(SymbolType::Class),
            _ => None,
        }
    }

    fn extract_metadata(&self, node: Node, source: &[u8]) -> ExtractedMetadata {
        let name = symbol_name(node, source);
        let decorators = self.extract_decorators(node, source);
        let is_async = node.children(&mut node.walk()).any(|c| c.kind() == "async");

        let has_classmethod = decorators.iter().any(|d| d.contains("classmethod"));
        let has_staticmethod = decorators.iter().any(|d| d.contains("staticmethod"));
        let has_property = decorators.iter().any(|d| d.contains("property"));
        let has_dataclass = decorators.iter().any(|d| d.contains("dataclass"));

        let body_text = node
            .child_by_field_name("body")
            .map(|b| crate::language::node_text(source, b))
            .unwrap_or("");
        let is_generator = body_text.contains("yield");

        let variant = if has_dataclass {
            Some("dataclass".to_string())
        } else if has_classmethod {
            Some("classmethod".to_string())
        } else if has_staticmethod {
            Some("staticmethod".to_string())
        } else if has_property {
            Some("property".to_string())
        } else if is_async {
            Some("async".to_string())
        } else if is_generator {
            Some("generator".to_string())
        } else {
            None
        };

        ExtractedMetadata {
            symbol_name: name,
            variant,
            modifiers: ChunkModifiers {
                is_exported: self.is_exported(node, source),
                is_async,
                is_static: has_staticmethod,
                is_abstract: decorators.iter().any(|d| d.contains("abstractmethod")),
            },
            has_documentation: has_leading_docstring(node, source),
        }
    }

    fn calculate_complexity(&self, node: Node, _source: &[u8]) -> u32 {
        calculate_complexity(node, &|n| {
            DECISION_KINDS.contains(&n.kind())
                || (n.kind() == "boolean_operator")
        })
    }

    fn is_exported(&self, node: Node, source: &[u8]) -> bool {
        // Public per convention: no leading underscore. `__all__` membership
        // is a module-level concern the chunker does not have visibility
        // into at the node level, so the name heuristic is authoritative
        // here (spec §4.2: "language-specific, but the contract is binary").
        symbol_name(node, source)
            .map(|n| !n.starts_with('_'))
            .unwrap_or(false)
    }

    fn extract_decorators(&self, node: Node, source: &[u8]) -> Vec<String> {
        let Some(parent) = node.parent() else { return vec![] };
        if parent.kind() != "decorated_definition" {
            return vec![];
        }
        let mut out = Vec::new();
        let mut cursor = parent.walk();
        for child in parent.children(&mut cursor) {
            if child.kind() == "decorator" {
                out.push(crate::language::node_text(source, child).to_string());
            }
        }
        out
    }

    fn import_node_kinds(&self) -> &'static [&'static str] {
        &["import_statement", "import_from_statement"]
    }
}

fn has_leading_docstring(node: Node, _source: &[u8]) -> bool {
    let Some(body) = node.child_by_field_name("body") else { return false };
    let Some(first) = body.named_child(0) else { return false };
    if first.kind() != "expression_statement" {
        return false;
    }
    first
        .named_child(0)
        .map(|s| s.kind() == "string")
        .unwrap_or(false)
}
