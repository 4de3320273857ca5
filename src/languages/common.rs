//! Shared tree-sitter helpers used by every `LanguageSupport` impl.

use tree_sitter::Node;

/// Depth-first count of nodes for which `pred` returns true, plus one for
/// the entry (spec §4.2 `calculateComplexity`).
pub fn calculate_complexity(node: Node, pred: &dyn Fn(Node) -> bool) -> u32 {
    1 + count_matching(node, pred)
}

fn count_matching(node: Node, pred: &dyn Fn(Node) -> bool) -> u32 {
    let mut count = 0u32;
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if pred(child) {
                count += 1;
            }
            count += count_matching(child, pred);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    count
}

/// True if a binary/logical expression node's operator text is `&&`/`||`
/// (the common shape across C-like grammars that expose an `operator`
/// field).
pub fn is_boolean_operator(node: Node, source: &[u8]) -> bool {
    node.child_by_field_name("operator")
        .map(|op| {
            let text = &source[op.start_byte()..op.end_byte()];
            text == b"&&" || text == b"||"
        })
        .unwrap_or(false)
}

/// True when `node` is immediately preceded (no blank line) by a comment
/// node of one of `comment_kinds`, the common shape for doc comments in
/// C-like and Rust grammars.
pub fn has_adjacent_leading_comment(node: Node, comment_kinds: &[&str]) -> bool {
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        if comment_kinds.contains(&s.kind()) {
            return true;
        }
        // Tolerate other decorator/attribute siblings directly above.
        if s.start_position().row + 1 < node.start_position().row {
            return false;
        }
        sib = s.prev_sibling();
    }
    false
}

/// Collects the text of contiguous leading siblings whose kind is `kind`,
/// in source order (spec §4.2 `extractDecorators`).
pub fn collect_leading_siblings<'a>(node: Node, source: &'a [u8], kind: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        if s.kind() == kind {
            out.push(std::str::from_utf8(&source[s.start_byte()..s.end_byte()]).unwrap_or(""));
            sib = s.prev_sibling();
        } else {
            break;
        }
    }
    out.reverse();
    out
}

pub fn parse_tree(language: tree_sitter::Language, source: &[u8]) -> Option<tree_sitter::Tree> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&language).ok()?;
    parser.parse(source, None)
}
