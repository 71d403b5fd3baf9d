//! Small helpers shared by the non-C# tree-sitter chunkers and the
//! heuristic fallback.

use tree_sitter::Node;

pub fn line_span(node: Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

pub fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source).ok())
        .map(str::to_string)
}

pub fn node_text(node: Node, source: &[u8]) -> Option<String> {
    node.utf8_text(source).ok().map(str::to_string)
}

/// Best-effort name extraction for declarator shapes (chiefly C/C++) where
/// the identifier isn't reachable via a single named field: depth-first
/// search for the first `identifier` descendant.
pub fn first_identifier_text(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() == "identifier" || node.kind() == "field_identifier" {
        return node_text(node, source);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_identifier_text(child, source) {
            return Some(found);
        }
    }
    None
}
