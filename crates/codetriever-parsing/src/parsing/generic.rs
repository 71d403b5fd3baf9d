//! Best-effort chunking for languages with a registered tree-sitter grammar
//! but no C#-shaped declaration taxonomy. Each language maps its own
//! declarations onto the closest [`ChunkKind`] (Rust `struct_item` ->
//! `Struct`, Python `class_definition` -> `Class`, etc.) per SPEC_FULL.md
//! §4.1. Qualification only nests one level deep (type -> member); modifier
//! and dependency extraction are intentionally simpler than the C# parser.

use std::collections::{BTreeMap, HashSet};

use tree_sitter::{Node, Parser};

use crate::error::{ParsingError, ParsingResult};
use crate::parsing::languages::get_language_config;
use crate::parsing::util::{field_text, first_identifier_text, line_span, node_text};
use crate::parsing::{ChunkKind, CodeChunk};

pub fn parse(language_id: &str, file_path: &str, content: &str) -> ParsingResult<Vec<CodeChunk>> {
    let config = get_language_config(language_id)
        .ok_or_else(|| ParsingError::LanguageUnsupported(language_id.to_string()))?;
    let language = config
        .tree_sitter_language
        .clone()
        .ok_or_else(|| ParsingError::LanguageUnsupported(language_id.to_string()))?;

    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParsingError::tree_sitter_error(e.to_string()))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| ParsingError::parse_error(format!("no tree produced for {file_path}")))?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::warn!(file_path, language_id, "syntax errors; extracting partial chunks");
    }

    let source = content.as_bytes();
    let dependencies = collect_dependencies(language_id, root, source);

    let mut chunks = Vec::new();
    match language_id {
        "rust" => rust_chunks(root, source, file_path, &dependencies, &mut chunks),
        "python" => python_chunks(root, source, file_path, &dependencies, &mut chunks),
        "javascript" | "typescript" | "tsx" => {
            js_like_chunks(root, source, file_path, &dependencies, &mut chunks);
        }
        "go" => go_chunks(root, source, file_path, &dependencies, &mut chunks),
        "java" => java_chunks(root, source, file_path, &dependencies, &mut chunks),
        "c" => c_chunks(root, source, file_path, &dependencies, &mut chunks),
        "cpp" => cpp_chunks(root, source, file_path, &dependencies, &mut chunks),
        _ => {}
    }
    Ok(chunks)
}

fn push_type(
    chunks: &mut Vec<CodeChunk>,
    kind: ChunkKind,
    name: &str,
    node: Node,
    source: &[u8],
    file_path: &str,
    dependencies: &[String],
) {
    let Some(content) = node_text(node, source) else { return };
    let (start_line, end_line) = line_span(node);
    chunks.push(CodeChunk::new(
        kind,
        name,
        None,
        None,
        file_path,
        start_line,
        end_line,
        content,
        dependencies.to_vec(),
        String::new(),
        BTreeMap::new(),
    ));
}

#[allow(clippy::too_many_arguments)]
fn push_member(
    chunks: &mut Vec<CodeChunk>,
    kind: ChunkKind,
    parent: &str,
    member: &str,
    node: Node,
    source: &[u8],
    file_path: &str,
    dependencies: &[String],
) {
    let Some(content) = node_text(node, source) else { return };
    let (start_line, end_line) = line_span(node);
    chunks.push(CodeChunk::new(
        kind,
        format!("{parent}.{member}"),
        Some(parent.to_string()),
        None,
        file_path,
        start_line,
        end_line,
        content,
        dependencies.to_vec(),
        String::new(),
        BTreeMap::new(),
    ));
}

fn collect_dependencies(language_id: &str, root: Node, source: &[u8]) -> Vec<String> {
    let import_kinds: &[&str] = match language_id {
        "rust" => &["use_declaration"],
        "python" => &["import_statement", "import_from_statement"],
        "javascript" | "typescript" | "tsx" => &["import_statement"],
        "go" => &["import_spec"],
        "java" => &["import_declaration"],
        "c" | "cpp" => &["preproc_include"],
        _ => &[],
    };
    if import_kinds.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if import_kinds.contains(&child.kind()) {
            if let Some(text) = node_text(child, source) {
                let text = text.trim().to_string();
                if seen.insert(text.clone()) {
                    out.push(text);
                }
            }
        }
    }
    out
}

fn rust_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "struct_item" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Struct, &name, child, source, file_path, deps);
                }
            }
            "enum_item" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Enum, &name, child, source, file_path, deps);
                }
            }
            "trait_item" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Interface, &name, child, source, file_path, deps);
                }
            }
            "function_item" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                }
            }
            "impl_item" => {
                if let Some(type_name) = field_text(child, "type", source) {
                    if let Some(body) = child.child_by_field_name("body") {
                        let mut body_cursor = body.walk();
                        for member in body.children(&mut body_cursor) {
                            if member.kind() == "function_item" {
                                if let Some(name) = field_text(member, "name", source) {
                                    push_member(
                                        chunks, ChunkKind::Method, &type_name, &name, member, source,
                                        file_path, deps,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            "mod_item" => {
                if let Some(body) = child.child_by_field_name("body") {
                    rust_chunks(body, source, file_path, deps, chunks);
                }
            }
            _ => {}
        }
    }
}

fn python_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_definition" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Class, &name, child, source, file_path, deps);
                    if let Some(body) = child.child_by_field_name("body") {
                        let mut body_cursor = body.walk();
                        for member in body.children(&mut body_cursor) {
                            if member.kind() == "function_definition" {
                                if let Some(mname) = field_text(member, "name", source) {
                                    push_member(
                                        chunks, ChunkKind::Method, &name, &mname, member, source,
                                        file_path, deps,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            "function_definition" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                }
            }
            _ => {}
        }
    }
}

fn js_like_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_declaration" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Class, &name, child, source, file_path, deps);
                    if let Some(body) = child.child_by_field_name("body") {
                        let mut body_cursor = body.walk();
                        for member in body.children(&mut body_cursor) {
                            if member.kind() == "method_definition" {
                                if let Some(mname) = field_text(member, "name", source) {
                                    push_member(
                                        chunks, ChunkKind::Method, &name, &mname, member, source,
                                        file_path, deps,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            "interface_declaration" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Interface, &name, child, source, file_path, deps);
                }
            }
            "function_declaration" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                }
            }
            _ => {}
        }
    }
}

fn go_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                }
            }
            "method_declaration" => {
                let receiver = child
                    .child_by_field_name("receiver")
                    .and_then(|r| first_identifier_text(r, source));
                if let (Some(recv), Some(name)) = (receiver, field_text(child, "name", source)) {
                    push_member(chunks, ChunkKind::Method, &recv, &name, child, source, file_path, deps);
                } else if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                }
            }
            "type_declaration" => {
                let mut spec_cursor = child.walk();
                for spec in child.children(&mut spec_cursor) {
                    if spec.kind() != "type_spec" {
                        continue;
                    }
                    let Some(name) = field_text(spec, "name", source) else { continue };
                    let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
                        Some("struct_type") => ChunkKind::Struct,
                        Some("interface_type") => ChunkKind::Interface,
                        _ => ChunkKind::Other,
                    };
                    push_type(chunks, kind, &name, child, source, file_path, deps);
                }
            }
            _ => {}
        }
    }
}

fn java_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "enum_declaration" => {
                let kind = if child.kind() == "enum_declaration" { ChunkKind::Enum } else { ChunkKind::Class };
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, kind, &name, child, source, file_path, deps);
                    if let Some(body) = child.child_by_field_name("body") {
                        let mut body_cursor = body.walk();
                        for member in body.children(&mut body_cursor) {
                            if member.kind() == "method_declaration" {
                                if let Some(mname) = field_text(member, "name", source) {
                                    push_member(
                                        chunks, ChunkKind::Method, &name, &mname, member, source,
                                        file_path, deps,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            "interface_declaration" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Interface, &name, child, source, file_path, deps);
                }
            }
            _ => {}
        }
    }
}

fn c_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "struct_specifier" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Struct, &name, child, source, file_path, deps);
                }
            }
            "function_definition" => {
                if let Some(declarator) = child.child_by_field_name("declarator") {
                    if let Some(name) = first_identifier_text(declarator, source) {
                        push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                    }
                }
            }
            _ => {}
        }
    }
}

fn cpp_chunks(root: Node, source: &[u8], file_path: &str, deps: &[String], chunks: &mut Vec<CodeChunk>) {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "class_specifier" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Class, &name, child, source, file_path, deps);
                }
            }
            "struct_specifier" => {
                if let Some(name) = field_text(child, "name", source) {
                    push_type(chunks, ChunkKind::Struct, &name, child, source, file_path, deps);
                }
            }
            "function_definition" => {
                if let Some(declarator) = child.child_by_field_name("declarator") {
                    if let Some(name) = first_identifier_text(declarator, source) {
                        push_type(chunks, ChunkKind::Method, &name, child, source, file_path, deps);
                    }
                }
            }
            "namespace_definition" => {
                if let Some(body) = child.child_by_field_name("body") {
                    cpp_chunks(body, source, file_path, deps, chunks);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_struct_and_impl_method() {
        let src = "struct Foo { x: i32 }\nimpl Foo { fn bar(&self) {} }\n";
        let chunks = parse("rust", "a.rs", src).expect("parses");
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Struct && c.qualified_name == "Foo"));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Method && c.qualified_name == "Foo.bar"));
    }

    #[test]
    fn python_class_and_method() {
        let src = "class Foo:\n    def bar(self):\n        pass\n";
        let chunks = parse("python", "a.py", src).expect("parses");
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Class && c.qualified_name == "Foo"));
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Method && c.qualified_name == "Foo.bar"));
    }

    #[test]
    fn go_method_qualified_by_receiver() {
        let src = "package main\n\ntype T struct{}\n\nfunc (t T) M() {}\n";
        let chunks = parse("go", "a.go", src).expect("parses");
        assert!(chunks.iter().any(|c| c.qualified_name == "T.M"));
    }

    #[test]
    fn unsupported_language_errors() {
        let err = parse("cobol", "a.cob", "IDENTIFICATION DIVISION.").unwrap_err();
        assert!(matches!(err, ParsingError::LanguageUnsupported(_)));
    }
}
