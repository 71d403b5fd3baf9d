//! Primary chunker: a recursive descent over the `tree-sitter-c-sharp` AST.
//!
//! This mirrors the declaration taxonomy the reference system this crate's
//! semantics were distilled from actually parses (namespace/class/interface/
//! struct/record/enum and their members), maintaining a name stack so
//! qualified names nest the way the contract describes.

use std::collections::{BTreeMap, HashSet};

use tree_sitter::{Node, Parser};

use crate::error::{ParsingError, ParsingResult};
use crate::parsing::{ChunkKind, CodeChunk};

/// Closed modifier set, checked in source order. Tree-sitter's C# grammar
/// represents keyword modifiers as anonymous leaf nodes whose `kind()`
/// equals the keyword text itself, so membership here doubles as the node
/// kind to match on.
const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "internal",
    "static",
    "abstract",
    "virtual",
    "override",
    "sealed",
    "readonly",
    "const",
];

/// An open type scope while walking the tree: the type's own qualified name
/// (namespace-qualified only at the top level) and the namespace-free
/// "simple chain" used to qualify its members and nested types.
struct TypeScope {
    qualified_name: String,
    simple_chain: String,
}

/// Parse a C# source file into semantic chunks.
pub fn parse(file_path: &str, content: &str) -> ParsingResult<Vec<CodeChunk>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| ParsingError::tree_sitter_error(e.to_string()))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| ParsingError::parse_error(format!("no tree produced for {file_path}")))?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::warn!(file_path, "c# source has syntax errors; extracting partial chunks");
    }

    let source = content.as_bytes();
    let dependencies = collect_using_directives(root, source);

    let mut chunks = Vec::new();
    walk_members(root, source, file_path, None, None, &dependencies, &mut chunks);
    Ok(chunks)
}

fn collect_using_directives(root: Node, source: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect_using_rec(root, source, &mut out, &mut seen);
    out
}

fn collect_using_rec(node: Node, source: &[u8], out: &mut Vec<String>, seen: &mut HashSet<String>) {
    if node.kind() == "using_directive" {
        if let Some(text) = field_text(node, "name", source) {
            if seen.insert(text.clone()) {
                out.push(text);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_using_rec(child, source, out, seen);
    }
}

/// Walk one scope's direct children — either the compilation unit or a
/// type's `declaration_list` body — dispatching types, nested types, and
/// members. `namespace` is carried by value so a file-scoped `namespace N;`
/// directive can update it for the remaining siblings in this same loop.
fn walk_members(
    node: Node,
    source: &[u8],
    file_path: &str,
    mut namespace: Option<String>,
    scope: Option<&TypeScope>,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "namespace_declaration" => {
                let ns_name = field_text(child, "name", source).unwrap_or_default();
                if let Some(body) = child.child_by_field_name("body") {
                    walk_members(body, source, file_path, Some(ns_name), scope, dependencies, chunks);
                } else {
                    namespace = Some(ns_name);
                }
            }
            "class_declaration" | "interface_declaration" | "struct_declaration" | "record_declaration" => {
                handle_type_decl(child, source, file_path, namespace.as_deref(), scope, dependencies, chunks);
            }
            "enum_declaration" => {
                handle_enum_decl(child, source, file_path, namespace.as_deref(), scope, dependencies, chunks);
            }
            "method_declaration" | "constructor_declaration" | "property_declaration"
            | "event_declaration" | "indexer_declaration" | "field_declaration" | "event_field_declaration" => {
                if let Some(sc) = scope {
                    handle_member(child, source, file_path, namespace.as_deref(), sc, dependencies, chunks);
                }
            }
            _ => {}
        }
    }
}

fn handle_type_decl(
    node: Node,
    source: &[u8],
    file_path: &str,
    namespace: Option<&str>,
    parent_scope: Option<&TypeScope>,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
) {
    let Some(simple) = field_text(node, "name", source) else {
        return;
    };

    let (qualified_name, simple_chain) = match parent_scope {
        Some(parent) => {
            let chain = format!("{}.{simple}", parent.simple_chain);
            (chain.clone(), chain)
        }
        None => {
            let qn = namespace.map_or_else(|| simple.clone(), |ns| format!("{ns}.{simple}"));
            (qn, simple.clone())
        }
    };

    let kind = match node.kind() {
        "class_declaration" => ChunkKind::Class,
        "interface_declaration" => ChunkKind::Interface,
        "struct_declaration" => ChunkKind::Struct,
        "record_declaration" => ChunkKind::Record,
        _ => ChunkKind::Other,
    };

    let Some(content) = node.utf8_text(source).ok().map(str::to_string) else {
        return;
    };

    let mut attrs = BTreeMap::new();
    if let Some(bases) = field_text(node, "bases", source) {
        attrs.insert(
            "bases".to_string(),
            bases.trim_start_matches(':').trim().to_string(),
        );
    }

    let (start_line, end_line) = line_span(node);
    chunks.push(CodeChunk::new(
        kind,
        qualified_name.clone(),
        parent_scope.map(|p| p.qualified_name.clone()),
        namespace.map(ToString::to_string),
        file_path,
        start_line,
        end_line,
        content,
        dependencies.to_vec(),
        collect_modifiers(node, source),
        attrs,
    ));

    if let Some(body) = node.child_by_field_name("body") {
        let scope = TypeScope { qualified_name, simple_chain };
        walk_members(
            body,
            source,
            file_path,
            namespace.map(ToString::to_string),
            Some(&scope),
            dependencies,
            chunks,
        );
    }
}

fn handle_enum_decl(
    node: Node,
    source: &[u8],
    file_path: &str,
    namespace: Option<&str>,
    parent_scope: Option<&TypeScope>,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
) {
    let Some(simple) = field_text(node, "name", source) else {
        return;
    };

    let qualified_name = match parent_scope {
        Some(parent) => format!("{}.{simple}", parent.simple_chain),
        None => namespace.map_or_else(|| simple.clone(), |ns| format!("{ns}.{simple}")),
    };

    let Some(content) = node.utf8_text(source).ok().map(str::to_string) else {
        return;
    };

    let mut attrs = BTreeMap::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut values = Vec::new();
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "enum_member_declaration" {
                if let Some(name) = field_text(member, "name", source) {
                    values.push(name);
                }
            }
        }
        if !values.is_empty() {
            attrs.insert("values".to_string(), values.join(", "));
        }
    }

    let (start_line, end_line) = line_span(node);
    chunks.push(CodeChunk::new(
        ChunkKind::Enum,
        qualified_name,
        parent_scope.map(|p| p.qualified_name.clone()),
        namespace.map(ToString::to_string),
        file_path,
        start_line,
        end_line,
        content,
        dependencies.to_vec(),
        collect_modifiers(node, source),
        attrs,
    ));
}

fn handle_member(
    node: Node,
    source: &[u8],
    file_path: &str,
    namespace: Option<&str>,
    scope: &TypeScope,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
) {
    match node.kind() {
        "field_declaration" => {
            push_field_members(node, source, file_path, namespace, scope, dependencies, chunks, ChunkKind::Field);
        }
        "event_field_declaration" => {
            push_field_members(node, source, file_path, namespace, scope, dependencies, chunks, ChunkKind::Event);
        }
        "constructor_declaration" => {
            push_simple_member(
                node, source, file_path, namespace, scope, dependencies, chunks,
                ChunkKind::Constructor, Some(".ctor".to_string()),
            );
        }
        "indexer_declaration" => {
            push_simple_member(
                node, source, file_path, namespace, scope, dependencies, chunks,
                ChunkKind::Indexer, Some("this[]".to_string()),
            );
        }
        "method_declaration" => {
            push_simple_member(
                node, source, file_path, namespace, scope, dependencies, chunks,
                ChunkKind::Method, field_text(node, "name", source),
            );
        }
        "property_declaration" => {
            push_simple_member(
                node, source, file_path, namespace, scope, dependencies, chunks,
                ChunkKind::Property, field_text(node, "name", source),
            );
        }
        "event_declaration" => {
            push_simple_member(
                node, source, file_path, namespace, scope, dependencies, chunks,
                ChunkKind::Event, field_text(node, "name", source),
            );
        }
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn push_simple_member(
    node: Node,
    source: &[u8],
    file_path: &str,
    namespace: Option<&str>,
    scope: &TypeScope,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
    kind: ChunkKind,
    member_simple: Option<String>,
) {
    let Some(member_simple) = member_simple else {
        return;
    };
    let Some(content) = node.utf8_text(source).ok().map(str::to_string) else {
        return;
    };

    let mut attrs = BTreeMap::new();
    if let Some(params) = field_text(node, "parameters", source) {
        attrs.insert("parameters".to_string(), params);
    }
    if let Some(ty) = field_text(node, "type", source) {
        attrs.insert("type".to_string(), ty);
    }
    if let Some(ty) = field_text(node, "returns", source) {
        attrs.insert("return_type".to_string(), ty);
    }

    let qualified_name = format!("{}.{member_simple}", scope.simple_chain);
    let (start_line, end_line) = line_span(node);
    chunks.push(CodeChunk::new(
        kind,
        qualified_name,
        Some(scope.qualified_name.clone()),
        namespace.map(ToString::to_string),
        file_path,
        start_line,
        end_line,
        content,
        dependencies.to_vec(),
        collect_modifiers(node, source),
        attrs,
    ));
}

#[allow(clippy::too_many_arguments)]
fn push_field_members(
    node: Node,
    source: &[u8],
    file_path: &str,
    namespace: Option<&str>,
    scope: &TypeScope,
    dependencies: &[String],
    chunks: &mut Vec<CodeChunk>,
    kind: ChunkKind,
) {
    let Some(declaration) = node.child_by_field_name("declaration") else {
        return;
    };
    let ty_text = field_text(declaration, "type", source);
    let modifiers = collect_modifiers(node, source);
    let (start_line, end_line) = line_span(node);
    let Some(content) = node.utf8_text(source).ok().map(str::to_string) else {
        return;
    };

    let mut cursor = declaration.walk();
    for child in declaration.children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let Some(simple) = field_text(child, "name", source) else {
            continue;
        };
        let mut attrs = BTreeMap::new();
        if let Some(t) = &ty_text {
            attrs.insert("type".to_string(), t.clone());
        }
        chunks.push(CodeChunk::new(
            kind,
            format!("{}.{simple}", scope.simple_chain),
            Some(scope.qualified_name.clone()),
            namespace.map(ToString::to_string),
            file_path,
            start_line,
            end_line,
            content.clone(),
            dependencies.to_vec(),
            modifiers.clone(),
            attrs,
        ));
    }
}

fn collect_modifiers(node: Node, source: &[u8]) -> String {
    let _ = source;
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| MODIFIERS.contains(&child.kind()))
        .map(|child| child.kind())
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source).ok())
        .map(str::to_string)
}

fn line_span(node: Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_parsing_namespace_class_field_method() {
        let src = "namespace N { public class C { private int _x; public void M(string s){} } }";
        let chunks = parse("a.cs", src).expect("parses");

        assert_eq!(chunks.len(), 3, "{chunks:#?}");

        let class = chunks.iter().find(|c| c.kind == ChunkKind::Class).expect("class chunk");
        assert_eq!(class.qualified_name, "N.C");
        assert_eq!(class.modifiers, "public");

        let field = chunks.iter().find(|c| c.kind == ChunkKind::Field).expect("field chunk");
        assert_eq!(field.qualified_name, "C._x");
        assert_eq!(field.modifiers, "private");
        assert_eq!(field.parent_qualified_name.as_deref(), Some("N.C"));

        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).expect("method chunk");
        assert_eq!(method.qualified_name, "C.M");
        assert_eq!(method.modifiers, "public");
        assert_eq!(method.parent_qualified_name.as_deref(), Some("N.C"));

        for chunk in &chunks {
            assert!(chunk.start_line >= 1);
            assert!(chunk.end_line >= chunk.start_line);
        }
    }

    #[test]
    fn nested_types() {
        let src = "public class Outer { public class Inner { public void NM(){} } }";
        let chunks = parse("a.cs", src).expect("parses");

        let outer = chunks.iter().find(|c| c.qualified_name == "Outer").expect("Outer");
        assert_eq!(outer.parent_qualified_name, None);

        let inner = chunks
            .iter()
            .find(|c| c.qualified_name == "Outer.Inner")
            .expect("Outer.Inner");
        assert_eq!(inner.parent_qualified_name.as_deref(), Some("Outer"));

        let method = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Method)
            .expect("method");
        assert_eq!(method.qualified_name, "Outer.Inner.NM");
        assert_eq!(method.parent_qualified_name.as_deref(), Some("Outer.Inner"));
    }

    #[test]
    fn constructor_and_indexer_naming() {
        let src = "public class C { public C(int x) {} public int this[int i] => i; }";
        let chunks = parse("a.cs", src).expect("parses");

        let ctor = chunks.iter().find(|c| c.kind == ChunkKind::Constructor).expect("ctor");
        assert_eq!(ctor.qualified_name, "C..ctor");

        let indexer = chunks.iter().find(|c| c.kind == ChunkKind::Indexer).expect("indexer");
        assert_eq!(indexer.qualified_name, "C.this[]");
    }

    #[test]
    fn multi_variable_field_emits_one_chunk_per_variable() {
        let src = "public class C { private int _a, _b; }";
        let chunks = parse("a.cs", src).expect("parses");
        let fields: Vec<_> = chunks.iter().filter(|c| c.kind == ChunkKind::Field).collect();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|f| f.qualified_name == "C._a"));
        assert!(fields.iter().any(|f| f.qualified_name == "C._b"));
        assert_eq!(fields[0].start_line, fields[1].start_line);
    }

    #[test]
    fn using_directives_become_dependencies() {
        let src = "using System;\nusing System.Linq;\nnamespace N { public class C {} }";
        let chunks = parse("a.cs", src).expect("parses");
        let class = &chunks[0];
        assert_eq!(class.dependencies, vec!["System".to_string(), "System.Linq".to_string()]);
    }

    #[test]
    fn empty_file_yields_no_chunks() {
        let chunks = parse("empty.cs", "").expect("parses");
        assert!(chunks.is_empty());
    }
}
