//! Semantic code parsing: language-specific chunk extraction (C1).

mod csharp;
mod generic;
mod heuristic;
pub mod languages;
mod util;

use std::collections::BTreeMap;

use codetriever_common::generate_chunk_id;

pub use languages::get_language_from_extension;

use crate::error::ParsingResult;

/// The kind of declaration a [`CodeChunk`] was extracted from.
///
/// This is an open set in spirit — [`ChunkKind::Other`] is the escape hatch
/// for languages (or constructs) with no direct analogue to the closed list
/// the primary grammar distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Class,
    Interface,
    Struct,
    Record,
    Enum,
    Method,
    Constructor,
    Property,
    Field,
    Event,
    Indexer,
    /// Anything that doesn't map cleanly onto the above (e.g. a heuristic
    /// fallback match, or a construct specific to a language with no
    /// grammar support).
    Other,
}

impl ChunkKind {
    /// Stable lowercase name, used for payload serialization and logging.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Struct => "struct",
            Self::Record => "record",
            Self::Enum => "enum",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Property => "property",
            Self::Field => "field",
            Self::Event => "event",
            Self::Indexer => "indexer",
            Self::Other => "other",
        }
    }

    /// Whether this kind introduces a new qualification scope that members
    /// nest under (i.e. a type, not a member).
    #[must_use]
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Struct | Self::Record | Self::Enum
        )
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed semantic code unit extracted from one file.
///
/// See the data model: `id` is a deterministic hash of
/// `(file_path, start_line, end_line, qualified_name)` so re-indexing an
/// unchanged declaration reproduces the same id (P6).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub kind: ChunkKind,
    pub qualified_name: String,
    pub parent_qualified_name: Option<String>,
    pub namespace: Option<String>,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    /// Ordered, deduplicated list of the file's imports, carried verbatim on
    /// every chunk (not pruned per-chunk).
    pub dependencies: Vec<String>,
    /// Space-separated modifier tokens in source order (e.g. "public static").
    pub modifiers: String,
    /// Free-form kind-specific extras (parameter types, return type, enum
    /// values, property/field/event type).
    pub attrs: BTreeMap<String, String>,
}

impl CodeChunk {
    /// Build a chunk, stamping its deterministic id from the identifying
    /// quadruple.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: ChunkKind,
        qualified_name: impl Into<String>,
        parent_qualified_name: Option<String>,
        namespace: Option<String>,
        file_path: impl Into<String>,
        start_line: usize,
        end_line: usize,
        content: impl Into<String>,
        dependencies: Vec<String>,
        modifiers: impl Into<String>,
        attrs: BTreeMap<String, String>,
    ) -> Self {
        let file_path = file_path.into();
        let qualified_name = qualified_name.into();
        let id = generate_chunk_id(&file_path, start_line, end_line, &qualified_name);
        Self {
            id,
            kind,
            qualified_name,
            parent_qualified_name,
            namespace,
            file_path,
            start_line,
            end_line,
            content: content.into(),
            dependencies,
            modifiers: modifiers.into(),
            attrs,
        }
    }
}

/// Parses a single source file into semantic chunks.
///
/// Implementations walk a language's syntax tree (or, absent a grammar, a
/// line-oriented heuristic) and must uphold I1–I4: every emitted chunk has
/// `end_line >= start_line >= 1`, a non-empty `kind`/`qualified_name`, and
/// any `parent_qualified_name` names a type chunk emitted for the same file.
pub trait ContentParser: Send + Sync {
    /// Parse `content` (the file at `file_path`) into chunks.
    ///
    /// Syntax errors do not abort parsing — implementations log diagnostics
    /// and return whatever the partial tree admits. `Err` is reserved for
    /// I/O failures handled by the caller and for total parser failure (no
    /// tree produced at all).
    fn parse(&self, file_path: &str, content: &str) -> ParsingResult<Vec<CodeChunk>>;

    /// Whether this parser has dedicated support for `language_id`.
    fn supports_language(&self, language_id: &str) -> bool;
}

/// Dispatches to the appropriate per-language parser (tree-sitter where a
/// grammar is registered, line-oriented heuristics otherwise).
pub struct CodeParser;

impl CodeParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentParser for CodeParser {
    fn parse(&self, file_path: &str, content: &str) -> ParsingResult<Vec<CodeChunk>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let language_id = get_language_from_extension(file_path);

        match language_id.as_deref() {
            Some("csharp") => csharp::parse(file_path, content),
            Some(lang) if languages::get_language_config(lang).is_some() => {
                generic::parse(lang, file_path, content)
            }
            _ => heuristic::parse(language_id.as_deref(), file_path, content),
        }
    }

    fn supports_language(&self, language_id: &str) -> bool {
        language_id == "csharp" || languages::get_language_config(language_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_no_chunks() {
        let parser = CodeParser::new();
        let chunks = parser.parse("empty.rs", "   \n\n  ").expect("parses");
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_kind_round_trips_through_as_str() {
        for kind in [
            ChunkKind::Class,
            ChunkKind::Interface,
            ChunkKind::Struct,
            ChunkKind::Record,
            ChunkKind::Enum,
            ChunkKind::Method,
            ChunkKind::Constructor,
            ChunkKind::Property,
            ChunkKind::Field,
            ChunkKind::Event,
            ChunkKind::Indexer,
            ChunkKind::Other,
        ] {
            assert!(!kind.as_str().is_empty());
        }
    }

    #[test]
    fn id_is_stable_for_identical_inputs() {
        let attrs = BTreeMap::new();
        let a = CodeChunk::new(
            ChunkKind::Method,
            "C.M",
            Some("C".to_string()),
            None,
            "a.cs",
            3,
            5,
            "void M(){}",
            vec![],
            "public",
            attrs.clone(),
        );
        let b = CodeChunk::new(
            ChunkKind::Method,
            "C.M",
            Some("C".to_string()),
            None,
            "a.cs",
            3,
            5,
            "void M(){}",
            vec![],
            "public",
            attrs,
        );
        assert_eq!(a.id, b.id);
    }
}
