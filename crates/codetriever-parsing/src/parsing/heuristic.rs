//! Line-oriented fallback chunker for files with no tree-sitter grammar
//! registered (or where the grammar failed to produce a usable tree).
//!
//! This never claims the fidelity of a real parse: it looks for a small set
//! of declaration keywords common across C-like and dynamic languages,
//! groups each match through matching brace depth (or, absent braces, to
//! the next declaration at the same or lower indentation), and falls back
//! to a single whole-file chunk when nothing recognizable is found — which
//! keeps B1 (empty file -> zero chunks) and "the Chunker never fails a file
//! just because it doesn't recognize the language" both true.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParsingResult;
use crate::parsing::{ChunkKind, CodeChunk};

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        (?:(?P<modifiers>(?:public|private|protected|static|export|async|final|abstract)\s+)*)
        (?:
            (?P<kind_class>class|struct|interface|trait|enum)\s+(?P<class_name>[A-Za-z_][A-Za-z0-9_]*)
          | (?:fn|func|function|def)\s+(?P<fn_name>[A-Za-z_][A-Za-z0-9_]*)
        )
        ",
    )
    .expect("static regex is valid")
});

pub fn parse(language_id: Option<&str>, file_path: &str, content: &str) -> ParsingResult<Vec<CodeChunk>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();

    let mut i = 0usize;
    while i < lines.len() {
        let Some(caps) = DECLARATION.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let (kind, name) = if let Some(m) = caps.name("class_name") {
            (class_kind(&caps["kind_class"]), m.as_str().to_string())
        } else if let Some(m) = caps.name("fn_name") {
            (ChunkKind::Method, m.as_str().to_string())
        } else {
            i += 1;
            continue;
        };

        let modifiers = caps
            .name("modifiers")
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();

        let start = i;
        let end = find_block_end(&lines, i);
        let content_span = lines[start..=end].join("\n");

        chunks.push(CodeChunk::new(
            kind,
            name,
            None,
            None,
            file_path,
            start + 1,
            end + 1,
            content_span,
            Vec::new(),
            modifiers,
            BTreeMap::new(),
        ));

        i = end + 1;
    }

    if chunks.is_empty() {
        let stem = Path::new(file_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_path)
            .to_string();
        let mut attrs = BTreeMap::new();
        if let Some(lang) = language_id {
            attrs.insert("language".to_string(), lang.to_string());
        }
        chunks.push(CodeChunk::new(
            ChunkKind::Other,
            stem,
            None,
            None,
            file_path,
            1,
            lines.len().max(1),
            content.to_string(),
            Vec::new(),
            String::new(),
            attrs,
        ));
    }

    Ok(chunks)
}

fn class_kind(keyword: &str) -> ChunkKind {
    match keyword {
        "class" => ChunkKind::Class,
        "struct" => ChunkKind::Struct,
        "interface" | "trait" => ChunkKind::Interface,
        "enum" => ChunkKind::Enum,
        _ => ChunkKind::Other,
    }
}

/// Find the closing line for a declaration starting at `start`: track brace
/// depth if the declaration's line (or one of the next few) opens a `{`;
/// otherwise (indentation-style languages) stop at the next non-blank line
/// with indentation no deeper than the declaration's own.
fn find_block_end(lines: &[&str], start: usize) -> usize {
    let opens_brace = lines[start..lines.len().min(start + 3)]
        .iter()
        .any(|l| l.contains('{'));

    if opens_brace {
        let mut depth = 0i32;
        let mut seen_open = false;
        for (offset, line) in lines.iter().enumerate().skip(start) {
            for ch in line.chars() {
                match ch {
                    '{' => {
                        depth += 1;
                        seen_open = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            if seen_open && depth <= 0 {
                return offset;
            }
        }
        return lines.len() - 1;
    }

    let base_indent = lines[start].len() - lines[start].trim_start().len();
    for (offset, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if indent <= base_indent {
            return offset - 1;
        }
    }
    lines.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_no_chunks() {
        let chunks = parse(None, "empty.rb", "").expect("parses");
        assert!(chunks.is_empty());
    }

    #[test]
    fn falls_back_to_whole_file_chunk_when_nothing_recognized() {
        let chunks = parse(Some("vue"), "a.vue", "<template><div/></template>").expect("parses");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Other);
    }

    #[test]
    fn brace_style_class_is_recognized() {
        let src = "public class Foo {\n    void bar() {}\n}\n";
        let chunks = parse(Some("php"), "a.php", src).expect("parses");
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Class && c.qualified_name == "Foo"));
    }

    #[test]
    fn indentation_style_def_is_recognized() {
        let src = "def greet(name)\n  puts name\nend\n";
        let chunks = parse(Some("ruby"), "a.rb", src).expect("parses");
        assert!(chunks.iter().any(|c| c.kind == ChunkKind::Method && c.qualified_name == "greet"));
    }
}
