//! TextPreparer (C2): assembles a chunk's searchable text and splits it into
//! token-safe pieces when it exceeds the configured budget.

use crate::parsing::CodeChunk;

/// Token budget for a single embeddable piece of text.
///
/// `chars_per_token` is the `K` constant spec.md §4.2 names; token counts
/// are estimated as `chars / K`, never measured against a real tokenizer
/// unless the caller opts into [`super::TiktokenCounter`] elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub max_tokens: usize,
    pub chars_per_token: usize,
}

impl TokenBudget {
    #[must_use]
    pub const fn new(max_tokens: usize, chars_per_token: usize) -> Self {
        Self { max_tokens, chars_per_token }
    }

    #[must_use]
    pub const fn budget_chars(&self) -> usize {
        self.max_tokens * self.chars_per_token
    }

    #[must_use]
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token.max(1))
    }
}

impl Default for TokenBudget {
    /// `MAX_TOKENS≈6000`, `K≈3`, per spec.md §4.2.
    fn default() -> Self {
        Self::new(6000, 3)
    }
}

/// One token-safe piece of a chunk's searchable text.
///
/// `ordinal` is `0` when the chunk wasn't split; a piece's VectorStore id is
/// the parent chunk's id unmodified when there's only one span, or the
/// parent id with `ordinal` appended when there are several (so split
/// pieces are distinguishable but co-locatable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSpan {
    pub text: String,
    pub ordinal: usize,
}

/// Assembles and splits a chunk's text for embedding.
pub struct TextPreparer {
    budget: TokenBudget,
}

impl TextPreparer {
    #[must_use]
    pub const fn new(budget: TokenBudget) -> Self {
        Self { budget }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(TokenBudget::default())
    }

    /// Produce one or more token-safe texts for `chunk`.
    #[must_use]
    pub fn prepare(&self, chunk: &CodeChunk) -> Vec<CodeSpan> {
        let assembled = assemble_text(chunk);

        if self.budget.estimate_tokens(&assembled) <= self.budget.max_tokens {
            return vec![CodeSpan { text: assembled, ordinal: 0 }];
        }

        split_text(&assembled, self.budget.budget_chars())
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| CodeSpan { text, ordinal })
            .collect()
    }
}

impl Default for TextPreparer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn assemble_text(chunk: &CodeChunk) -> String {
    let mut parts = Vec::with_capacity(3);
    if !chunk.qualified_name.is_empty() {
        parts.push(chunk.qualified_name.as_str());
    }
    if let Some(namespace) = chunk.namespace.as_deref() {
        if !namespace.is_empty() {
            parts.push(namespace);
        }
    }
    if !chunk.content.is_empty() {
        parts.push(chunk.content.as_str());
    }
    parts.join("\n")
}

/// Tier 1: pack lines greedily into pieces of at most `budget_chars`.
fn split_text(text: &str, budget_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > budget_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(split_oversize_line(line, budget_chars));
            continue;
        }

        let candidate_len = if current.is_empty() {
            line_len
        } else {
            current.chars().count() + 1 + line_len
        };

        if candidate_len > budget_chars {
            pieces.push(std::mem::take(&mut current));
            current = line.to_string();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Tier 2: a single line still over budget is split on sentence terminators.
fn split_oversize_line(line: &str, budget_chars: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut buf = String::new();
    for ch in line.chars() {
        buf.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            sentences.push(std::mem::take(&mut buf));
        }
    }
    if !buf.is_empty() {
        sentences.push(buf);
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        let sentence_len = sentence.chars().count();
        if sentence_len > budget_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            pieces.extend(hard_split(&sentence, budget_chars));
            continue;
        }

        if current.chars().count() + sentence_len > budget_chars {
            pieces.push(std::mem::take(&mut current));
        }
        current.push_str(&sentence);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Tier 3: hard character-boundary split, the last resort.
fn hard_split(text: &str, budget_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(budget_chars.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Facade over [`TextPreparer`] — the public entry point for C2.
pub struct ChunkingService {
    preparer: TextPreparer,
}

impl ChunkingService {
    #[must_use]
    pub const fn new(budget: TokenBudget) -> Self {
        Self { preparer: TextPreparer::new(budget) }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(TokenBudget::default())
    }

    #[must_use]
    pub fn prepare(&self, chunk: &CodeChunk) -> Vec<CodeSpan> {
        self.preparer.prepare(chunk)
    }
}

impl Default for ChunkingService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ChunkKind;
    use std::collections::BTreeMap;

    fn chunk_with_content(content: &str) -> CodeChunk {
        CodeChunk::new(
            ChunkKind::Method, "C.M", Some("C".to_string()), None, "a.cs", 1, 1,
            content, vec![], "public", BTreeMap::new(),
        )
    }

    #[test]
    fn small_chunk_is_not_split() {
        let preparer = TextPreparer::with_defaults();
        let spans = preparer.prepare(&chunk_with_content("void M() {}"));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].ordinal, 0);
        assert!(spans[0].text.contains("C.M"));
        assert!(spans[0].text.contains("void M() {}"));
    }

    #[test]
    fn oversize_text_is_split_within_budget() {
        // 50,000 chars, MAX_TOKENS=6000, K=3 -> budget 18,000 chars; S3.
        let budget = TokenBudget::new(6000, 3);
        let preparer = TextPreparer::new(budget);
        let body = "x".repeat(50_000);
        let spans = preparer.prepare(&chunk_with_content(&body));

        assert!(spans.len() >= 3, "expected at least 3 pieces, got {}", spans.len());
        for span in &spans {
            assert!(budget.estimate_tokens(&span.text) <= budget.max_tokens);
        }
    }

    #[test]
    fn oversize_single_line_is_still_split_within_budget() {
        let budget = TokenBudget::new(10, 1); // tiny budget: 10 chars
        let preparer = TextPreparer::new(budget);
        let body = "a.b.c.d.e.f.g.h.i.j.k.l.m.n.o.p".to_string();
        let spans = preparer.prepare(&chunk_with_content(&body));
        for span in &spans {
            assert!(span.text.chars().count() <= budget.budget_chars());
        }
    }

    #[test]
    fn empty_parts_are_omitted() {
        let chunk = CodeChunk::new(
            ChunkKind::Method, "C.M", Some("C".to_string()), None, "a.cs", 1, 1,
            "", vec![], "public", BTreeMap::new(),
        );
        let spans = TextPreparer::with_defaults().prepare(&chunk);
        assert_eq!(spans[0].text, "C.M");
    }
}
