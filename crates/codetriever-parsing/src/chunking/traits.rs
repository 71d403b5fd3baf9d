//! Token-counting abstraction shared by the heuristic default counter and
//! the optional `tiktoken` precise counter.

/// Counts tokens for a text, against some model's vocabulary (or an
/// estimator that doesn't need one).
pub trait TokenCounter: Send + Sync {
    /// Identifier for logging/selection (e.g. a model name, or `"chars/3"`).
    fn name(&self) -> &str;

    /// Maximum tokens this counter's associated budget allows.
    fn max_tokens(&self) -> usize;

    /// Count tokens in a single text.
    fn count(&self, text: &str) -> usize;

    /// Count tokens across several texts, in order.
    fn count_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.count(t)).collect()
    }
}
