//! Selects a [`TokenCounter`] by name, falling back to the default
//! chars-per-token estimator when a precise counter can't be built.

use super::heuristic_counter::CharsPerTokenCounter;
use super::tiktoken_counter::TiktokenCounter;
use super::traits::TokenCounter;

/// Builds token counters on demand.
///
/// The default counter never fails to construct (it has no external
/// vocabulary to load); a `tiktoken` counter is only built when a caller
/// asks for one by model name, and construction failures fall back to the
/// default rather than erroring the caller.
pub struct TokenCounterRegistry {
    default_max_tokens: usize,
    default_chars_per_token: usize,
}

impl TokenCounterRegistry {
    #[must_use]
    pub const fn new(default_max_tokens: usize, default_chars_per_token: usize) -> Self {
        Self { default_max_tokens, default_chars_per_token }
    }

    #[must_use]
    pub fn default_counter(&self) -> CharsPerTokenCounter {
        CharsPerTokenCounter::new(self.default_chars_per_token, self.default_max_tokens)
    }

    /// A precise counter for `model_name`, or the default estimator if the
    /// model's encoding can't be resolved.
    #[must_use]
    pub fn counter_for_model(&self, model_name: &str) -> Box<dyn TokenCounter> {
        match TiktokenCounter::new(model_name, self.default_max_tokens) {
            Ok(counter) => Box::new(counter),
            Err(error) => {
                tracing::warn!(model_name, %error, "falling back to chars-per-token estimator");
                Box::new(self.default_counter())
            }
        }
    }
}

impl Default for TokenCounterRegistry {
    fn default() -> Self {
        Self::new(6000, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_falls_back_to_default() {
        let registry = TokenCounterRegistry::default();
        let counter = registry.counter_for_model("not-a-real-model");
        assert_eq!(counter.name(), "chars-per-token");
    }
}
