//! TextPreparer (C2): assembles and token-budgets a chunk's text for embedding.

mod heuristic_counter;
mod registry;
mod text_preparer;
mod tiktoken_counter;
mod traits;

pub use heuristic_counter::CharsPerTokenCounter;
pub use registry::TokenCounterRegistry;
pub use text_preparer::{ChunkingService, CodeSpan, TextPreparer, TokenBudget};
pub use tiktoken_counter::TiktokenCounter;
pub use traits::TokenCounter;
