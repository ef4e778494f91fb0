//! Answer synthesis over retrieved context.

pub mod fallback;
pub mod prompts;
pub mod synthesizer;

pub use fallback::FallbackSynthesizer;
pub use prompts::NO_CONTEXT_APOLOGY;
pub use synthesizer::{AnswerSynthesizer, truncate_answer};
