//! Answer synthesizer: generative answer with deterministic fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::answer::fallback::FallbackSynthesizer;
use crate::answer::prompts::{ANSWER_SYSTEM_PROMPT, NO_CONTEXT_APOLOGY, answer_prompt};
use crate::config::AnswerConfig;
use crate::error::LlmError;
use crate::knowledge::RetrievedChunk;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Number of sentence segments kept when a generated answer is too long.
const TRUNCATED_SEGMENTS: usize = 3;

/// Turns retrieved chunks and a question into reply text.
pub struct AnswerSynthesizer {
    llm: Option<Arc<dyn LlmProvider>>,
    fallback: FallbackSynthesizer,
    timeout: Duration,
    max_answer_chars: usize,
}

impl AnswerSynthesizer {
    /// Without an LLM every answer comes from the fallback synthesizer.
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: &AnswerConfig) -> Self {
        Self {
            llm,
            fallback: FallbackSynthesizer::new(config.decorative_symbols.clone()),
            timeout: config.generation_timeout,
            max_answer_chars: config.max_answer_chars,
        }
    }

    /// Answer `question` from `chunks`. Never fails.
    pub async fn answer(&self, question: &str, chunks: &[RetrievedChunk]) -> String {
        if chunks.is_empty() {
            return NO_CONTEXT_APOLOGY.to_string();
        }

        let context = chunks
            .iter()
            .map(|c| c.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        match self.generate(question, &context).await {
            Ok(answer) => truncate_answer(&answer, self.max_answer_chars),
            Err(e) => {
                warn!(error = %e, "Generation failed; using rule-based answer");
                self.fallback.answer(question, &context)
            }
        }
    }

    async fn generate(&self, question: &str, context: &str) -> Result<String, LlmError> {
        let Some(llm) = self.llm.as_ref() else {
            return Err(LlmError::RequestFailed {
                provider: "none".to_string(),
                reason: "no generative backend configured".to_string(),
            });
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(ANSWER_SYSTEM_PROMPT),
            ChatMessage::user(answer_prompt(question, context)),
        ]);

        let response = tokio::time::timeout(self.timeout, llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: llm.model_name().to_string(),
                timeout: self.timeout,
            })??;

        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generated answer"
        );
        Ok(response.content.trim().to_string())
    }
}

/// Cut an over-long answer to its first three `". "`-delimited segments.
pub fn truncate_answer(answer: &str, max_chars: usize) -> String {
    if answer.chars().count() <= max_chars {
        return answer.to_string();
    }
    let head: Vec<&str> = answer.split(". ").take(TRUNCATED_SEGMENTS).collect();
    format!("{}.", head.join(". "))
}
