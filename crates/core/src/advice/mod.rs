//! AI-authored spending advice.
//!
//! The model call is an opaque [`TextCompletion`]; everything here up to the
//! call is deterministic prompt construction from base-currency figures.

mod completion;
mod prompt;

pub use completion::{CompletionError, GeminiClient, TextCompletion};
pub use prompt::{
    AdviceInput, CategoryStat, ExpenseDetail, PromptKind, build_prompt, data_block,
    empty_period_message,
};

use tracing::{info, warn};

/// Produces advice text for a period.
#[derive(Clone)]
pub struct AdviceService {
    completion: std::sync::Arc<dyn TextCompletion>,
}

impl std::fmt::Debug for AdviceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceService").finish_non_exhaustive()
    }
}

impl AdviceService {
    /// Creates a service backed by `completion`.
    #[must_use]
    pub fn new(completion: std::sync::Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Returns advice for `input`, or the fixed empty-period message without
    /// calling the model when there is nothing to analyse.
    pub async fn advise(
        &self,
        kind: PromptKind,
        range_label: &str,
        input: &AdviceInput,
        currency: &str,
    ) -> Result<String, CompletionError> {
        if input.is_empty() {
            return Ok(empty_period_message(range_label));
        }

        let prompt = build_prompt(kind, input, currency);
        match self.completion.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(prompt_type = kind.as_str(), "Advice generated");
                Ok(text)
            }
            Ok(_) => {
                warn!(prompt_type = kind.as_str(), "Completion returned empty text");
                Err(CompletionError::Empty)
            }
            Err(e) => {
                warn!(error = %e, prompt_type = kind.as_str(), "Completion failed");
                Err(e)
            }
        }
    }
}
