//! Gemini-backed campaign assistant
//!
//! Four independent calls share one `LlmService`: input validation,
//! parameter extraction, the approval celebration and the trend brainstorm.

mod celebration;
mod extractor;
mod trends;
mod validator;

pub use celebration::fallback_celebration;
pub use trends::{Brainstorm, ToolExchange};
pub use validator::Validation;

use crate::campaign::Campaign;
use crate::llm::{LlmError, LlmService};
use crate::state_machine::InputContext;
use crate::store::ExtractedParameters;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    #[error("Failed to analyze the prompt with AI. {0}")]
    Extraction(String),
    #[error("{0}")]
    Llm(#[from] LlmError),
    #[error("The AI returned an empty reply")]
    EmptyReply,
}

/// Assistant over any LLM backend
#[derive(Clone)]
pub struct GeminiAssistant {
    llm: Arc<dyn LlmService>,
}

impl GeminiAssistant {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Never fails; a broken validator lets the input through
    pub async fn validate(&self, text: &str, context: InputContext) -> Validation {
        validator::validate(self.llm.as_ref(), text, context).await
    }

    pub async fn extract(&self, text: &str) -> Result<ExtractedParameters, AssistantError> {
        extractor::extract(self.llm.as_ref(), text).await
    }

    pub async fn celebrate(&self, campaign: &Campaign) -> String {
        celebration::celebrate(self.llm.as_ref(), campaign).await
    }

    pub async fn brainstorm(&self, text: &str) -> Result<Brainstorm, AssistantError> {
        trends::brainstorm(self.llm.as_ref(), text).await
    }
}

/// Strip a Markdown code fence some models wrap JSON in
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
