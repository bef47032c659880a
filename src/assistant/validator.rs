//! Input validation against the current conversation stage

use super::strip_code_fence;
use crate::llm::{LlmRequest, LlmService};
use crate::state_machine::InputContext;
use serde::Deserialize;
use serde_json::{json, Value};

/// Outcome of validating one user input
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            feedback: None,
        }
    }

    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            feedback: Some(feedback.into()),
        }
    }

    fn normalized(mut self) -> Self {
        self.feedback = self
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        self
    }
}

fn validation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isValid": {
                "type": "BOOLEAN",
                "description": "Whether the user input is valid for the given context."
            },
            "feedback": {
                "type": "STRING",
                "description": "A helpful message to the user if the input is invalid, explaining what is expected. This should be null if the input is valid."
            }
        }
    })
}

fn validation_prompt(input: &str, context: InputContext) -> String {
    match context {
        InputContext::SegmentName => format!(
            "You are a helpful AI assistant for a marketing tool. The user has been prompted to provide a name for a customer segment.\n\n\
             A valid segment name can be a descriptive phrase (e.g., 'Young Professionals') or a single keyword used for categorization or testing (e.g., 'Test', 'QA_Users', 'Pixel', 'Pulse').\n\n\
             However, simple greetings (e.g., 'Hi', 'Hello'), questions, or generic conversational filler are NOT valid segment names.\n\n\
             Please analyze the user's input: \"{input}\"\n\n\
             Is this a valid segment name based on these rules? Respond with JSON following the specified schema. If it's invalid, provide a brief, friendly, and professional feedback message that gently guides the user to provide a proper segment name."
        ),
        InputContext::CampaignDetails => format!(
            "You are a helpful AI assistant for a marketing tool. The user has been asked to describe a marketing campaign. A valid description should include some details about the target audience, offers, or occasions (e.g., 'a Diwali offer for shoppers' or 'cashback for movie lovers'). Simple greetings, questions, or conversational filler are not valid campaign descriptions.\n\n\
             Please analyze the user's input: \"{input}\"\n\n\
             Does this input appear to be a description of a campaign? Respond with JSON following the specified schema. If it's invalid, provide a brief, friendly, and professional feedback message that gently guides the user to describe their campaign."
        ),
    }
}

pub(super) async fn validate(llm: &dyn LlmService, input: &str, context: InputContext) -> Validation {
    let request = LlmRequest::prompt(validation_prompt(input, context)).with_schema(validation_schema());

    let response = match llm.complete(&request).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(context = context.as_str(), error = %e, "Validation call failed, accepting input");
            return Validation::valid();
        }
    };

    let text = response.text();
    match serde_json::from_str::<Validation>(strip_code_fence(&text)) {
        Ok(validation) => validation.normalized(),
        Err(e) => {
            tracing::warn!(context = context.as_str(), error = %e, "Unparseable validation reply, accepting input");
            Validation::valid()
        }
    }
}
