//! Pure state transition function

use super::{DispatchOrigin, Effect, Event, InputContext, TurnContext, TurnState};
use crate::store::NewMessage;
use serde_json::json;
use thiserror::Error;

pub const ANALYZE_PROMPT: &str = "analyzePrompt";
pub const SEND_TO_WORKFLOW: &str = "sendToWorkflow";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// Back to idle, closing the turn
    fn finished(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self::new(TurnState::Idle)
            .with_effects(effects)
            .with_effect(Effect::NotifyState)
            .with_effect(Effect::TurnComplete)
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Session is busy, wait for the current request to finish")]
    SessionBusy,
    #[error("There is no checkpoint to restore")]
    NoCheckpoint,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

fn segment_acknowledgement(name: &str) -> String {
    format!(
        "Great! The segment is named \"{name}\". Now, please describe the customers in this segment. \
         For example, you can mention their age, income, interests, or spending habits."
    )
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs and performs no
/// I/O. User events are only accepted in `Idle`.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &TurnState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    if state.is_busy() && event.is_user_event() {
        return Err(TransitionError::SessionBusy);
    }

    match (state, event) {
        // ============================================================
        // Chat input
        // ============================================================
        (TurnState::Idle, Event::UserText { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::InvalidTransition(
                    "message text is empty".to_string(),
                ));
            }
            let input = context.stage().expected_input();
            Ok(TransitionResult::new(TurnState::Validating {
                context: input,
                text: text.clone(),
            })
            .with_effect(Effect::user(text.clone()))
            .with_effect(Effect::NotifyState)
            .with_effect(Effect::Validate {
                text,
                context: input,
            }))
        }

        (TurnState::Validating { context: input, text }, Event::ValidationComplete { validation })
            if !validation.is_valid =>
        {
            let feedback = validation
                .feedback
                .unwrap_or_else(|| input.fallback_feedback().to_string());
            tracing::debug!(session_id = %context.session_id, text = %text, "Input rejected by validator");
            Ok(TransitionResult::finished([Effect::ai(feedback)]))
        }

        (
            TurnState::Validating {
                context: InputContext::SegmentName,
                text,
            },
            Event::ValidationComplete { .. },
        ) => {
            let name = text.trim().to_string();
            let mut parameters = context.parameters.clone();
            parameters.segment_name.clone_from(&name);
            Ok(TransitionResult::finished([
                Effect::SetParameters(parameters),
                Effect::ai(segment_acknowledgement(&name)),
            ]))
        }

        (
            TurnState::Validating {
                context: InputContext::CampaignDetails,
                text,
            },
            Event::ValidationComplete { .. },
        ) => Ok(TransitionResult::new(TurnState::Extracting { text: text.clone() })
            .with_effect(Effect::Checkpoint)
            .with_effect(Effect::AddMessage(NewMessage::function_call(
                ANALYZE_PROMPT,
                json!({ "prompt": text }),
            )))
            .with_effect(Effect::NotifyState)
            .with_effect(Effect::Extract { text: text.clone() })),

        (TurnState::Extracting { .. }, Event::ExtractionComplete { result }) => match result {
            Ok(extracted) => {
                let merged = context.parameters.merged(&extracted, context.merge_policy);
                let merged_json = merged.to_json();
                Ok(TransitionResult::new(TurnState::Dispatching {
                    origin: DispatchOrigin::Chat,
                })
                .with_effect(Effect::SetParameters(merged.clone()))
                .with_effect(Effect::AddMessage(NewMessage::function_result(
                    ANALYZE_PROMPT,
                    merged_json.clone(),
                )))
                .with_effect(Effect::AddMessage(NewMessage::function_call(
                    SEND_TO_WORKFLOW,
                    merged_json,
                )))
                .with_effect(Effect::NotifyState)
                .with_effect(Effect::SendToWorkflow { parameters: merged }))
            }
            Err(message) => Ok(TransitionResult::finished([Effect::system(format!(
                "{}{message}",
                DispatchOrigin::Chat.error_prefix()
            ))])),
        },

        (TurnState::Dispatching { origin }, Event::WorkflowComplete { result }) => match result {
            Ok(response) => Ok(TransitionResult::finished([Effect::ai(response.display_text())])),
            Err(message) => Ok(TransitionResult::finished([Effect::system(format!(
                "{}{message}",
                origin.error_prefix()
            ))])),
        },

        // ============================================================
        // Profile form
        // ============================================================
        (TurnState::Idle, Event::ProfileEdited { parameters }) => {
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::SetParameters(parameters))
                .with_effect(Effect::TurnComplete))
        }

        (TurnState::Idle, Event::ProfileSubmitted) => {
            if !context.parameters.has_segment_name() {
                return Ok(TransitionResult::finished([Effect::system(
                    "Error: Segment Name is a required field.",
                )]));
            }
            let parameters = context.parameters.clone();
            Ok(TransitionResult::new(TurnState::Dispatching {
                origin: DispatchOrigin::Profile,
            })
            .with_effect(Effect::Checkpoint)
            .with_effect(Effect::AddMessage(NewMessage::function_call(
                SEND_TO_WORKFLOW,
                parameters.to_json(),
            )))
            .with_effect(Effect::NotifyState)
            .with_effect(Effect::SendToWorkflow { parameters }))
        }

        // ============================================================
        // Approval
        // ============================================================
        (TurnState::Idle, Event::ApproveRequested { message_id, campaign }) => {
            Ok(TransitionResult::new(TurnState::Approving {
                message_id,
                campaign: campaign.clone(),
            })
            .with_effect(Effect::system(format!(
                "Approving campaign \"{}\"...",
                campaign.campaign_id
            )))
            .with_effect(Effect::NotifyState)
            .with_effect(Effect::SendApproval {
                campaign,
                parameters: context.parameters.clone(),
            }))
        }

        (TurnState::Approving { message_id, campaign }, Event::ApprovalComplete { result }) => {
            match result {
                Ok(_) => Ok(TransitionResult::new(TurnState::Celebrating {
                    message_id: message_id.clone(),
                    campaign: campaign.clone(),
                })
                .with_effect(Effect::NotifyState)
                .with_effect(Effect::Celebrate {
                    campaign: campaign.clone(),
                })),
                Err(message) => Ok(TransitionResult::finished([Effect::system(format!(
                    "Approval failed: {message}"
                ))])),
            }
        }

        (TurnState::Celebrating { message_id, .. }, Event::CelebrationComplete { text }) => {
            Ok(TransitionResult::finished([
                Effect::ai(text),
                Effect::MarkApproved {
                    message_id: message_id.clone(),
                },
            ]))
        }

        // ============================================================
        // Restore
        // ============================================================
        (TurnState::Idle, Event::RestoreRequested) => {
            if !context.has_checkpoint {
                return Err(TransitionError::NoCheckpoint);
            }
            Ok(TransitionResult::new(TurnState::Idle)
                .with_effect(Effect::RestoreCheckpoint)
                .with_effect(Effect::TurnComplete))
        }

        // ============================================================
        // Brainstorm
        // ============================================================
        (TurnState::Idle, Event::BrainstormRequested { text }) => {
            if text.trim().is_empty() {
                return Err(TransitionError::InvalidTransition(
                    "message text is empty".to_string(),
                ));
            }
            Ok(TransitionResult::new(TurnState::Brainstorming)
                .with_effect(Effect::user(text.clone()))
                .with_effect(Effect::NotifyState)
                .with_effect(Effect::Brainstorm { text }))
        }

        (TurnState::Brainstorming, Event::BrainstormComplete { result }) => match result {
            Ok(brainstorm) => {
                let mut effects = Vec::with_capacity(brainstorm.exchanges.len() * 2 + 1);
                for exchange in brainstorm.exchanges {
                    effects.push(Effect::AddMessage(NewMessage::function_call(
                        exchange.name.clone(),
                        exchange.args,
                    )));
                    effects.push(Effect::AddMessage(NewMessage::function_result(
                        exchange.name,
                        exchange.result,
                    )));
                }
                effects.push(Effect::ai(brainstorm.reply));
                Ok(TransitionResult::finished(effects))
            }
            Err(message) => Ok(TransitionResult::finished([Effect::system(format!(
                "An error occurred: {message}"
            ))])),
        },

        // ============================================================
        // Everything else
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} while {}",
            event.name(),
            state
        ))),
    }
}
