//! Turn state types

use crate::campaign::Campaign;
use crate::store::{CampaignParameters, MergePolicy};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Conversation Stage
// ============================================================================

/// What the next chat input is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputContext {
    SegmentName,
    CampaignDetails,
}

impl InputContext {
    pub fn as_str(self) -> &'static str {
        match self {
            InputContext::SegmentName => "segment_name",
            InputContext::CampaignDetails => "campaign_details",
        }
    }

    /// Re-prompt used when the validator rejects without feedback
    pub fn fallback_feedback(self) -> &'static str {
        match self {
            InputContext::SegmentName => "I'm sorry, I'm not sure I understand. Could you please provide a name for your customer segment? For example, 'Frequent Travelers' or 'Young Professionals'.",
            InputContext::CampaignDetails => "My apologies, that doesn't look like a campaign description. Could you tell me about the campaign you have in mind? For instance, 'A Diwali offer for new customers'.",
        }
    }
}

/// Conversation stage, derived from the parameters collected so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingSegmentName,
    AwaitingCampaignDetails,
}

impl Stage {
    pub fn of(parameters: &CampaignParameters) -> Self {
        if parameters.has_segment_name() {
            Stage::AwaitingCampaignDetails
        } else {
            Stage::AwaitingSegmentName
        }
    }

    pub fn expected_input(self) -> InputContext {
        match self {
            Stage::AwaitingSegmentName => InputContext::SegmentName,
            Stage::AwaitingCampaignDetails => InputContext::CampaignDetails,
        }
    }
}

/// Which flow started a workflow dispatch. Only changes the error prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOrigin {
    Chat,
    Profile,
}

impl DispatchOrigin {
    pub fn error_prefix(self) -> &'static str {
        match self {
            DispatchOrigin::Chat => "An error occurred: ",
            DispatchOrigin::Profile => "Error: ",
        }
    }
}

// ============================================================================
// Turn State
// ============================================================================

/// Per-session turn state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnState {
    /// Ready for user input
    #[default]
    Idle,

    /// Waiting on the validator for a chat input
    Validating { context: InputContext, text: String },

    /// Waiting on parameter extraction
    Extracting { text: String },

    /// Generation webhook call in flight
    Dispatching { origin: DispatchOrigin },

    /// Approval webhook call in flight
    Approving {
        message_id: String,
        campaign: Campaign,
    },

    /// Approval accepted, waiting on the congratulation text
    Celebrating {
        message_id: String,
        campaign: Campaign,
    },

    /// Trend brainstorm in flight
    Brainstorming,
}

impl TurnState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, TurnState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::Validating { .. } => "validating",
            TurnState::Extracting { .. } => "extracting",
            TurnState::Dispatching { .. } => "dispatching",
            TurnState::Approving { .. } => "approving",
            TurnState::Celebrating { .. } => "celebrating",
            TurnState::Brainstorming => "brainstorming",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Context
// ============================================================================

/// Snapshot of session data the transition function may read
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    pub parameters: CampaignParameters,
    pub has_checkpoint: bool,
    pub merge_policy: MergePolicy,
}

impl TurnContext {
    pub fn new(session_id: impl Into<String>, merge_policy: MergePolicy) -> Self {
        Self {
            session_id: session_id.into(),
            parameters: CampaignParameters::default(),
            has_checkpoint: false,
            merge_policy,
        }
    }

    pub fn stage(&self) -> Stage {
        Stage::of(&self.parameters)
    }
}
