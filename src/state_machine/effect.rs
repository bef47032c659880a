//! Effects produced by state transitions

use crate::campaign::Campaign;
use crate::store::{CampaignParameters, NewMessage};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message and broadcast it
    AddMessage(NewMessage),

    /// Replace the session parameters and broadcast them
    SetParameters(CampaignParameters),

    /// Snapshot the message list
    Checkpoint,

    /// Replace the message list with the checkpoint
    RestoreCheckpoint,

    /// Flag a proposal message as approved
    MarkApproved { message_id: String },

    // Spawned I/O. Each reports back with the matching *Complete event.
    Validate {
        text: String,
        context: super::InputContext,
    },
    Extract { text: String },
    SendToWorkflow { parameters: CampaignParameters },
    SendApproval {
        campaign: Campaign,
        parameters: CampaignParameters,
    },
    Celebrate { campaign: Campaign },
    Brainstorm { text: String },

    /// Broadcast the current turn state
    NotifyState,

    /// Tell subscribers the turn is over
    TurnComplete,
}

impl Effect {
    pub fn user(text: impl Into<String>) -> Self {
        Effect::AddMessage(NewMessage::user(text))
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Effect::AddMessage(NewMessage::ai(text))
    }

    pub fn system(text: impl Into<String>) -> Self {
        Effect::AddMessage(NewMessage::system(text))
    }

    /// Whether the runtime runs this effect on a spawned task
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Effect::Validate { .. }
                | Effect::Extract { .. }
                | Effect::SendToWorkflow { .. }
                | Effect::SendApproval { .. }
                | Effect::Celebrate { .. }
                | Effect::Brainstorm { .. }
        )
    }
}
