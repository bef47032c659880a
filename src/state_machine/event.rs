//! Events that can occur in a session

use crate::assistant::{Brainstorm, Validation};
use crate::campaign::Campaign;
use crate::store::{CampaignParameters, ExtractedParameters};
use crate::webhook::WorkflowResponse;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserText {
        text: String,
    },
    ProfileEdited {
        parameters: CampaignParameters,
    },
    ProfileSubmitted,
    ApproveRequested {
        message_id: String,
        campaign: Campaign,
    },
    RestoreRequested,
    BrainstormRequested {
        text: String,
    },

    // Results of spawned calls. Errors are carried as display text.
    ValidationComplete {
        validation: Validation,
    },
    ExtractionComplete {
        result: Result<ExtractedParameters, String>,
    },
    WorkflowComplete {
        result: Result<WorkflowResponse, String>,
    },
    ApprovalComplete {
        result: Result<WorkflowResponse, String>,
    },
    CelebrationComplete {
        text: String,
    },
    BrainstormComplete {
        result: Result<Brainstorm, String>,
    },
}

impl Event {
    /// Events that start a turn, as opposed to results of one
    pub fn is_user_event(&self) -> bool {
        matches!(
            self,
            Event::UserText { .. }
                | Event::ProfileEdited { .. }
                | Event::ProfileSubmitted
                | Event::ApproveRequested { .. }
                | Event::RestoreRequested
                | Event::BrainstormRequested { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::UserText { .. } => "user_text",
            Event::ProfileEdited { .. } => "profile_edited",
            Event::ProfileSubmitted => "profile_submitted",
            Event::ApproveRequested { .. } => "approve_requested",
            Event::RestoreRequested => "restore_requested",
            Event::BrainstormRequested { .. } => "brainstorm_requested",
            Event::ValidationComplete { .. } => "validation_complete",
            Event::ExtractionComplete { .. } => "extraction_complete",
            Event::WorkflowComplete { .. } => "workflow_complete",
            Event::ApprovalComplete { .. } => "approval_complete",
            Event::CelebrationComplete { .. } => "celebration_complete",
            Event::BrainstormComplete { .. } => "brainstorm_complete",
        }
    }
}
