//! API request and response types

use crate::campaign::{Campaign, CampaignReply};
use crate::state_machine::Stage;
use crate::store::{CampaignParameters, Message, MessageKind, Sender, SessionSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request carrying chat or brainstorm text
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// How a client should render a message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayView {
    Text { text: String },
    /// A campaign card. `approve` is the action path while the card is open.
    Proposal {
        campaign: Campaign,
        approved: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        approve: Option<String>,
    },
}

/// A stored message plus its display view
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub display: DisplayView,
}

impl MessageView {
    pub fn new(session_id: &str, message: Message) -> Self {
        let display = match (message.sender, message.kind) {
            (Sender::Ai, MessageKind::Text) => match CampaignReply::parse(&message.content) {
                CampaignReply::Proposal(campaign) => {
                    let approved = message.is_approved();
                    DisplayView::Proposal {
                        campaign,
                        approved,
                        approve: (!approved).then(|| {
                            format!("/api/sessions/{session_id}/messages/{}/approve", message.id)
                        }),
                    }
                }
                CampaignReply::PlainText(text) => DisplayView::Text { text },
            },
            _ => DisplayView::Text {
                text: message.content.clone(),
            },
        };
        Self { message, display }
    }

    pub fn list(session_id: &str, messages: Vec<Message>) -> Vec<Self> {
        messages
            .into_iter()
            .map(|m| Self::new(session_id, m))
            .collect()
    }
}

/// Listing entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListItem {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub busy: bool,
}

/// Response with a list of sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionListItem>,
}

/// Response for session creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Full session view
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageView>,
    pub parameters: CampaignParameters,
    pub stage: Stage,
    pub busy: bool,
    pub has_checkpoint: bool,
}

/// Response for queued actions
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

impl QueuedResponse {
    pub fn queued() -> Self {
        Self { queued: true }
    }
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewMessage;
    use serde_json::json;

    fn proposal() -> String {
        json!({"output": [{"Campaign_ID": "C1", "Header": "Diwali Dhamaka"}]}).to_string()
    }

    #[test]
    fn test_ai_proposal_gets_approve_action() {
        let message = NewMessage::ai(proposal()).into_message("m1".to_string());
        let view = MessageView::new("s1", message);
        match &view.display {
            DisplayView::Proposal {
                campaign,
                approved,
                approve,
            } => {
                assert_eq!(campaign.campaign_id, "C1");
                assert!(!approved);
                assert_eq!(
                    approve.as_deref(),
                    Some("/api/sessions/s1/messages/m1/approve")
                );
            }
            DisplayView::Text { .. } => panic!("expected proposal"),
        }
    }

    #[test]
    fn test_approved_proposal_has_no_action() {
        let mut message = NewMessage::ai(proposal()).into_message("m1".to_string());
        message.approved = Some(true);
        let json = serde_json::to_value(MessageView::new("s1", message)).unwrap();
        assert_eq!(json["display"]["kind"], "proposal");
        assert_eq!(json["display"]["approved"], true);
        assert!(json["display"].get("approve").is_none());
        assert_eq!(json["isApproved"], true);
    }

    #[test]
    fn test_other_shapes_are_text() {
        for message in [
            NewMessage::ai("Great! Tell me more."),
            NewMessage::ai(json!({"output": []}).to_string()),
            NewMessage::user(proposal()),
            NewMessage::function_call("sendToWorkflow", json!({})),
        ] {
            let view = MessageView::new("s1", message.into_message("m".to_string()));
            assert!(matches!(view.display, DisplayView::Text { .. }));
        }
    }
}
