//! Webhook error types

use super::WebhookKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Non-2xx response carrying a JSON `message`
    #[error("{label} Error: {message} (Status: {status})")]
    Workflow {
        label: &'static str,
        status: u16,
        message: String,
    },

    /// Non-2xx response without a usable `message`
    #[error("{hook} failed with status: {status}. Response: {body}")]
    Status {
        hook: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a response
    #[error(
        "Network Error: Failed to fetch {target}. This may be a CORS or connectivity issue. \
         Please ensure the webhook server allows requests from this origin."
    )]
    Network {
        target: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// No response within the client timeout
    #[error("{hook} timed out waiting for a response")]
    Timeout {
        hook: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Anything else reqwest reports, such as an unreadable body
    #[error("{hook} request failed: {source}")]
    Request {
        hook: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl WebhookError {
    pub fn status(&self) -> Option<u16> {
        match self {
            WebhookError::Workflow { status, .. } | WebhookError::Status { status, .. } => {
                Some(*status)
            }
            WebhookError::Network { .. }
            | WebhookError::Timeout { .. }
            | WebhookError::Request { .. } => None,
        }
    }

    pub(super) fn from_reqwest(kind: WebhookKind, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            WebhookError::Timeout {
                hook: kind.hook_label(),
                source,
            }
        } else if source.is_connect() || source.is_request() {
            WebhookError::Network {
                target: kind.target(),
                source,
            }
        } else {
            WebhookError::Request {
                hook: kind.hook_label(),
                source,
            }
        }
    }

    /// Classify a non-success response body
    pub(super) fn from_response(kind: WebhookKind, status: u16, body: String) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .filter(|m| !m.is_empty());

        match message {
            Some(message) => WebhookError::Workflow {
                label: kind.workflow_label(),
                status,
                message,
            },
            None => WebhookError::Status {
                hook: kind.hook_label(),
                status,
                body,
            },
        }
    }
}
