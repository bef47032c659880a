//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::assistant::{AssistantError, Brainstorm, GeminiAssistant, Validation};
use crate::campaign::Campaign;
use crate::state_machine::InputContext;
use crate::store::{CampaignParameters, ExtractedParameters};
use crate::webhook::{approval_payload, WebhookClient, WebhookError, WebhookKind, WorkflowResponse};
use async_trait::async_trait;

/// AI calls a turn can make
#[async_trait]
pub trait CampaignAssistant: Send + Sync {
    /// Classify input for the given stage. Never fails.
    async fn validate(&self, text: &str, context: InputContext) -> Validation;

    /// Extract partial campaign parameters from free text
    async fn extract(&self, text: &str) -> Result<ExtractedParameters, AssistantError>;

    /// Congratulation text for an approved campaign. Never fails.
    async fn celebrate(&self, campaign: &Campaign) -> String;

    /// Open-ended answer, possibly after calling the trends tool
    async fn brainstorm(&self, text: &str) -> Result<Brainstorm, AssistantError>;
}

/// External workflow endpoints
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Post parameters to the generation workflow
    async fn generate(
        &self,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError>;

    /// Post an approved campaign to the approval workflow
    async fn approve(
        &self,
        campaign: &Campaign,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError>;
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl CampaignAssistant for GeminiAssistant {
    async fn validate(&self, text: &str, context: InputContext) -> Validation {
        GeminiAssistant::validate(self, text, context).await
    }

    async fn extract(&self, text: &str) -> Result<ExtractedParameters, AssistantError> {
        GeminiAssistant::extract(self, text).await
    }

    async fn celebrate(&self, campaign: &Campaign) -> String {
        GeminiAssistant::celebrate(self, campaign).await
    }

    async fn brainstorm(&self, text: &str) -> Result<Brainstorm, AssistantError> {
        GeminiAssistant::brainstorm(self, text).await
    }
}

/// Adapter posting to the two configured webhooks
pub struct HttpWorkflow {
    client: WebhookClient,
    generation_url: String,
    approval_url: String,
}

impl HttpWorkflow {
    pub fn new(
        client: WebhookClient,
        generation_url: impl Into<String>,
        approval_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            generation_url: generation_url.into(),
            approval_url: approval_url.into(),
        }
    }
}

#[async_trait]
impl WorkflowClient for HttpWorkflow {
    async fn generate(
        &self,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError> {
        self.client
            .post(WebhookKind::Generation, &self.generation_url, parameters)
            .await
    }

    async fn approve(
        &self,
        campaign: &Campaign,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError> {
        let payload = approval_payload(campaign, parameters);
        self.client
            .post(WebhookKind::Approval, &self.approval_url, &payload)
            .await
    }
}
