//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::assistant::{AssistantError, Brainstorm, Validation};
use crate::campaign::Campaign;
use crate::llm::{ContentBlock, LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::InputContext;
use crate::store::{CampaignParameters, ExtractedParameters};
use crate::webhook::{WebhookError, WorkflowResponse};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock LLM Service
// ============================================================================

/// Mock LLM service that returns queued responses
#[derive(Default)]
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a response with one text block
    pub fn queue_text(&self, text: &str) {
        self.queue_response(LlmResponse {
            content: vec![ContentBlock::text(text)],
            ..LlmResponse::default()
        });
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// All text blocks of a request, concatenated
pub fn request_text(request: &LlmRequest) -> String {
    request
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Mock Assistant
// ============================================================================

/// Mock assistant with queued outcomes. Empty queues answer with
/// accepting defaults.
#[derive(Default)]
pub struct MockAssistant {
    validations: Mutex<VecDeque<Validation>>,
    extractions: Mutex<VecDeque<Result<ExtractedParameters, AssistantError>>>,
    celebrations: Mutex<VecDeque<String>>,
    brainstorms: Mutex<VecDeque<Result<Brainstorm, AssistantError>>>,
    delay: Option<Duration>,
    /// Record of validated inputs
    pub validated: Mutex<Vec<(String, InputContext)>>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to hold the session busy
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_validation(&self, validation: Validation) {
        self.validations.lock().unwrap().push_back(validation);
    }

    pub fn queue_extraction(&self, result: Result<ExtractedParameters, AssistantError>) {
        self.extractions.lock().unwrap().push_back(result);
    }

    pub fn queue_celebration(&self, text: &str) {
        self.celebrations.lock().unwrap().push_back(text.to_string());
    }

    pub fn queue_brainstorm(&self, result: Result<Brainstorm, AssistantError>) {
        self.brainstorms.lock().unwrap().push_back(result);
    }

    pub fn recorded_validations(&self) -> Vec<(String, InputContext)> {
        self.validated.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CampaignAssistant for MockAssistant {
    async fn validate(&self, text: &str, context: InputContext) -> Validation {
        self.validated
            .lock()
            .unwrap()
            .push((text.to_string(), context));
        self.pause().await;
        self.validations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Validation::valid)
    }

    async fn extract(&self, _text: &str) -> Result<ExtractedParameters, AssistantError> {
        self.pause().await;
        self.extractions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ExtractedParameters::default()))
    }

    async fn celebrate(&self, campaign: &Campaign) -> String {
        self.pause().await;
        self.celebrations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| crate::assistant::fallback_celebration(campaign))
    }

    async fn brainstorm(&self, _text: &str) -> Result<Brainstorm, AssistantError> {
        self.pause().await;
        self.brainstorms
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AssistantError::EmptyReply))
    }
}

// ============================================================================
// Mock Workflow
// ============================================================================

/// Mock workflow client recording every payload
#[derive(Default)]
pub struct MockWorkflow {
    generate_results: Mutex<VecDeque<Result<WorkflowResponse, WebhookError>>>,
    approve_results: Mutex<VecDeque<Result<WorkflowResponse, WebhookError>>>,
    /// Parameters posted to the generation hook
    pub generated: Mutex<Vec<CampaignParameters>>,
    /// Campaigns posted to the approval hook
    pub approved: Mutex<Vec<(Campaign, CampaignParameters)>>,
}

impl MockWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_generate(&self, result: Result<WorkflowResponse, WebhookError>) {
        self.generate_results.lock().unwrap().push_back(result);
    }

    pub fn queue_approve(&self, result: Result<WorkflowResponse, WebhookError>) {
        self.approve_results.lock().unwrap().push_back(result);
    }

    pub fn recorded_generations(&self) -> Vec<CampaignParameters> {
        self.generated.lock().unwrap().clone()
    }

    pub fn recorded_approvals(&self) -> Vec<(Campaign, CampaignParameters)> {
        self.approved.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowClient for MockWorkflow {
    async fn generate(
        &self,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError> {
        self.generated.lock().unwrap().push(parameters.clone());
        self.generate_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WorkflowResponse::Json(json!({"message": "Workflow was started"}))))
    }

    async fn approve(
        &self,
        campaign: &Campaign,
        parameters: &CampaignParameters,
    ) -> Result<WorkflowResponse, WebhookError> {
        self.approved
            .lock()
            .unwrap()
            .push((campaign.clone(), parameters.clone()));
        self.approve_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WorkflowResponse::Text("Accepted".to_string())))
    }
}
