//! Workflow webhook client
//!
//! Posts JSON to the generation and approval hooks. Response bodies are read
//! as text first and only then parsed, since the workflow answers with either
//! JSON or plain text.

mod error;

pub use error::WebhookError;

use crate::campaign::Campaign;
use crate::store::CampaignParameters;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Which of the two workflow endpoints a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Generation,
    Approval,
}

impl WebhookKind {
    pub fn workflow_label(self) -> &'static str {
        match self {
            WebhookKind::Generation => "Workflow",
            WebhookKind::Approval => "Approval Workflow",
        }
    }

    pub fn hook_label(self) -> &'static str {
        match self {
            WebhookKind::Generation => "Webhook",
            WebhookKind::Approval => "Approval webhook",
        }
    }

    pub fn target(self) -> &'static str {
        match self {
            WebhookKind::Generation => "workflow webhook",
            WebhookKind::Approval => "approval webhook",
        }
    }
}

/// Parsed webhook reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkflowResponse {
    Json(Value),
    Text(String),
}

impl WorkflowResponse {
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => WorkflowResponse::Json(value),
            Err(_) => WorkflowResponse::Text(body),
        }
    }

    /// Text stored in the chat: pretty JSON, or the raw body
    pub fn display_text(&self) -> String {
        match self {
            WorkflowResponse::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            WorkflowResponse::Text(text) => text.clone(),
        }
    }
}

/// One row of the approval payload. Keys are what the approval workflow's
/// spreadsheet columns are called.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalRecord {
    #[serde(rename = "Campaign ID")]
    pub campaign_id: String,
    #[serde(rename = "Campaign Date")]
    pub campaign_date: String,
    #[serde(rename = "Channel")]
    pub channel: Vec<String>,
    #[serde(rename = "Header")]
    pub header: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "Segment Name")]
    pub segment_name: String,
    #[serde(rename = "Merchant Category")]
    pub merchant_category: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "User Type")]
    pub user_type: String,
    #[serde(rename = "Income")]
    pub income: String,
    #[serde(rename = "Days Onboarded")]
    pub days_onboarded: String,
    #[serde(rename = "Festive season")]
    pub festive_season: String,
}

impl ApprovalRecord {
    pub fn new(campaign: &Campaign, params: &CampaignParameters) -> Self {
        Self {
            campaign_id: campaign.campaign_id.clone(),
            campaign_date: campaign.campaign_date.clone(),
            channel: campaign.channel.clone(),
            header: campaign.header.clone(),
            body: campaign.body.clone(),
            segment_name: params.segment_name.clone(),
            merchant_category: params.merchant_category.clone(),
            age: params.age.clone(),
            gender: params.gender.clone(),
            user_type: params.user_type.as_str().to_string(),
            income: params.income_bracket.clone(),
            days_onboarded: params.days_onboarded.clone(),
            festive_season: params.special_festive_season.clone(),
        }
    }
}

/// The approval hook expects a one-element array
pub fn approval_payload(campaign: &Campaign, params: &CampaignParameters) -> Vec<ApprovalRecord> {
    vec![ApprovalRecord::new(campaign, params)]
}

/// HTTP client for workflow webhooks
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        kind: WebhookKind,
        url: &str,
        payload: &T,
    ) -> Result<WorkflowResponse, WebhookError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(hook = kind.target(), error = %e, "Webhook transport failure");
                WebhookError::from_reqwest(kind, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WebhookError::from_reqwest(kind, e))?;

        if !status.is_success() {
            tracing::error!(
                hook = kind.target(),
                status = status.as_u16(),
                body = %body,
                "Webhook response error"
            );
            return Err(WebhookError::from_response(kind, status.as_u16(), body));
        }

        tracing::info!(hook = kind.target(), status = status.as_u16(), "Webhook call successful");
        Ok(WorkflowResponse::from_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserType;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn spawn_hook_server() -> String {
        let app = Router::new()
            .route(
                "/json",
                post(|| async { Json(json!({"output": [{"Campaign_ID": "C1"}]})) }),
            )
            .route("/text", post(|| async { "Workflow was started" }))
            .route(
                "/fail-json",
                post(|| async {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"message": "bad input"})),
                    )
                }),
            )
            .route(
                "/fail-text",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance") }),
            )
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .route(
                "/slow",
                post(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "too late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client() -> WebhookClient {
        WebhookClient::new(Duration::from_secs(5)).unwrap()
    }

    fn sample_campaign() -> Campaign {
        Campaign {
            campaign_id: "C1".to_string(),
            campaign_date: "2025-10-20".to_string(),
            header: "Diwali Dhamaka".to_string(),
            body: "Cashback on dining".to_string(),
            channel: vec!["Push".to_string()],
        }
    }

    #[tokio::test]
    async fn test_json_body_is_parsed() {
        let base = spawn_hook_server().await;
        let resp = client()
            .post(WebhookKind::Generation, &format!("{base}/json"), &json!({}))
            .await
            .unwrap();
        assert_eq!(resp, WorkflowResponse::Json(json!({"output": [{"Campaign_ID": "C1"}]})));
    }

    #[tokio::test]
    async fn test_text_body_is_returned_raw() {
        let base = spawn_hook_server().await;
        let resp = client()
            .post(WebhookKind::Generation, &format!("{base}/text"), &json!({}))
            .await
            .unwrap();
        assert_eq!(resp, WorkflowResponse::Text("Workflow was started".to_string()));
        assert_eq!(resp.display_text(), "Workflow was started");
    }

    #[tokio::test]
    async fn test_500_with_message() {
        let base = spawn_hook_server().await;
        let err = client()
            .post(WebhookKind::Generation, &format!("{base}/fail-json"), &json!({}))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("bad input"), "{text}");
        assert!(text.contains("500"), "{text}");
    }

    #[tokio::test]
    async fn test_503_plain_body() {
        let base = spawn_hook_server().await;
        let err = client()
            .post(WebhookKind::Approval, &format!("{base}/fail-text"), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(
            err.to_string(),
            "Approval webhook failed with status: 503. Response: down for maintenance"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Grab a free port, then close it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client()
            .post(WebhookKind::Generation, &format!("http://{addr}/hook"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Network { .. }), "{err:?}");
        assert!(err.to_string().contains("CORS"));
    }

    #[tokio::test]
    async fn test_slow_hook_is_timeout_not_network() {
        let base = spawn_hook_server().await;
        let client = WebhookClient::new(Duration::from_millis(200)).unwrap();
        let err = client
            .post(WebhookKind::Generation, &format!("{base}/slow"), &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::Timeout { .. }), "{err:?}");
        assert_eq!(err.to_string(), "Webhook timed out waiting for a response");
        assert!(!err.to_string().contains("CORS"));
    }

    #[tokio::test]
    async fn test_approval_payload_shape() {
        let base = spawn_hook_server().await;
        let params = CampaignParameters {
            segment_name: "Young Professionals".to_string(),
            merchant_category: "Dining".to_string(),
            user_type: UserType::AtRisk,
            income_bracket: "10-15 LPA".to_string(),
            special_festive_season: "Diwali".to_string(),
            ..Default::default()
        };
        let resp = client()
            .post(
                WebhookKind::Approval,
                &format!("{base}/echo"),
                &approval_payload(&sample_campaign(), &params),
            )
            .await
            .unwrap();

        let WorkflowResponse::Json(echoed) = resp else {
            panic!("expected JSON echo");
        };
        let rows = echoed.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["Campaign ID"], json!("C1"));
        assert_eq!(row["Channel"], json!(["Push"]));
        assert_eq!(row["Segment Name"], json!("Young Professionals"));
        assert_eq!(row["User Type"], json!("At Risk"));
        assert_eq!(row["Income"], json!("10-15 LPA"));
        assert_eq!(row["Festive season"], json!("Diwali"));
        assert_eq!(row["Days Onboarded"], json!(""));
    }

    #[test]
    fn test_display_text_pretty_prints_json() {
        let resp = WorkflowResponse::from_body(r#"{"a":1}"#.to_string());
        assert_eq!(resp.display_text(), "{\n  \"a\": 1\n}");
    }
}
