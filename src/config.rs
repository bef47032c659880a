//! Startup configuration read from the environment

use crate::llm::GeminiModel;
use crate::store::MergePolicy;
use std::time::Duration;

pub const DEFAULT_GENERATION_WEBHOOK: &str =
    "https://subhadevp.app.n8n.cloud/webhook-test/09e1de49-2634-424d-a0d3-52deaa861da6";
pub const DEFAULT_APPROVAL_WEBHOOK: &str =
    "https://subhadevp.app.n8n.cloud/webhook-test/4e00e3d9-587c-4e17-a287-56d77ee0d684";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PORT: u16 = 8000;

/// Everything the server needs, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub gateway: Option<String>,
    pub model: GeminiModel,
    pub generation_webhook: String,
    pub approval_webhook: String,
    pub merge_policy: MergePolicy,
    pub http_timeout: Duration,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway: None,
            model: GeminiModel::Gemini25Flash,
            generation_webhook: DEFAULT_GENERATION_WEBHOOK.to_string(),
            approval_webhook: DEFAULT_APPROVAL_WEBHOOK.to_string(),
            merge_policy: MergePolicy::default(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset; malformed
    /// values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let model = get("CAMPAIGN_MODEL").map_or(defaults.model, |name| {
            GeminiModel::from_name(&name).unwrap_or_else(|| {
                tracing::warn!(model = %name, "Unknown model, using default");
                defaults.model
            })
        });

        let merge_policy = get("CAMPAIGN_MERGE_POLICY").map_or(defaults.merge_policy, |name| {
            MergePolicy::from_name(&name).unwrap_or_else(|| {
                tracing::warn!(policy = %name, "Unknown merge policy, using default");
                defaults.merge_policy
            })
        });

        let http_timeout = get("CAMPAIGN_HTTP_TIMEOUT_SECS")
            .and_then(|v| parse_or_warn::<u64>("CAMPAIGN_HTTP_TIMEOUT_SECS", &v))
            .map_or(defaults.http_timeout, Duration::from_secs);

        let port = get("CAMPAIGN_PORT")
            .and_then(|v| parse_or_warn("CAMPAIGN_PORT", &v))
            .unwrap_or(defaults.port);

        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            gateway: get("LLM_GATEWAY"),
            model,
            generation_webhook: get("CAMPAIGN_GENERATION_WEBHOOK")
                .unwrap_or(defaults.generation_webhook),
            approval_webhook: get("CAMPAIGN_APPROVAL_WEBHOOK").unwrap_or(defaults.approval_webhook),
            merge_policy,
            http_timeout,
            port,
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(key, value, "Ignoring malformed setting");
    }
    parsed
}
