//! Session data types
//!
//! Wire names follow what the web client already renders (`type`,
//! `functionCall`, `isApproved`, camelCase parameter keys).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Greeting every new session starts with
pub const GREETING: &str = "Hello! I'm Campaign Genius. Describe the campaign you'd like to create in the chat, and I'll structure the data for your workflow. Or, use the form to enter details directly.";

// ============================================================================
// Messages
// ============================================================================

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Ai,
    System,
}

/// What a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    FunctionCall,
    FunctionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallData {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResultData {
    pub name: String,
    pub result: Value,
}

/// A stored chat message. Only `approved` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_result: Option<FunctionResultData>,
    #[serde(rename = "isApproved", skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_approved(&self) -> bool {
        self.approved.unwrap_or(false)
    }
}

/// A message before the store assigns its identity
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
    pub function_call: Option<FunctionCallData>,
    pub function_result: Option<FunctionResultData>,
}

impl NewMessage {
    fn text(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            sender,
            kind: MessageKind::Text,
            content: content.into(),
            function_call: None,
            function_result: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Sender::User, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::text(Sender::Ai, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Sender::System, content)
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            sender: Sender::System,
            kind: MessageKind::FunctionCall,
            content: String::new(),
            function_call: Some(FunctionCallData {
                name: name.into(),
                args,
            }),
            function_result: None,
        }
    }

    pub fn function_result(name: impl Into<String>, result: Value) -> Self {
        Self {
            sender: Sender::System,
            kind: MessageKind::FunctionResult,
            content: String::new(),
            function_call: None,
            function_result: Some(FunctionResultData {
                name: name.into(),
                result,
            }),
        }
    }

    pub fn into_message(self, id: String) -> Message {
        Message {
            id,
            sender: self.sender,
            kind: self.kind,
            content: self.content,
            function_call: self.function_call,
            function_result: self.function_result,
            approved: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Campaign parameters
// ============================================================================

/// Customer engagement tier. `Unset` serializes as the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserType {
    Power,
    Regular,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl UserType {
    /// Lenient parse of model or form output; unknown values are `Unset`
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "power" | "poweruser" => UserType::Power,
            "regular" | "regularuser" => UserType::Regular,
            "atrisk" | "atriskuser" => UserType::AtRisk,
            _ => UserType::Unset,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Power => "Power",
            UserType::Regular => "Regular",
            UserType::AtRisk => "At Risk",
            UserType::Unset => "",
        }
    }

    pub fn is_unset(self) -> bool {
        self == UserType::Unset
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the generation workflow needs to know about a campaign
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignParameters {
    pub segment_name: String,
    pub merchant_category: String,
    pub age: String,
    pub gender: String,
    pub user_type: UserType,
    pub income_bracket: String,
    pub days_onboarded: String,
    pub special_festive_season: String,
}

impl CampaignParameters {
    pub fn has_segment_name(&self) -> bool {
        !self.segment_name.trim().is_empty()
    }

    /// Lay extractor output over these parameters according to `policy`
    #[must_use]
    pub fn merged(&self, extracted: &ExtractedParameters, policy: MergePolicy) -> Self {
        fn pick(current: &str, incoming: Option<&String>, policy: MergePolicy) -> String {
            match (incoming, policy) {
                (Some(value), MergePolicy::Overwrite) => value.clone(),
                (Some(value), MergePolicy::Preserve) if !value.trim().is_empty() => {
                    value.trim().to_string()
                }
                _ => current.to_string(),
            }
        }

        let user_type = match (&extracted.user_type, policy) {
            (Some(raw), MergePolicy::Overwrite) => UserType::parse_lenient(raw),
            (Some(raw), MergePolicy::Preserve) if !UserType::parse_lenient(raw).is_unset() => {
                UserType::parse_lenient(raw)
            }
            _ => self.user_type,
        };

        Self {
            segment_name: self.segment_name.clone(),
            merchant_category: pick(
                &self.merchant_category,
                extracted.merchant_category.as_ref(),
                policy,
            ),
            age: pick(&self.age, extracted.age.as_ref(), policy),
            gender: pick(&self.gender, extracted.gender.as_ref(), policy),
            user_type,
            income_bracket: pick(
                &self.income_bracket,
                extracted.income_bracket.as_ref(),
                policy,
            ),
            days_onboarded: pick(
                &self.days_onboarded,
                extracted.days_onboarded.as_ref(),
                policy,
            ),
            special_festive_season: pick(
                &self.special_festive_season,
                extracted.special_festive_season.as_ref(),
                policy,
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Partial parameters as returned by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedParameters {
    pub merchant_category: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub user_type: Option<String>,
    pub income_bracket: Option<String>,
    pub days_onboarded: Option<String>,
    pub special_festive_season: Option<String>,
}

/// How extractor output is combined with parameters already collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Only non-empty extracted values replace existing ones
    #[default]
    Preserve,
    /// Every returned field replaces the existing one, even when empty
    Overwrite,
}

impl MergePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "preserve" => Some(MergePolicy::Preserve),
            "overwrite" => Some(MergePolicy::Overwrite),
            _ => None,
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// In-memory record of one chat session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    #[serde(skip)]
    pub checkpoint: Option<Vec<Message>>,
    pub parameters: CampaignParameters,
}

impl Session {
    pub fn has_checkpoint(&self) -> bool {
        self.checkpoint.is_some()
    }
}

/// Listing entry for a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    pub segment_name: String,
}
