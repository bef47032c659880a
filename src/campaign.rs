//! Campaign proposals returned by the generation workflow
//!
//! Workflow replies are stored as message text. A reply is a proposal when it
//! is a JSON object whose `output` array starts with an entry carrying a
//! `Campaign_ID`; anything else is shown as plain text.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generated campaign, using the workflow's own field names
///
/// Decoding is lenient: nulls become empty, numbers become text and a lone
/// channel string becomes a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(rename = "Campaign_ID", deserialize_with = "lenient_string")]
    pub campaign_id: String,
    #[serde(rename = "Campaign_Date", default, deserialize_with = "lenient_string")]
    pub campaign_date: String,
    #[serde(rename = "Header", default, deserialize_with = "lenient_string")]
    pub header: String,
    #[serde(rename = "Body", default, deserialize_with = "lenient_string")]
    pub body: String,
    #[serde(rename = "Channel", default, deserialize_with = "lenient_list")]
    pub channel: Vec<String>,
}

fn scalar_text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("expected a scalar, got {other}")),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    scalar_text(Value::deserialize(deserializer)?)
        .map(Option::unwrap_or_default)
        .map_err(de::Error::custom)
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| scalar_text(item).transpose())
            .collect::<Result<_, _>>()
            .map_err(de::Error::custom),
        single => scalar_text(single)
            .map(|text| text.into_iter().collect())
            .map_err(de::Error::custom),
    }
}

#[derive(Deserialize)]
struct ProposalEnvelope {
    output: Vec<Value>,
}

/// How a stored AI reply should be displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignReply {
    Proposal(Campaign),
    PlainText(String),
}

impl CampaignReply {
    pub fn parse(content: &str) -> Self {
        Self::try_proposal(content)
            .map_or_else(|| CampaignReply::PlainText(content.to_string()), CampaignReply::Proposal)
    }

    fn try_proposal(content: &str) -> Option<Campaign> {
        let envelope: ProposalEnvelope = serde_json::from_str(content.trim()).ok()?;
        let first = envelope.output.into_iter().next()?;
        first.get("Campaign_ID").filter(|id| !id.is_null())?;
        serde_json::from_value(first).ok()
    }

    pub fn proposal(&self) -> Option<&Campaign> {
        match self {
            CampaignReply::Proposal(c) => Some(c),
            CampaignReply::PlainText(_) => None,
        }
    }
}
