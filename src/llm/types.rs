//! Common types for LLM interactions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// LLM request
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub tools: Vec<ToolDefinition>,
    /// When set, the provider is asked for JSON matching this schema
    pub response_schema: Option<Value>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Single-turn request with one user text message
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![LlmMessage::user(vec![ContentBlock::text(text)])],
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// Message in conversation
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl LlmMessage {
    pub fn user(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content,
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// Content block in a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Gemini matches function responses by name, so the name travels with the result
    ToolResult {
        tool_use_id: String,
        name: String,
        content: Value,
    },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    pub fn tool_result(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        content: Value,
    ) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            content,
        }
    }
}

/// Tool definition
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl LlmResponse {
    /// Extract all tool use requests from the response
    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }

    /// Get text content from the response
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_text_blocks_only() {
        let response = LlmResponse {
            content: vec![
                ContentBlock::text("Hello, "),
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "getRecentMarketingTrends".to_string(),
                    input: json!({"category": "Dining"}),
                },
                ContentBlock::text("world"),
            ],
            usage: Usage::default(),
        };
        assert_eq!(response.text(), "Hello, world");
        assert_eq!(response.tool_uses().len(), 1);
        assert_eq!(response.tool_uses()[0].1, "getRecentMarketingTrends");
    }

    #[test]
    fn test_prompt_builder() {
        let request = LlmRequest::prompt("hi")
            .with_system("be brief")
            .with_schema(json!({"type": "OBJECT"}));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert!(request.response_schema.is_some());
        assert!(request.tools.is_empty());
    }
}
