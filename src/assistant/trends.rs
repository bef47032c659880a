//! Open-ended brainstorm with a marketing-trends function tool

use super::AssistantError;
use crate::llm::{ContentBlock, LlmMessage, LlmRequest, LlmService, ToolDefinition};
use serde_json::{json, Value};

pub const TREND_TOOL_NAME: &str = "getRecentMarketingTrends";

const BRAINSTORM_SYSTEM: &str = "You are Campaign Genius, a marketing assistant for a payments app. \
Help the user brainstorm campaign ideas. When the user mentions a merchant category, call \
getRecentMarketingTrends to ground your suggestions in what is currently working. Keep answers short \
and practical.";

/// One function call the model made and the result it was given
#[derive(Debug, Clone, PartialEq)]
pub struct ToolExchange {
    pub name: String,
    pub args: Value,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brainstorm {
    pub reply: String,
    pub exchanges: Vec<ToolExchange>,
}

fn trend_tool() -> ToolDefinition {
    ToolDefinition {
        name: TREND_TOOL_NAME.to_string(),
        description: "Get recent marketing trends that performed well for a merchant category."
            .to_string(),
        input_schema: json!({
            "type": "OBJECT",
            "properties": {
                "category": {
                    "type": "STRING",
                    "description": "The merchant category, e.g., Dining, Travel, Grocery."
                }
            },
            "required": ["category"]
        }),
    }
}

/// Local trend catalogue, keyed case-insensitively by merchant category
pub fn trend_catalogue(category: &str) -> Value {
    let trends: &[&str] = match category.trim().to_lowercase().as_str() {
        "dining" | "food" | "restaurants" => &[
            "Weekend brunch cashback bundles",
            "Late-night delivery discounts for app-first users",
            "Chef collaboration limited menus",
        ],
        "entertainment" | "movies" => &[
            "Buy-one-get-one movie tickets on weekdays",
            "Streaming subscription cashback",
            "Live concert presale access for loyal users",
        ],
        "grocery" => &[
            "Subscription refills with flat monthly discounts",
            "Festive hamper pre-orders",
            "Cashback on first quick-commerce order",
        ],
        "travel" => &[
            "Long-weekend getaway flash sales",
            "Cashback on train and bus bookings",
            "Airport lounge access for power users",
        ],
        "shopping" | "fashion" => &[
            "Festive sale early access",
            "No-cost EMI on electronics",
            "Scratch cards for repeat purchases",
        ],
        _ => &[
            "Gamified scratch-card rewards",
            "Personalised push offers timed to paydays",
            "Referral bonuses during festive seasons",
        ],
    };
    json!({ "trends": trends })
}

fn run_tool(name: &str, args: &Value) -> Value {
    if name != TREND_TOOL_NAME {
        return json!({ "error": format!("Unknown function: {name}") });
    }
    let category = args.get("category").and_then(Value::as_str).unwrap_or("");
    trend_catalogue(category)
}

pub(super) async fn brainstorm(
    llm: &dyn LlmService,
    text: &str,
) -> Result<Brainstorm, AssistantError> {
    let request = LlmRequest::prompt(text)
        .with_system(BRAINSTORM_SYSTEM)
        .with_tools(vec![trend_tool()]);
    let mut messages = request.messages.clone();

    let first = llm.complete(&request).await?;
    let calls: Vec<(String, String, Value)> = first
        .tool_uses()
        .into_iter()
        .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
        .collect();

    if calls.is_empty() {
        let reply = first.text().trim().to_string();
        if reply.is_empty() {
            return Err(AssistantError::EmptyReply);
        }
        return Ok(Brainstorm {
            reply,
            exchanges: vec![],
        });
    }

    let mut exchanges = Vec::with_capacity(calls.len());
    let mut results = Vec::with_capacity(calls.len());
    for (id, name, args) in calls {
        let result = run_tool(&name, &args);
        tracing::info!(tool = %name, %args, "Answered model function call");
        results.push(ContentBlock::tool_result(id, name.clone(), result.clone()));
        exchanges.push(ToolExchange { name, args, result });
    }

    messages.push(LlmMessage::assistant(first.content));
    messages.push(LlmMessage::user(results));
    let follow_up = LlmRequest {
        messages,
        ..request
    };

    let second = llm.complete(&follow_up).await?;
    let reply = second.text().trim().to_string();
    if reply.is_empty() {
        return Err(AssistantError::EmptyReply);
    }

    Ok(Brainstorm { reply, exchanges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, LlmResponse, MessageRole};
    use crate::runtime::testing::MockLlm;

    fn tool_call(category: &str) -> LlmResponse {
        LlmResponse {
            content: vec![ContentBlock::ToolUse {
                id: "call_getRecentMarketingTrends_0".to_string(),
                name: TREND_TOOL_NAME.to_string(),
                input: json!({ "category": category }),
            }],
            ..LlmResponse::default()
        }
    }

    #[tokio::test]
    async fn test_plain_answer_without_tool() {
        let llm = MockLlm::new();
        llm.queue_text("Try a cashback campaign.");
        let result = brainstorm(&llm, "ideas?").await.unwrap();
        assert_eq!(result.reply, "Try a cashback campaign.");
        assert!(result.exchanges.is_empty());

        let request = &llm.recorded_requests()[0];
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, TREND_TOOL_NAME);
        assert_eq!(request.system.as_deref(), Some(BRAINSTORM_SYSTEM));
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let llm = MockLlm::new();
        llm.queue_response(tool_call("Travel"));
        llm.queue_text("Go with long-weekend flash sales.");

        let result = brainstorm(&llm, "What works for travel?").await.unwrap();
        assert_eq!(result.reply, "Go with long-weekend flash sales.");
        assert_eq!(result.exchanges.len(), 1);
        assert_eq!(result.exchanges[0].args, json!({"category": "Travel"}));
        assert_eq!(result.exchanges[0].result, trend_catalogue("travel"));

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1].messages;
        assert_eq!(follow_up.len(), 3);
        assert_eq!(follow_up[1].role, MessageRole::Assistant);
        assert!(matches!(
            &follow_up[2].content[0],
            ContentBlock::ToolResult { name, .. } if name == TREND_TOOL_NAME
        ));
    }

    #[test]
    fn test_catalogue_fallback_and_unknown_tool() {
        let generic = trend_catalogue("Pet Supplies");
        assert_eq!(generic["trends"].as_array().unwrap().len(), 3);
        assert_ne!(trend_catalogue("DINING"), generic);

        let unknown = run_tool("getWeather", &json!({}));
        assert_eq!(unknown["error"], json!("Unknown function: getWeather"));
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let llm = MockLlm::new();
        llm.queue_response(tool_call("Dining"));
        llm.queue_error(LlmError::network("reset"));
        let err = brainstorm(&llm, "dining ideas").await.unwrap_err();
        assert_eq!(err.to_string(), "reset");
    }
}
