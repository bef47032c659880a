//! Free text to campaign parameters

use super::{strip_code_fence, AssistantError};
use crate::llm::{LlmRequest, LlmService};
use crate::store::{ExtractedParameters, UserType};
use serde_json::{json, Map, Value};

fn campaign_schema() -> Value {
    let field = |description: &str| json!({ "type": "STRING", "description": description });
    json!({
        "type": "OBJECT",
        "properties": {
            "merchantCategory": field("The category of merchant, e.g., Dining, Entertainment, Food, Grocery, Travel, Shopping."),
            "age": field("The age of the target customer."),
            "gender": field("The gender of the target customer (e.g., Male, Female)."),
            "userType": field("The type of user (Power, Regular, At Risk)."),
            "incomeBracket": field("The annual income bracket of the user, e.g., 10-15 LPA."),
            "daysOnboarded": field("The number of days the user has been onboarded."),
            "specialFestiveSeason": field("Any special festive season mentioned, e.g., Diwali, Eid, Holi, Christmas.")
        }
    })
}

fn extraction_prompt(text: &str) -> String {
    format!(
        "Analyze the user's request and extract the campaign parameters based on the provided schema. \
         Only fill in the values that are explicitly mentioned in the request. The user's request is: \"{text}\""
    )
}

/// Read a field as a string. Models sometimes answer numbers for `age` or
/// `daysOnboarded`.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_extraction(text: &str) -> Result<ExtractedParameters, AssistantError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AssistantError::Extraction(format!("Invalid JSON from model: {e}")))?;
    let Value::Object(map) = value else {
        return Err(AssistantError::Extraction(
            "Expected a JSON object from model".to_string(),
        ));
    };

    Ok(ExtractedParameters {
        merchant_category: string_field(&map, "merchantCategory"),
        age: string_field(&map, "age"),
        gender: string_field(&map, "gender"),
        user_type: string_field(&map, "userType")
            .map(|raw| UserType::parse_lenient(&raw).as_str().to_string()),
        income_bracket: string_field(&map, "incomeBracket"),
        days_onboarded: string_field(&map, "daysOnboarded"),
        special_festive_season: string_field(&map, "specialFestiveSeason"),
    })
}

pub(super) async fn extract(
    llm: &dyn LlmService,
    text: &str,
) -> Result<ExtractedParameters, AssistantError> {
    let request = LlmRequest::prompt(extraction_prompt(text)).with_schema(campaign_schema());
    let response = llm.complete(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Error analyzing prompt with AI");
        AssistantError::Extraction(e.message)
    })?;

    let extracted = parse_extraction(&response.text())?;
    tracing::debug!(?extracted, "Extracted campaign parameters");
    Ok(extracted)
}
