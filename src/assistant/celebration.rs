//! Approval success message

use crate::campaign::Campaign;
use crate::llm::{LlmRequest, LlmService};

pub fn fallback_celebration(campaign: &Campaign) -> String {
    format!(
        "Congratulations! The campaign \"{}\" has been successfully approved and created.",
        campaign.header
    )
}

pub(super) async fn celebrate(llm: &dyn LlmService, campaign: &Campaign) -> String {
    let prompt = format!(
        "A marketing campaign has been successfully approved and created. Generate a short, cheerful, \
         and professional congratulatory success message for the product manager. Mention the campaign \
         header which is \"{}\".",
        campaign.header
    );

    match llm.complete(&LlmRequest::prompt(prompt)).await {
        Ok(response) => {
            let text = response.text();
            let text = text.trim();
            if text.is_empty() {
                tracing::warn!(campaign_id = %campaign.campaign_id, "Empty celebration reply, using fallback");
                fallback_celebration(campaign)
            } else {
                text.to_string()
            }
        }
        Err(e) => {
            tracing::warn!(campaign_id = %campaign.campaign_id, error = %e, "Celebration call failed, using fallback");
            fallback_celebration(campaign)
        }
    }
}
