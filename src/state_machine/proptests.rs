//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::assistant::{Brainstorm, ToolExchange, Validation};
use crate::campaign::Campaign;
use crate::store::{CampaignParameters, ExtractedParameters, MergePolicy, UserType};
use crate::webhook::WorkflowResponse;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context(parameters: CampaignParameters, has_checkpoint: bool) -> TurnContext {
    TurnContext {
        session_id: "test-session".to_string(),
        parameters,
        has_checkpoint,
        merge_policy: MergePolicy::Preserve,
    }
}

fn turn_completes(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::TurnComplete))
        .count()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[ ]{0,2}[a-zA-Z_ ]{0,20}[ ]{0,2}"
}

fn arb_user_type() -> impl Strategy<Value = UserType> {
    prop_oneof![
        Just(UserType::Power),
        Just(UserType::Regular),
        Just(UserType::AtRisk),
        Just(UserType::Unset),
    ]
}

fn arb_parameters() -> impl Strategy<Value = CampaignParameters> {
    (
        prop_oneof![Just(String::new()), "[A-Za-z ]{1,12}"],
        "[A-Za-z]{0,8}",
        "[0-9]{0,2}",
        arb_user_type(),
    )
        .prop_map(
            |(segment_name, merchant_category, age, user_type)| CampaignParameters {
                segment_name,
                merchant_category,
                age,
                user_type,
                ..Default::default()
            },
        )
}

fn arb_extracted() -> impl Strategy<Value = ExtractedParameters> {
    (
        proptest::option::of("[A-Za-z ]{0,8}"),
        proptest::option::of("[0-9 ]{0,3}"),
        proptest::option::of(prop_oneof![
            Just("Power".to_string()),
            Just("at risk".to_string()),
            Just(String::new()),
            "[a-z]{1,6}"
        ]),
    )
        .prop_map(|(merchant_category, age, user_type)| ExtractedParameters {
            merchant_category,
            age,
            user_type,
            ..Default::default()
        })
}

fn arb_campaign() -> impl Strategy<Value = Campaign> {
    ("C[0-9]{1,3}", "[A-Za-z ]{1,15}").prop_map(|(campaign_id, header)| Campaign {
        campaign_id,
        campaign_date: "2025-10-20".to_string(),
        header,
        body: "Body".to_string(),
        channel: vec!["Push".to_string()],
    })
}

fn arb_busy_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        (arb_text(), prop_oneof![
            Just(InputContext::SegmentName),
            Just(InputContext::CampaignDetails)
        ])
            .prop_map(|(text, context)| TurnState::Validating { context, text }),
        arb_text().prop_map(|text| TurnState::Extracting { text }),
        prop_oneof![Just(DispatchOrigin::Chat), Just(DispatchOrigin::Profile)]
            .prop_map(|origin| TurnState::Dispatching { origin }),
        arb_campaign().prop_map(|campaign| TurnState::Approving {
            message_id: "m1".to_string(),
            campaign
        }),
        arb_campaign().prop_map(|campaign| TurnState::Celebrating {
            message_id: "m1".to_string(),
            campaign
        }),
        Just(TurnState::Brainstorming),
    ]
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_text().prop_map(|text| Event::UserText { text }),
        arb_parameters().prop_map(|parameters| Event::ProfileEdited { parameters }),
        Just(Event::ProfileSubmitted),
        arb_campaign().prop_map(|campaign| Event::ApproveRequested {
            message_id: "m1".to_string(),
            campaign
        }),
        Just(Event::RestoreRequested),
        arb_text().prop_map(|text| Event::BrainstormRequested { text }),
    ]
}

fn arb_error() -> impl Strategy<Value = String> {
    "[A-Za-z ]{1,20}"
}

fn arb_result_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (any::<bool>(), proptest::option::of("[A-Za-z ]{0,10}")).prop_map(|(is_valid, feedback)| {
            Event::ValidationComplete {
                validation: Validation { is_valid, feedback },
            }
        }),
        prop_oneof![
            arb_extracted().prop_map(Ok::<_, String>),
            arb_error().prop_map(Err)
        ]
        .prop_map(|result| Event::ExtractionComplete { result }),
        prop_oneof![
            Just(Ok::<_, String>(WorkflowResponse::Json(json!({"output": []})))),
            arb_error().prop_map(Err)
        ]
        .prop_map(|result| Event::WorkflowComplete { result }),
        prop_oneof![
            Just(Ok::<_, String>(WorkflowResponse::Text("ok".to_string()))),
            arb_error().prop_map(Err)
        ]
        .prop_map(|result| Event::ApprovalComplete { result }),
        "[A-Za-z ]{1,20}".prop_map(|text| Event::CelebrationComplete { text }),
        prop_oneof![
            Just(Ok::<_, String>(Brainstorm {
                reply: "idea".to_string(),
                exchanges: vec![ToolExchange {
                    name: "getRecentMarketingTrends".to_string(),
                    args: json!({"category": "Dining"}),
                    result: json!({"trends": []}),
                }],
            })),
            arb_error().prop_map(Err)
        ]
        .prop_map(|result| Event::BrainstormComplete { result }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![arb_user_event(), arb_result_event()]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // A busy session never starts a second turn
    #[test]
    fn prop_busy_rejects_every_user_event(
        state in arb_busy_state(),
        event in arb_user_event(),
        params in arb_parameters(),
        has_checkpoint in any::<bool>(),
    ) {
        let ctx = test_context(params, has_checkpoint);
        let result = transition(&state, &ctx, event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::SessionBusy);
    }

    // Turn completion is announced exactly when the session returns to idle
    #[test]
    fn prop_turn_complete_iff_idle(
        events in proptest::collection::vec(arb_event(), 0..30),
        params in arb_parameters(),
    ) {
        let mut state = TurnState::Idle;
        let ctx = test_context(params, true);

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                let completes = turn_completes(&result.effects);
                if result.new_state.is_busy() {
                    prop_assert_eq!(completes, 0, "busy state {:?} completed a turn", result.new_state);
                } else {
                    prop_assert_eq!(completes, 1, "idle state without turn_complete");
                    prop_assert_eq!(result.effects.last(), Some(&Effect::TurnComplete));
                }
                state = result.new_state;
            }
        }
    }

    // Every I/O effect is the last effect and leaves the session busy
    #[test]
    fn prop_io_effect_only_when_busy(
        events in proptest::collection::vec(arb_event(), 0..30),
        params in arb_parameters(),
    ) {
        let mut state = TurnState::Idle;
        let ctx = test_context(params, false);

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                let io: Vec<usize> = result
                    .effects
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.is_io())
                    .map(|(i, _)| i)
                    .collect();
                prop_assert!(io.len() <= 1);
                if let Some(&i) = io.first() {
                    prop_assert_eq!(i, result.effects.len() - 1);
                    prop_assert!(result.new_state.is_busy());
                }
                state = result.new_state;
            }
        }
    }

    // Rejected segment names never touch the parameters
    #[test]
    fn prop_invalid_segment_leaves_parameters(
        text in arb_text(),
        feedback in proptest::option::of("[A-Za-z ]{1,10}"),
    ) {
        let state = TurnState::Validating { context: InputContext::SegmentName, text };
        let ctx = test_context(CampaignParameters::default(), false);
        let result = transition(
            &state,
            &ctx,
            Event::ValidationComplete { validation: Validation { is_valid: false, feedback } },
        ).unwrap();

        prop_assert!(!result.effects.iter().any(|e| matches!(e, Effect::SetParameters(_))));
        let added = result.effects.iter().filter(|e| matches!(e, Effect::AddMessage(_))).count();
        prop_assert_eq!(added, 1);
    }

    // Accepted segment names are stored trimmed
    #[test]
    fn prop_segment_name_is_trimmed(text in "[ ]{0,3}[A-Za-z_]{1,12}[ ]{0,3}") {
        let state = TurnState::Validating { context: InputContext::SegmentName, text: text.clone() };
        let ctx = test_context(CampaignParameters::default(), false);
        let result = transition(
            &state,
            &ctx,
            Event::ValidationComplete { validation: Validation::valid() },
        ).unwrap();

        match &result.effects[0] {
            Effect::SetParameters(p) => prop_assert_eq!(&p.segment_name, text.trim()),
            other => prop_assert!(false, "unexpected effect {:?}", other),
        }
    }

    // Preserve merge never clears a field that already has a value
    #[test]
    fn prop_preserve_never_clears(params in arb_parameters(), extracted in arb_extracted()) {
        let merged = params.merged(&extracted, MergePolicy::Preserve);
        prop_assert_eq!(&merged.segment_name, &params.segment_name);
        if !params.merchant_category.is_empty() {
            prop_assert!(!merged.merchant_category.is_empty());
        }
        if !params.age.is_empty() {
            prop_assert!(!merged.age.is_empty());
        }
        if !params.user_type.is_unset() {
            prop_assert!(!merged.user_type.is_unset());
        }
    }
}
