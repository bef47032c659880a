//! Server-Sent Events support

use super::types::MessageView;
use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with the `init` snapshot
pub fn sse_stream(
    session_id: String,
    init: Value,
    broadcast_rx: tokio::sync::broadcast::Receiver<SseEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(event) => Some(Ok(sse_event_to_axum(&session_id, event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event_to_axum(session_id: &str, event: SseEvent) -> Event {
    let (event_type, data) = sse_payload(session_id, event);
    Event::default().event(event_type).data(data.to_string())
}

fn sse_payload(session_id: &str, event: SseEvent) -> (&'static str, Value) {
    match event {
        SseEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": MessageView::new(session_id, message)
            }),
        ),
        SseEvent::MessageUpdated { message } => (
            "message_updated",
            json!({
                "type": "message_updated",
                "message": MessageView::new(session_id, message)
            }),
        ),
        SseEvent::MessagesRestored { messages } => (
            "messages_restored",
            json!({
                "type": "messages_restored",
                "messages": MessageView::list(session_id, messages)
            }),
        ),
        SseEvent::Parameters { parameters, stage } => (
            "parameters",
            json!({
                "type": "parameters",
                "parameters": parameters,
                "stage": stage
            }),
        ),
        SseEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "busy": state.is_busy(),
                "state": state
            }),
        ),
        SseEvent::TurnComplete => (
            "turn_complete",
            json!({
                "type": "turn_complete"
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
