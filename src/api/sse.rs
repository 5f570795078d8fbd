//! Server-Sent Events support

use crate::runtime::OutgoingEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with a snapshot
pub fn sse_stream(
    init: Value,
    broadcast_rx: tokio::sync::broadcast::Receiver<OutgoingEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default().event("init").data(init.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(outgoing_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn outgoing_event_to_axum(event: OutgoingEvent) -> Event {
    let (event_type, data) = event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn event_payload(event: OutgoingEvent) -> (&'static str, Value) {
    match event {
        OutgoingEvent::Message { text } => (
            "message",
            json!({
                "type": "message",
                "text": text
            }),
        ),
        OutgoingEvent::TurnComplete { outcome, replies } => (
            "turn_complete",
            json!({
                "type": "turn_complete",
                "outcome": outcome,
                "replies": replies
            }),
        ),
        OutgoingEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
