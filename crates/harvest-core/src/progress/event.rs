//! Typed events of the job progress channel.

use super::snapshot::ProgressSnapshot;
use super::sse::SseFrame;

pub const EVENT_PROGRESS: &str = "progress";
pub const EVENT_DONE: &str = "done";

/// A decoded progress-channel event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Intermediate progress; replaces the current snapshot.
    Progress(ProgressSnapshot),
    /// The producer sends nothing more for this job. The final payload is
    /// best-effort: `None` when it was missing or malformed.
    Done(Option<ProgressSnapshot>),
    /// Any other event type; ignored by the client.
    Other(String),
}

/// Decode one frame. Returns `None` for a `progress` frame whose payload
/// cannot be parsed: that event is dropped and the subscription stays open.
pub fn decode(frame: &SseFrame) -> Option<StreamEvent> {
    match frame.event.as_str() {
        EVENT_PROGRESS => match serde_json::from_str::<ProgressSnapshot>(&frame.data) {
            Ok(snapshot) => Some(StreamEvent::Progress(snapshot)),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed progress payload");
                None
            }
        },
        EVENT_DONE => Some(StreamEvent::Done(
            serde_json::from_str::<ProgressSnapshot>(&frame.data).ok(),
        )),
        other => Some(StreamEvent::Other(other.to_string())),
    }
}
