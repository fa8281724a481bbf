//! Classify HTTP status and transport errors into reconnect error kinds.

use crate::progress::TransportError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code for reconnect decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a channel failure into an ErrorKind.
pub fn classify(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Timeout(_) => ErrorKind::Timeout,
        TransportError::Connect(_) | TransportError::Read(_) | TransportError::StreamEnded => {
            ErrorKind::Connection
        }
        TransportError::Http(code) => classify_http_status(*code),
    }
}
