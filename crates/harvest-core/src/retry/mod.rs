//! Reconnect policy for the progress push channel.
//!
//! This module encapsulates transport error classification (timeouts,
//! throttling, connection failures) and exponential backoff decisions so the
//! stream client can apply one consistent, opt-in reconnect policy.

mod classify;
mod policy;

pub use classify::{classify, classify_http_status};
pub use policy::{ErrorKind, ReconnectDecision, ReconnectPolicy};
