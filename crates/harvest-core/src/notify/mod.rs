//! Ephemeral user-facing notifications.
//!
//! Any code path can call `notify::success(..)` and friends; they go through
//! the process-wide `NotificationCenter`. Consumers render
//! `NotificationCenter::global().store()` and subscribe to its changes.
//! The free functions need a tokio runtime for auto-dismiss timers.

mod kind;
mod lifecycle;
mod notification;
mod store;


pub use kind::{NotificationKind, UnknownKind};
pub use lifecycle::NotificationCenter;
pub use notification::{Notification, NotificationId, Phase};
pub use store::NotificationStore;

pub fn add(
    kind: NotificationKind,
    title: impl Into<String>,
    message: Option<&str>,
    duration_ms: Option<i64>,
) -> NotificationId {
    NotificationCenter::global().add(kind, title, message, duration_ms)
}

pub fn success(title: impl Into<String>, message: Option<&str>) -> NotificationId {
    NotificationCenter::global().success(title, message)
}

pub fn error(title: impl Into<String>, message: Option<&str>) -> NotificationId {
    NotificationCenter::global().error(title, message)
}

pub fn warning(title: impl Into<String>, message: Option<&str>) -> NotificationId {
    NotificationCenter::global().warning(title, message)
}

pub fn info(title: impl Into<String>, message: Option<&str>) -> NotificationId {
    NotificationCenter::global().info(title, message)
}

pub fn dismiss(id: NotificationId) {
    NotificationCenter::global().dismiss(id)
}
