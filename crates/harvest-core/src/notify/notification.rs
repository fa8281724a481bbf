use std::fmt;
use std::time::Duration;

use super::kind::NotificationKind;

/// Unique per process; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl NotificationId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visible until a timeout or an explicit dismiss; then dismissing for the
/// exit window; then removed from the store. Never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Visible,
    Dismissing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    /// Auto-dismiss after this long; `None` persists until dismissed.
    pub duration: Option<Duration>,
    pub phase: Phase,
}

impl Notification {
    pub fn is_visible(&self) -> bool {
        self.phase == Phase::Visible
    }
}
