use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intent of a notification; drives how a consumer styles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }

    /// Parse a kind coming from untyped call sites.
    ///
    /// An unknown kind is a programmer error: it panics in debug builds and
    /// falls back to `Info` (with a warning) in release builds.
    pub fn parse_or_info(s: &str) -> NotificationKind {
        match s.parse() {
            Ok(kind) => kind,
            Err(e) => {
                debug_assert!(false, "{e}");
                tracing::warn!(error = %e, "defaulting notification kind to info");
                NotificationKind::Info
            }
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification kind {0:?} (expected success, error, warning or info)")]
pub struct UnknownKind(pub String);

impl FromStr for NotificationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(NotificationKind::Success),
            "error" => Ok(NotificationKind::Error),
            "warning" => Ok(NotificationKind::Warning),
            "info" => Ok(NotificationKind::Info),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}
