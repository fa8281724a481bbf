//! Progress payload for one extraction job, as pushed by the backend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side job status. `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Scheduled,
    Queued,
    Running,
    Completed,
    Failed,
    #[serde(alias = "canceled")]
    Cancelled,
    Paused,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Scheduled => "scheduled",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Paused => "paused",
        }
    }

    /// No further progress events are expected after a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known progress of a job. Replaced wholesale on every event, never merged.
///
/// Both camelCase and snake_case keys are accepted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub status: JobStatus,
    /// Percent complete as reported by the server; not assumed monotonic.
    #[serde(default, alias = "progress_pct")]
    pub progress_pct: f64,
    #[serde(default, alias = "processed_items")]
    pub processed_items: u64,
    #[serde(default, alias = "total_items")]
    pub total_items: u64,
    #[serde(default, alias = "failed_items")]
    pub failed_items: u64,
    #[serde(default, alias = "result_row_count")]
    pub result_row_count: u64,
    /// Failure reason, present on some `failed` snapshots.
    #[serde(default, alias = "error_message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProgressSnapshot {
    pub fn new(status: JobStatus, progress_pct: f64) -> Self {
        Self {
            status,
            progress_pct,
            processed_items: 0,
            total_items: 0,
            failed_items: 0,
            result_row_count: 0,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fraction complete in [0.0, 1.0], clamped for display.
    pub fn fraction(&self) -> f64 {
        if !self.progress_pct.is_finite() {
            return 0.0;
        }
        (self.progress_pct / 100.0).clamp(0.0, 1.0)
    }

    /// Items not yet processed (0 when the server reports more processed than total).
    pub fn remaining_items(&self) -> u64 {
        self.total_items.saturating_sub(self.processed_items)
    }
}
