//! RAII accounting for open push channels.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts one open channel for as long as it lives.
pub(super) struct ChannelGuard {
    open: Arc<AtomicUsize>,
    job_id: String,
}

impl ChannelGuard {
    pub(super) fn new(open: &Arc<AtomicUsize>, job_id: &str) -> Self {
        let now_open = open.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(job_id, open_channels = now_open, "progress channel opened");
        Self {
            open: Arc::clone(open),
            job_id: job_id.to_string(),
        }
    }
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        let left = self.open.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        tracing::debug!(job_id = %self.job_id, open_channels = left, "progress channel closed");
    }
}
