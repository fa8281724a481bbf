//! Observable per-subscription state and the single writer that guards it.
//!
//! Every mutation goes through `watch::Sender::send_if_modified`, whose
//! closure runs under the channel's write lock. `Closed` is final and is
//! checked in the same closure, so "is this subscription still wanted?" and
//! "apply the snapshot" happen atomically: once `cancel` returns, no task
//! that was already in flight can change the snapshot.

use std::sync::Arc;

use tokio::sync::watch;

use super::snapshot::ProgressSnapshot;
use super::transport::TransportError;

/// Lifecycle of the underlying push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No channel was opened (disabled, no credential, empty job id).
    #[default]
    Inactive,
    /// Opening, or waiting to reopen after a transport error.
    Connecting,
    Open,
    Closed,
}

/// Why a channel reached `ChannelState::Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The job reached a terminal state (`done` event or terminal snapshot).
    Done,
    /// The transport failed and no reconnect was attempted or left.
    TransportError(TransportError),
    /// The consumer lost interest.
    Unsubscribed,
}

/// What a consumer renders: the latest snapshot and a live indicator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressView {
    pub snapshot: Option<ProgressSnapshot>,
    pub is_connected: bool,
    pub channel: ChannelState,
    pub close_reason: Option<CloseReason>,
}

impl ProgressView {
    /// True once the channel can deliver nothing more (or was never opened).
    pub fn is_finished(&self) -> bool {
        matches!(self.channel, ChannelState::Closed | ChannelState::Inactive)
    }
}

#[derive(Clone)]
pub(crate) struct ViewCell {
    tx: Arc<watch::Sender<ProgressView>>,
}

impl ViewCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressView::default());
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ProgressView> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> ProgressView {
        self.tx.borrow().clone()
    }

    fn writable(view: &ProgressView) -> bool {
        view.channel != ChannelState::Closed
    }

    /// Channel is being opened (first attempt or reconnect). Keeps the last snapshot.
    pub(crate) fn connecting(&self) -> bool {
        self.tx.send_if_modified(|v| {
            if !Self::writable(v) {
                return false;
            }
            v.channel = ChannelState::Connecting;
            v.is_connected = false;
            true
        })
    }

    pub(crate) fn opened(&self) -> bool {
        self.tx.send_if_modified(|v| {
            if !Self::writable(v) {
                return false;
            }
            v.channel = ChannelState::Open;
            true
        })
    }

    /// Replace the snapshot wholesale. Returns false if the subscription is gone.
    pub(crate) fn apply(&self, snapshot: ProgressSnapshot) -> bool {
        self.tx.send_if_modified(|v| {
            if !Self::writable(v) {
                return false;
            }
            v.snapshot = Some(snapshot);
            v.is_connected = true;
            v.channel = ChannelState::Open;
            true
        })
    }

    /// Close from inside the channel task (done or transport failure).
    pub(crate) fn close(&self, last: Option<ProgressSnapshot>, reason: CloseReason) -> bool {
        self.tx.send_if_modified(|v| {
            if !Self::writable(v) {
                return false;
            }
            if let Some(s) = last {
                v.snapshot = Some(s);
            }
            v.is_connected = false;
            v.channel = ChannelState::Closed;
            v.close_reason = Some(reason);
            true
        })
    }

    /// Consumer-side cancellation. Idempotent; keeps the last snapshot for display.
    /// An inactive view has no channel task and stays inactive.
    pub(crate) fn cancel(&self) {
        self.tx.send_if_modified(|v| {
            if matches!(v.channel, ChannelState::Inactive | ChannelState::Closed) {
                return false;
            }
            v.is_connected = false;
            v.channel = ChannelState::Closed;
            v.close_reason = Some(CloseReason::Unsubscribed);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::snapshot::JobStatus;

    #[test]
    fn apply_sets_connected_and_replaces_snapshot() {
        let cell = ViewCell::new();
        assert!(cell.connecting());
        assert!(cell.apply(ProgressSnapshot::new(JobStatus::Running, 40.0)));
        assert!(cell.apply(ProgressSnapshot::new(JobStatus::Running, 35.0)));
        let v = cell.current();
        assert!(v.is_connected);
        assert_eq!(v.channel, ChannelState::Open);
        assert_eq!(v.snapshot.unwrap().progress_pct, 35.0);
    }

    #[test]
    fn nothing_applies_after_cancel() {
        let cell = ViewCell::new();
        cell.connecting();
        cell.apply(ProgressSnapshot::new(JobStatus::Running, 10.0));
        cell.cancel();
        assert!(!cell.apply(ProgressSnapshot::new(JobStatus::Running, 90.0)));
        assert!(!cell.close(
            Some(ProgressSnapshot::new(JobStatus::Completed, 100.0)),
            CloseReason::Done
        ));
        let v = cell.current();
        assert_eq!(v.snapshot.unwrap().progress_pct, 10.0);
        assert!(!v.is_connected);
        assert_eq!(v.channel, ChannelState::Closed);
        assert_eq!(v.close_reason, Some(CloseReason::Unsubscribed));
    }

    #[test]
    fn close_is_final() {
        let cell = ViewCell::new();
        cell.connecting();
        assert!(cell.close(
            Some(ProgressSnapshot::new(JobStatus::Completed, 100.0)),
            CloseReason::Done
        ));
        assert!(!cell.apply(ProgressSnapshot::new(JobStatus::Running, 5.0)));
        assert!(!cell.connecting());
        cell.cancel();
        let v = cell.current();
        assert_eq!(v.snapshot.unwrap().status, JobStatus::Completed);
        assert_eq!(v.close_reason, Some(CloseReason::Done));
    }

    #[test]
    fn cancel_of_inactive_view_stays_inactive() {
        let cell = ViewCell::new();
        cell.cancel();
        cell.cancel();
        let v = cell.current();
        assert_eq!(v.channel, ChannelState::Inactive);
        assert!(v.close_reason.is_none());
        assert!(v.is_finished());
    }
}
