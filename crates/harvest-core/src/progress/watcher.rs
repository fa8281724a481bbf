//! Consumer-side handle keyed by `(job_id, enabled)`.
//!
//! A view that follows "whatever job is selected" owns one `ProgressWatcher`
//! and calls `update` whenever its inputs change. The watcher closes the old
//! subscription before the new one opens its channel.

use tokio::sync::watch;

use super::client::{ProgressClient, ProgressSubscription};
use super::state::ProgressView;

pub struct ProgressWatcher {
    client: ProgressClient,
    current: Option<ProgressSubscription>,
    key: Option<(String, bool)>,
}

impl ProgressWatcher {
    pub fn new(client: ProgressClient) -> Self {
        Self {
            client,
            current: None,
            key: None,
        }
    }

    /// Follow `job_id` while `enabled`. Same key as before is a no-op; any
    /// other key tears down the current subscription first.
    pub fn update(&mut self, job_id: &str, enabled: bool) {
        let key = (job_id.trim().to_string(), enabled);
        if self.key.as_ref() != Some(&key) || self.current.is_none() {
            self.rekey(key);
        }
    }

    /// Tear down and reopen with the current key (manual retry after a transport error).
    pub fn resubscribe(&mut self) -> Option<&ProgressSubscription> {
        let key = self.key.clone()?;
        tracing::debug!(job_id = %key.0, "progress resubscribe");
        self.rekey(key);
        self.current.as_ref()
    }

    /// Current view; the default (inactive, no snapshot) when nothing is followed.
    pub fn view(&self) -> ProgressView {
        self.current
            .as_ref()
            .map(ProgressSubscription::view)
            .unwrap_or_default()
    }

    pub fn watch(&self) -> Option<watch::Receiver<ProgressView>> {
        self.current.as_ref().map(ProgressSubscription::watch)
    }

    pub fn subscription(&self) -> Option<&ProgressSubscription> {
        self.current.as_ref()
    }

    pub fn subscription_mut(&mut self) -> Option<&mut ProgressSubscription> {
        self.current.as_mut()
    }

    /// The consumer went away. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(mut sub) = self.current.take() {
            sub.unsubscribe();
        }
        self.key = None;
    }

    fn rekey(&mut self, key: (String, bool)) {
        let previous = self.current.take().and_then(ProgressSubscription::shutdown);
        let sub = self.client.subscribe_after(&key.0, key.1, previous);
        self.current = Some(sub);
        self.key = Some(key);
    }
}

impl Drop for ProgressWatcher {
    fn drop(&mut self) {
        self.unmount();
    }
}
