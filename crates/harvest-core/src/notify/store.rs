//! Ordered set of live notifications. No timers here; `NotificationCenter`
//! drives every transition.

use std::sync::Arc;

use tokio::sync::watch;

use super::notification::{Notification, NotificationId, Phase};

/// Insertion-ordered notifications, observable through a watch channel.
/// Consumers read and subscribe; only the lifecycle code mutates.
#[derive(Clone)]
pub struct NotificationStore {
    tx: Arc<watch::Sender<Vec<Notification>>>,
}

impl NotificationStore {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx: Arc::new(tx) }
    }

    /// Receiver that sees every change of the set.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.tx.subscribe()
    }

    /// Current set in insertion order (oldest first).
    pub fn snapshot(&self) -> Vec<Notification> {
        self.tx.borrow().clone()
    }

    /// Current set newest first, the order a consumer renders it in.
    pub fn render_order(&self) -> Vec<Notification> {
        self.tx.borrow().iter().rev().cloned().collect()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.tx.borrow().iter().find(|n| n.id == id).cloned()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.tx.borrow().iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    pub(crate) fn visible_ids(&self) -> Vec<NotificationId> {
        self.tx
            .borrow()
            .iter()
            .filter(|n| n.is_visible())
            .map(|n| n.id)
            .collect()
    }

    pub(crate) fn insert(&self, notification: Notification) {
        self.tx.send_modify(|list| list.push(notification));
    }

    /// Visible -> Dismissing. False if the id is absent or already dismissing,
    /// so exactly one caller wins the transition.
    pub(crate) fn begin_dismiss(&self, id: NotificationId) -> bool {
        self.tx.send_if_modified(|list| {
            match list.iter_mut().find(|n| n.id == id) {
                Some(n) if n.phase == Phase::Visible => {
                    n.phase = Phase::Dismissing;
                    true
                }
                _ => false,
            }
        })
    }

    /// Drop a dismissing notification. Visible ones are never removed directly.
    pub(crate) fn remove(&self, id: NotificationId) -> bool {
        self.tx.send_if_modified(|list| {
            match list
                .iter()
                .position(|n| n.id == id && n.phase == Phase::Dismissing)
            {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            }
        })
    }
}
