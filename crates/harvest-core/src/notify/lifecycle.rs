//! Timed retirement of notifications.
//!
//! Each notification with a positive duration gets one timer task that sleeps
//! until `created + duration - exit_window`, moves it to dismissing, sleeps
//! the exit window and removes it. An explicit `dismiss` wins the
//! visible -> dismissing transition, aborts that task (both phases) and starts
//! a fresh exit-window task. The store's transition is atomic, so at most one
//! path ever reaches removal for a given id.
//!
//! Timers run on the ambient tokio runtime. Without one, notifications are
//! kept until an explicit dismiss, which then removes them immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::NotificationConfig;

use super::kind::NotificationKind;
use super::notification::{Notification, NotificationId, Phase};
use super::store::NotificationStore;

static GLOBAL: OnceLock<NotificationCenter> = OnceLock::new();

/// Creates notifications and owns their timers. Cheap to clone.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

struct Inner {
    store: NotificationStore,
    next_id: AtomicU64,
    timers: Mutex<HashMap<NotificationId, JoinHandle<()>>>,
    default_duration_ms: i64,
    exit_window: Duration,
    max_visible: Option<usize>,
}

impl NotificationCenter {
    pub fn new(cfg: &NotificationConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: NotificationStore::new(),
                next_id: AtomicU64::new(0),
                timers: Mutex::new(HashMap::new()),
                default_duration_ms: cfg.default_duration_ms,
                exit_window: Duration::from_millis(cfg.exit_window_ms),
                max_visible: cfg.max_visible.filter(|&n| n > 0),
            }),
        }
    }

    /// Process-wide center. Uses built-in defaults unless `init_global` ran first.
    pub fn global() -> &'static NotificationCenter {
        GLOBAL.get_or_init(|| NotificationCenter::new(&NotificationConfig::default()))
    }

    /// Configure the process-wide center. Returns false if it already exists.
    pub fn init_global(cfg: &NotificationConfig) -> bool {
        GLOBAL.set(NotificationCenter::new(cfg)).is_ok()
    }

    pub fn store(&self) -> &NotificationStore {
        &self.inner.store
    }

    pub fn exit_window(&self) -> Duration {
        self.inner.exit_window
    }

    /// Insert a visible notification and schedule its retirement.
    ///
    /// `duration_ms` defaults to the configured duration; a value `<= 0`
    /// keeps the notification until `dismiss`.
    pub fn add(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: Option<&str>,
        duration_ms: Option<i64>,
    ) -> NotificationId {
        let inner = &self.inner;
        let id = NotificationId::new(inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let duration_ms = duration_ms.unwrap_or(inner.default_duration_ms);
        let duration = u64::try_from(duration_ms)
            .ok()
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis);

        let notification = Notification {
            id,
            kind,
            title: title.into(),
            message: message.map(str::to_string),
            duration,
            phase: Phase::Visible,
        };
        tracing::debug!(notification_id = %id, kind = %kind, title = %notification.title, "notification added");
        inner.store.insert(notification);

        if let Some(duration) = duration {
            let dismiss_at = Instant::now() + duration.saturating_sub(inner.exit_window);
            let task_inner = Arc::clone(inner);
            let mut timers = inner.lock_timers();
            if let Some(handle) = spawn_timer(auto_dismiss(task_inner, id, dismiss_at)) {
                timers.insert(id, handle);
            }
        }

        self.enforce_max_visible();
        id
    }

    /// `add` for call sites that only have the kind as text.
    pub fn add_str(
        &self,
        kind: &str,
        title: impl Into<String>,
        message: Option<&str>,
        duration_ms: Option<i64>,
    ) -> NotificationId {
        self.add(NotificationKind::parse_or_info(kind), title, message, duration_ms)
    }

    pub fn success(&self, title: impl Into<String>, message: Option<&str>) -> NotificationId {
        self.add(NotificationKind::Success, title, message, None)
    }

    pub fn error(&self, title: impl Into<String>, message: Option<&str>) -> NotificationId {
        self.add(NotificationKind::Error, title, message, None)
    }

    pub fn warning(&self, title: impl Into<String>, message: Option<&str>) -> NotificationId {
        self.add(NotificationKind::Warning, title, message, None)
    }

    pub fn info(&self, title: impl Into<String>, message: Option<&str>) -> NotificationId {
        self.add(NotificationKind::Info, title, message, None)
    }

    /// Start the exit of a visible notification now. No-op for ids that are
    /// already dismissing or gone.
    pub fn dismiss(&self, id: NotificationId) {
        let inner = &self.inner;
        let mut timers = inner.lock_timers();
        if !inner.store.begin_dismiss(id) {
            return;
        }
        if let Some(auto) = timers.remove(&id) {
            auto.abort();
        }
        tracing::debug!(notification_id = %id, "notification dismissed");
        match spawn_timer(exit_then_remove(Arc::clone(inner), id)) {
            Some(handle) => {
                timers.insert(id, handle);
            }
            None => {
                inner.store.remove(id);
            }
        }
    }

    /// Dismiss every visible notification.
    pub fn dismiss_all(&self) {
        for id in self.inner.store.visible_ids() {
            self.dismiss(id);
        }
    }

    /// Timer tasks still pending (auto-dismiss or exit window).
    pub fn pending_timers(&self) -> usize {
        self.inner.lock_timers().len()
    }

    fn enforce_max_visible(&self) {
        let Some(cap) = self.inner.max_visible else {
            return;
        };
        let visible = self.inner.store.visible_ids();
        if visible.len() <= cap {
            return;
        }
        for id in &visible[..visible.len() - cap] {
            tracing::debug!(notification_id = %id, cap, "too many notifications; dismissing oldest");
            self.dismiss(*id);
        }
    }
}

impl Inner {
    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<NotificationId, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_exit_window(&self) {
        if self.exit_window.is_zero() {
            // Still give consumers one tick to observe the dismissing phase.
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.exit_window).await;
        }
    }

    fn finish(&self, id: NotificationId) {
        let mut timers = self.lock_timers();
        timers.remove(&id);
        if self.store.remove(id) {
            tracing::debug!(notification_id = %id, "notification removed");
        }
    }
}

fn spawn_timer<F>(fut: F) -> Option<JoinHandle<()>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Some(handle.spawn(fut)),
        Err(_) => {
            tracing::warn!("no tokio runtime; notification timers are not scheduled");
            None
        }
    }
}

async fn auto_dismiss(inner: Arc<Inner>, id: NotificationId, dismiss_at: Instant) {
    tokio::time::sleep_until(dismiss_at).await;
    if !inner.store.begin_dismiss(id) {
        return;
    }
    tracing::debug!(notification_id = %id, "notification timed out");
    inner.wait_exit_window().await;
    inner.finish(id);
}

async fn exit_then_remove(inner: Arc<Inner>, id: NotificationId) {
    inner.wait_exit_window().await;
    inner.finish(id);
}
