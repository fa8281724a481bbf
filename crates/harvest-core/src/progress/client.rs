//! Progress stream client: one push channel per subscription.
//!
//! `subscribe` spawns a channel task that opens the stream, decodes events and
//! publishes snapshots into the subscription's `ViewCell`. The task ends on a
//! `done` event (or terminal snapshot), on a transport error the reconnect
//! policy gives up on, or when the subscription is cancelled. Dropping the
//! `ProgressSubscription` cancels it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::HarvestConfig;
use crate::retry::{self, ReconnectDecision, ReconnectPolicy};
use crate::session::CredentialSource;

use super::endpoint::{EndpointError, ProgressEndpoint};
use super::event::{self, StreamEvent};
use super::guard::ChannelGuard;
use super::snapshot::ProgressSnapshot;
use super::sse::SseDecoder;
use super::state::{CloseReason, ProgressView, ViewCell};
use super::transport::{ByteStream, HttpTransport, PushTransport, TransportError};
use super::watcher::ProgressWatcher;

/// Opens progress subscriptions. Cheap to clone; clones share the transport
/// and the open-channel counter.
#[derive(Clone)]
pub struct ProgressClient {
    endpoint: ProgressEndpoint,
    transport: Arc<dyn PushTransport>,
    credentials: Arc<dyn CredentialSource>,
    reconnect: ReconnectPolicy,
    open_channels: Arc<AtomicUsize>,
}

impl ProgressClient {
    pub fn new(
        endpoint: ProgressEndpoint,
        transport: Arc<dyn PushTransport>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            endpoint,
            transport,
            credentials,
            reconnect: ReconnectPolicy::disabled(),
            open_channels: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Client over HTTP with the endpoint and reconnect policy from config.
    pub fn from_config(
        cfg: &HarvestConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> anyhow::Result<Self> {
        let endpoint = ProgressEndpoint::from_config(cfg)?;
        let transport = HttpTransport::new(Duration::from_secs(cfg.connect_timeout_secs))?;
        Ok(Self::new(endpoint, Arc::new(transport), credentials)
            .with_reconnect(cfg.reconnect_policy()))
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Number of push channels currently open through this client (and its clones).
    pub fn open_channels(&self) -> usize {
        self.open_channels.load(Ordering::Acquire)
    }

    /// A consumer-owned handle that re-keys its single subscription on `(job_id, enabled)`.
    pub fn watcher(&self) -> ProgressWatcher {
        ProgressWatcher::new(self.clone())
    }

    /// Subscribe to `job_id`. Inert (no channel, never connected) when `enabled`
    /// is false, the job id is empty, or no credential is available.
    pub fn subscribe(&self, job_id: &str, enabled: bool) -> ProgressSubscription {
        self.subscribe_after(job_id, enabled, None)
    }

    /// Like `subscribe`, but the channel is not opened until `previous` has
    /// finished, so a consumer never holds two channels at once.
    pub(super) fn subscribe_after(
        &self,
        job_id: &str,
        enabled: bool,
        previous: Option<JoinHandle<()>>,
    ) -> ProgressSubscription {
        let job_id = job_id.trim().to_string();
        let cell = ViewCell::new();
        let cancel = CancellationToken::new();

        let url = match self.channel_url(&job_id, enabled) {
            Some(url) => url,
            None => return ProgressSubscription::inert(job_id, cell, cancel),
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(job_id = %job_id, "no tokio runtime; progress subscription is inert");
                return ProgressSubscription::inert(job_id, cell, cancel);
            }
        };

        cell.connecting();
        let ctx = ChannelContext {
            job_id: job_id.clone(),
            url,
            transport: Arc::clone(&self.transport),
            reconnect: self.reconnect,
            open_channels: Arc::clone(&self.open_channels),
            cell: cell.clone(),
            cancel: cancel.clone(),
        };
        let task = runtime.spawn(async move {
            if let Some(prev) = previous {
                let _ = prev.await;
            }
            run_channel(ctx).await;
        });

        ProgressSubscription {
            job_id,
            rx: cell.subscribe(),
            cell,
            cancel,
            task: Some(task),
        }
    }

    fn channel_url(&self, job_id: &str, enabled: bool) -> Option<Url> {
        if !enabled {
            return None;
        }
        let Some(token) = self.credentials.bearer_token() else {
            tracing::debug!(job_id, "no session credential; progress subscription is inert");
            return None;
        };
        match self.endpoint.url_for(job_id, &token) {
            Ok(url) => Some(url),
            Err(EndpointError::EmptyJobId) => None,
            Err(e) => {
                tracing::warn!(job_id, error = %e, "cannot build progress URL");
                None
            }
        }
    }
}

/// Live handle for one job's progress. Cancelled on drop.
pub struct ProgressSubscription {
    job_id: String,
    cell: ViewCell,
    rx: watch::Receiver<ProgressView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ProgressSubscription {
    fn inert(job_id: String, cell: ViewCell, cancel: CancellationToken) -> Self {
        Self {
            job_id,
            rx: cell.subscribe(),
            cell,
            cancel,
            task: None,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn view(&self) -> ProgressView {
        self.rx.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.rx.borrow().snapshot.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.rx.borrow().is_connected
    }

    /// A receiver for rendering; it observes this subscription only.
    pub fn watch(&self) -> watch::Receiver<ProgressView> {
        self.cell.subscribe()
    }

    /// Wait for the next change of the view. Returns the new view.
    pub async fn changed(&mut self) -> ProgressView {
        let _ = self.rx.changed().await;
        self.rx.borrow_and_update().clone()
    }

    /// Wait until the channel is closed (or was never opened) and return the final view.
    pub async fn finished(&mut self) -> ProgressView {
        match self.rx.wait_for(ProgressView::is_finished).await {
            Ok(view) => view.clone(),
            Err(_) => self.cell.current(),
        }
    }

    /// True while a channel task exists and has not been cancelled.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop receiving progress. Idempotent. No snapshot change is observable
    /// after this returns, even for events already in flight.
    pub fn unsubscribe(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!(job_id = %self.job_id, "progress unsubscribe");
        }
        self.cell.cancel();
        self.cancel.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Unsubscribe and hand back the channel task so a successor can wait for it to finish.
    pub(super) fn shutdown(mut self) -> Option<JoinHandle<()>> {
        self.unsubscribe();
        self.task.take()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

struct ChannelContext {
    job_id: String,
    url: Url,
    transport: Arc<dyn PushTransport>,
    reconnect: ReconnectPolicy,
    open_channels: Arc<AtomicUsize>,
    cell: ViewCell,
    cancel: CancellationToken,
}

/// How one connection of a channel ended.
enum ChannelOutcome {
    /// Terminal state received; the cell is closed.
    Finished,
    /// The subscription went away while streaming.
    Abandoned,
    /// The transport failed. `uptime` is how long the connection was open,
    /// if at least one snapshot arrived on it.
    Failed {
        error: TransportError,
        uptime: Option<Duration>,
    },
}

/// Channel task: connect, stream, and (only if the policy allows) reconnect.
async fn run_channel(ctx: ChannelContext) {
    let mut attempt = 0u32;
    loop {
        let outcome = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            outcome = stream_once(&ctx) => outcome,
        };

        let (error, uptime) = match outcome {
            ChannelOutcome::Finished | ChannelOutcome::Abandoned => return,
            ChannelOutcome::Failed { error, uptime } => (error, uptime),
        };
        if uptime.is_some_and(|up| ctx.reconnect.is_stable(up)) {
            attempt = 0;
        }
        attempt += 1;

        match ctx.reconnect.decide(attempt, retry::classify(&error)) {
            ReconnectDecision::GiveUp => {
                tracing::info!(job_id = %ctx.job_id, error = %error, "progress channel closed");
                ctx.cell.close(None, CloseReason::TransportError(error));
                return;
            }
            ReconnectDecision::RetryAfter(delay) => {
                tracing::warn!(
                    job_id = %ctx.job_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "progress channel dropped, reconnecting"
                );
                if !ctx.cell.connecting() {
                    return;
                }
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

async fn stream_once(ctx: &ChannelContext) -> ChannelOutcome {
    let body = match ctx.transport.open(&ctx.url).await {
        Ok(body) => body,
        Err(error) => {
            return ChannelOutcome::Failed {
                error,
                uptime: None,
            }
        }
    };
    let guard = ChannelGuard::new(&ctx.open_channels, &ctx.job_id);
    // `pump` owns the body, so the connection is closed before the guard is released.
    let outcome = pump(body, ctx).await;
    drop(guard);
    outcome
}

async fn pump(mut body: ByteStream, ctx: &ChannelContext) -> ChannelOutcome {
    if !ctx.cell.opened() {
        return ChannelOutcome::Abandoned;
    }

    let opened_at = Instant::now();
    let mut decoder = SseDecoder::new();
    let mut delivered = false;
    let uptime = |delivered: bool| delivered.then(|| opened_at.elapsed());
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(error) => {
                return ChannelOutcome::Failed {
                    error,
                    uptime: uptime(delivered),
                }
            }
        };
        for frame in decoder.feed(&chunk) {
            match event::decode(&frame) {
                Some(StreamEvent::Progress(snapshot)) if snapshot.is_terminal() => {
                    tracing::info!(job_id = %ctx.job_id, status = %snapshot.status, "job reached terminal status");
                    ctx.cell.close(Some(snapshot), CloseReason::Done);
                    return ChannelOutcome::Finished;
                }
                Some(StreamEvent::Progress(snapshot)) => {
                    if !ctx.cell.apply(snapshot) {
                        return ChannelOutcome::Abandoned;
                    }
                    delivered = true;
                }
                Some(StreamEvent::Done(last)) => {
                    tracing::info!(
                        job_id = %ctx.job_id,
                        status = last.as_ref().map(|s| s.status.as_str()).unwrap_or("unknown"),
                        "job done"
                    );
                    ctx.cell.close(last, CloseReason::Done);
                    return ChannelOutcome::Finished;
                }
                Some(StreamEvent::Other(kind)) => {
                    tracing::trace!(job_id = %ctx.job_id, kind = %kind, "ignoring progress channel event");
                }
                None => {}
            }
        }
    }
    ChannelOutcome::Failed {
        error: TransportError::StreamEnded,
        uptime: uptime(delivered),
    }
}
