//! `harvest watch` – follow one job's progress stream.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use harvest_core::config::HarvestConfig;
use harvest_core::notify::{Notification, NotificationCenter};
use harvest_core::progress::{ProgressClient, ProgressView};
use harvest_core::session::{CredentialSource, SessionFile};
use tokio::sync::watch;

use super::drain::{drain_notifications, print_lines};
use crate::cli::render::{self, NotificationLog};

pub async fn run_watch(cfg: &HarvestConfig, job_id: &str) -> Result<()> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        bail!("job id is empty");
    }
    let session = SessionFile::open_default()?;
    if session.bearer_token().is_none() {
        bail!("not signed in; run `harvest login --token <TOKEN>` first");
    }

    let client = ProgressClient::from_config(cfg, Arc::new(session))?;
    let center = NotificationCenter::global();
    let mut log = NotificationLog::default();
    let mut notes = center.store().subscribe();

    let mut watcher = client.watcher();
    watcher.update(job_id, true);
    let mut rx = watcher
        .watch()
        .context("progress subscription was not opened")?;

    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let view = match follow_progress(job_id, &mut rx, &mut notes, &mut log, interrupt).await {
        Some(view) => view,
        None => {
            tracing::info!(job_id, "interrupted; unsubscribing");
            watcher.unmount();
            let view = rx.borrow().clone();
            println!("{}", render::progress_line(job_id, &view));
            view
        }
    };
    watcher.unmount();

    let (kind, title, message) = render::outcome(job_id, &view);
    center.add(kind, title, message.as_deref(), None);
    drain_notifications(center, &mut log).await;
    Ok(())
}

/// Print progress and notification changes until the view is finished.
/// Returns `None` if `interrupt` resolved first.
async fn follow_progress(
    job_id: &str,
    rx: &mut watch::Receiver<ProgressView>,
    notes: &mut watch::Receiver<Vec<Notification>>,
    log: &mut NotificationLog,
    interrupt: impl Future<Output = ()>,
) -> Option<ProgressView> {
    let first = rx.borrow_and_update().clone();
    println!("{}", render::progress_line(job_id, &first));
    // The channel may have closed before the first read (401, refused connection).
    if first.is_finished() {
        return Some(first);
    }

    tokio::pin!(interrupt);
    let mut notes_live = true;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                let view = rx.borrow_and_update().clone();
                println!("{}", render::progress_line(job_id, &view));
                if changed.is_err() || view.is_finished() {
                    return Some(view);
                }
            }
            changed = notes.changed(), if notes_live => {
                if changed.is_ok() {
                    let current = notes.borrow_and_update().clone();
                    print_lines(log.diff(&current));
                } else {
                    notes_live = false;
                }
            }
            _ = &mut interrupt => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use harvest_core::config::NotificationConfig;
    use harvest_core::progress::{ChannelState, CloseReason, TransportError};

    use super::*;

    fn center() -> NotificationCenter {
        NotificationCenter::new(&NotificationConfig::default())
    }

    #[tokio::test]
    async fn already_closed_view_returns_without_waiting() {
        let closed = ProgressView {
            channel: ChannelState::Closed,
            close_reason: Some(CloseReason::TransportError(TransportError::Http(401))),
            ..ProgressView::default()
        };
        // Sender stays alive, so only the finished check can end the loop.
        let (_tx, mut rx) = watch::channel(closed.clone());
        let center = center();
        let mut notes = center.store().subscribe();
        let mut log = NotificationLog::default();

        let view = tokio::time::timeout(
            Duration::from_secs(1),
            follow_progress("J1", &mut rx, &mut notes, &mut log, std::future::pending()),
        )
        .await
        .expect("watch loop hung on a closed view");
        assert_eq!(view, Some(closed));
    }

    #[tokio::test]
    async fn returns_final_view_once_closed() {
        let (tx, mut rx) = watch::channel(ProgressView {
            channel: ChannelState::Connecting,
            ..ProgressView::default()
        });
        let center = center();
        let mut notes = center.store().subscribe();
        let mut log = NotificationLog::default();

        let follow = follow_progress("J1", &mut rx, &mut notes, &mut log, std::future::pending());
        let close = async {
            tx.send_modify(|v| {
                v.channel = ChannelState::Closed;
                v.close_reason = Some(CloseReason::Done);
            });
        };
        let (view, ()) = tokio::time::timeout(Duration::from_secs(1), async {
            tokio::join!(follow, close)
        })
        .await
        .expect("watch loop did not finish");
        assert_eq!(view.unwrap().close_reason, Some(CloseReason::Done));
    }

    #[tokio::test]
    async fn interrupt_ends_the_loop() {
        let (_tx, mut rx) = watch::channel(ProgressView {
            channel: ChannelState::Open,
            is_connected: true,
            ..ProgressView::default()
        });
        let center = center();
        let mut notes = center.store().subscribe();
        let mut log = NotificationLog::default();

        let view = follow_progress("J1", &mut rx, &mut notes, &mut log, async {}).await;
        assert!(view.is_none());
    }
}
