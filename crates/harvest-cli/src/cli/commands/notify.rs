//! `harvest notify` – show one notification and follow its lifecycle.

use anyhow::{bail, Result};
use harvest_core::notify::{NotificationCenter, NotificationKind};

use super::drain::drain_notifications;
use crate::cli::render::NotificationLog;

pub async fn run_notify(
    kind: NotificationKind,
    title: &str,
    message: Option<&str>,
    duration_ms: Option<i64>,
) -> Result<()> {
    if title.trim().is_empty() {
        bail!("notification title is required");
    }
    let center = NotificationCenter::global();
    let id = center.add(kind, title, message, duration_ms);
    if center.store().get(id).is_some_and(|n| n.duration.is_none()) {
        println!("{id} stays until dismissed; press Ctrl-C to dismiss it.");
    }
    drain_notifications(center, &mut NotificationLog::default()).await;
    Ok(())
}
