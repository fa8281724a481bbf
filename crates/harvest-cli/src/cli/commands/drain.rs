//! Print notification changes until the store is empty.

use harvest_core::notify::NotificationCenter;

use crate::cli::render::NotificationLog;

pub(super) fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

/// Follow the store until every notification has been removed.
/// Ctrl-C dismisses whatever is still visible (including persistent ones).
pub(super) async fn drain_notifications(center: &NotificationCenter, log: &mut NotificationLog) {
    let mut rx = center.store().subscribe();
    print_lines(log.diff(&rx.borrow_and_update()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    while !center.store().is_empty() {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = rx.borrow_and_update().clone();
                print_lines(log.diff(&current));
            }
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                tracing::debug!("interrupted; dismissing remaining notifications");
                center.dismiss_all();
            }
        }
    }
}
