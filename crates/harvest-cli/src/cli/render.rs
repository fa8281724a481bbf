//! Terminal rendering of progress views and notification changes.

use std::collections::{HashMap, HashSet};

use harvest_core::notify::{Notification, NotificationId, NotificationKind, Phase};
use harvest_core::progress::{ChannelState, CloseReason, JobStatus, ProgressView};

pub fn progress_line(job_id: &str, view: &ProgressView) -> String {
    let link = if view.is_connected {
        "live"
    } else {
        match view.channel {
            ChannelState::Inactive => "inactive",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closed => "closed",
        }
    };
    match &view.snapshot {
        Some(s) => format!(
            "[{job_id}] {:<9} {:>5.1}%  {}/{} items, {} failed  ({link})",
            s.status.as_str(),
            s.fraction() * 100.0,
            s.processed_items,
            s.total_items,
            s.failed_items,
        ),
        None => format!("[{job_id}] waiting for progress  ({link})"),
    }
}

/// Notification to push once watching has ended.
pub fn outcome(job_id: &str, view: &ProgressView) -> (NotificationKind, String, Option<String>) {
    match (&view.close_reason, &view.snapshot) {
        (Some(CloseReason::TransportError(e)), _) => (
            NotificationKind::Error,
            format!("Lost progress stream for job {job_id}"),
            Some(e.to_string()),
        ),
        (Some(CloseReason::Unsubscribed), _) => (
            NotificationKind::Info,
            format!("Stopped watching job {job_id}"),
            None,
        ),
        (_, Some(s)) if s.status == JobStatus::Completed => (
            NotificationKind::Success,
            format!("Job {job_id} completed"),
            Some(format!("{} result rows", s.result_row_count)),
        ),
        (_, Some(s)) if s.status == JobStatus::Failed => (
            NotificationKind::Error,
            format!("Job {job_id} failed"),
            s.error_message.clone(),
        ),
        (_, Some(s)) if s.status == JobStatus::Cancelled => (
            NotificationKind::Warning,
            format!("Job {job_id} was cancelled"),
            None,
        ),
        _ => (
            NotificationKind::Info,
            format!("Job {job_id} finished"),
            None,
        ),
    }
}

fn describe(n: &Notification) -> String {
    match &n.message {
        Some(m) => format!("[{}] {}: {}", n.kind, n.title, m),
        None => format!("[{}] {}", n.kind, n.title),
    }
}

/// Turns successive store contents into added / dismissing / removed lines.
#[derive(Default)]
pub struct NotificationLog {
    seen: HashMap<NotificationId, (Phase, String)>,
}

impl NotificationLog {
    pub fn diff(&mut self, current: &[Notification]) -> Vec<String> {
        let mut lines = Vec::new();
        for n in current {
            match self.seen.insert(n.id, (n.phase, n.title.clone())) {
                None => lines.push(format!("+ {} {}", n.id, describe(n))),
                Some((prev, _)) if prev != n.phase => {
                    lines.push(format!("~ {} {} (dismissing)", n.id, n.title))
                }
                Some(_) => {}
            }
        }
        let live: HashSet<NotificationId> = current.iter().map(|n| n.id).collect();
        let mut gone: Vec<NotificationId> =
            self.seen.keys().filter(|id| !live.contains(id)).copied().collect();
        gone.sort();
        for id in gone {
            if let Some((_, title)) = self.seen.remove(&id) {
                lines.push(format!("- {id} {title}"));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::config::NotificationConfig;
    use harvest_core::notify::NotificationCenter;
    use harvest_core::progress::{ProgressSnapshot, TransportError};

    fn closed(reason: CloseReason, snapshot: Option<ProgressSnapshot>) -> ProgressView {
        ProgressView {
            snapshot,
            is_connected: false,
            channel: ChannelState::Closed,
            close_reason: Some(reason),
        }
    }

    #[test]
    fn progress_line_shows_percent_and_link_state() {
        let mut s = ProgressSnapshot::new(JobStatus::Running, 42.0);
        s.processed_items = 42;
        s.total_items = 100;
        let view = ProgressView {
            snapshot: Some(s),
            is_connected: true,
            channel: ChannelState::Open,
            ..ProgressView::default()
        };
        assert_eq!(
            progress_line("J1", &view),
            "[J1] running    42.0%  42/100 items, 0 failed  (live)"
        );
        assert_eq!(
            progress_line("J1", &ProgressView::default()),
            "[J1] waiting for progress  (inactive)"
        );
    }

    #[test]
    fn outcome_follows_final_status() {
        let done = |status| closed(CloseReason::Done, Some(ProgressSnapshot::new(status, 100.0)));
        assert_eq!(outcome("J", &done(JobStatus::Completed)).0, NotificationKind::Success);
        assert_eq!(outcome("J", &done(JobStatus::Failed)).0, NotificationKind::Error);
        assert_eq!(outcome("J", &done(JobStatus::Cancelled)).0, NotificationKind::Warning);
        assert_eq!(outcome("J", &closed(CloseReason::Done, None)).0, NotificationKind::Info);

        let (kind, _, message) = outcome(
            "J",
            &closed(CloseReason::TransportError(TransportError::Http(401)), None),
        );
        assert_eq!(kind, NotificationKind::Error);
        assert_eq!(message.as_deref(), Some("server answered HTTP 401"));
        assert_eq!(
            outcome("J", &closed(CloseReason::Unsubscribed, None)).0,
            NotificationKind::Info
        );
    }

    #[test]
    fn log_reports_each_transition_once() {
        let center = NotificationCenter::new(&NotificationConfig::default());
        let mut log = NotificationLog::default();
        let id = center.add(NotificationKind::Error, "Failed", Some("Network error"), Some(0));

        let lines = log.diff(&center.store().snapshot());
        assert_eq!(lines, vec![format!("+ {id} [error] Failed: Network error")]);
        assert!(log.diff(&center.store().snapshot()).is_empty());

        center.dismiss(id);
        let lines = log.diff(&center.store().snapshot());
        assert_eq!(lines, vec![format!("- {id} Failed")]);
    }
}
