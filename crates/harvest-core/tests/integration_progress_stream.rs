//! Integration test: progress channel over real HTTP against a local SSE server.
//!
//! Starts a scripted event-stream server, subscribes through `HttpTransport`
//! and checks the final view for completion, rejection and dropped streams.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::sse_server::{self, frame, SseScript};
use harvest_core::config::HarvestConfig;
use harvest_core::progress::{
    ChannelState, CloseReason, HttpTransport, JobStatus, ProgressClient, ProgressEndpoint,
    TransportError,
};
use harvest_core::session::StaticCredential;

const PATH: &str = "api/v1/jobs/{job_id}/progress/stream";

fn client(base_url: &str, token: &str) -> ProgressClient {
    let endpoint = ProgressEndpoint::new(base_url, PATH, "token").unwrap();
    let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
    ProgressClient::new(
        endpoint,
        Arc::new(transport),
        Arc::new(StaticCredential::new(token)),
    )
}

#[tokio::test]
async fn stream_runs_to_completion() {
    let server = sse_server::start(SseScript::new(
        "tok-1",
        vec![
            ": connected\r\n\r\n".to_string(),
            frame("progress", r#"{"status":"running","progressPct":40,"processedItems":4,"totalItems":10}"#),
            frame("progress", r#"{"status":"running","progressPct":80,"processedItems":8,"totalItems":10}"#),
            frame("done", r#"{"status":"completed","progressPct":100,"processedItems":10,"totalItems":10,"resultRowCount":37}"#),
        ],
    ));
    let client = client(&server.base_url, "tok-1");
    let mut sub = client.subscribe("J1", true);

    let view = tokio::time::timeout(Duration::from_secs(10), sub.finished())
        .await
        .expect("stream did not finish");
    assert_eq!(view.channel, ChannelState::Closed);
    assert_eq!(view.close_reason, Some(CloseReason::Done));
    assert!(!view.is_connected);
    let snapshot = view.snapshot.unwrap();
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.result_row_count, 37);
    assert_eq!(snapshot.remaining_items(), 0);

    assert_eq!(server.requests(), 1);
    assert_eq!(
        server.targets(),
        vec!["/api/v1/jobs/J1/progress/stream?token=tok-1".to_string()]
    );
    assert_eq!(client.open_channels(), 0);
}

#[tokio::test]
async fn rejected_token_closes_with_http_status() {
    let server = sse_server::start(SseScript::new("right", vec![]));
    let mut sub = client(&server.base_url, "wrong").subscribe("J1", true);

    let view = tokio::time::timeout(Duration::from_secs(10), sub.finished())
        .await
        .expect("subscription did not close");
    assert!(view.snapshot.is_none());
    assert!(!view.is_connected);
    assert_eq!(
        view.close_reason,
        Some(CloseReason::TransportError(TransportError::Http(401)))
    );
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn dropped_stream_closes_and_keeps_last_snapshot() {
    let server = sse_server::start(SseScript::new(
        "tok",
        vec![frame("progress", r#"{"status":"running","progressPct":20}"#)],
    ));
    let mut sub = client(&server.base_url, "tok").subscribe("J1", true);

    let view = tokio::time::timeout(Duration::from_secs(10), sub.finished())
        .await
        .expect("subscription did not close");
    assert_eq!(
        view.close_reason,
        Some(CloseReason::TransportError(TransportError::StreamEnded))
    );
    assert!(!view.is_connected);
    assert_eq!(view.snapshot.unwrap().progress_pct, 20.0);
    assert_eq!(server.requests(), 1);
}

#[tokio::test]
async fn unsubscribe_drops_a_held_open_stream() {
    let mut script = SseScript::new(
        "tok",
        vec![frame("progress", r#"{"status":"queued","progressPct":0}"#)],
    );
    script.hold_open = Duration::from_secs(30);
    let server = sse_server::start(script);
    let client = client(&server.base_url, "tok");
    let mut sub = client.subscribe("J1", true);

    let mut rx = sub.watch();
    tokio::time::timeout(Duration::from_secs(10), rx.wait_for(|v| v.is_connected))
        .await
        .expect("no snapshot")
        .unwrap();
    assert_eq!(client.open_channels(), 1);

    sub.unsubscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.open_channels() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("channel still open after unsubscribe");
    assert_eq!(sub.view().close_reason, Some(CloseReason::Unsubscribed));
    assert_eq!(sub.snapshot().unwrap().status, JobStatus::Queued);
}

#[tokio::test]
async fn client_from_config_reaches_the_server() {
    let server = sse_server::start(SseScript::new(
        "cfg-token",
        vec![frame("done", r#"{"status":"failed","progressPct":12,"errorMessage":"quota"}"#)],
    ));
    let cfg = HarvestConfig {
        api_base_url: server.base_url.clone(),
        ..HarvestConfig::default()
    };
    let client =
        ProgressClient::from_config(&cfg, Arc::new(StaticCredential::new("cfg-token"))).unwrap();
    let mut sub = client.subscribe("job-42", true);

    let view = tokio::time::timeout(Duration::from_secs(10), sub.finished())
        .await
        .expect("stream did not finish");
    let snapshot = view.snapshot.unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert_eq!(snapshot.error_message.as_deref(), Some("quota"));
    assert_eq!(
        server.targets(),
        vec!["/api/v1/jobs/job-42/progress/stream?token=cfg-token".to_string()]
    );
}
