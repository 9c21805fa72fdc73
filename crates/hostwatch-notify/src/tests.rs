use crate::dispatcher::{AlertDispatcher, DispatchReport};
use crate::error::NotifyError;
use crate::message::render_alert_message;
use crate::telegram::TelegramNotifier;
use crate::Notifier;
use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use hostwatch_common::types::{AlertEvent, MetricKind, Recipient};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Records every delivery; fails for the recipients listed in `failing`.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(Recipient, String)>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    fn failing_for(ids: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &Recipient, text: &str) -> anyhow::Result<()> {
        if self.failing.contains(recipient.as_str()) {
            anyhow::bail!("chat {recipient} unreachable");
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn event(kind: MetricKind, value: f64, threshold: f64) -> AlertEvent {
    AlertEvent {
        kind,
        value,
        threshold,
    }
}

fn recipients(ids: &[&str]) -> Vec<Recipient> {
    ids.iter().map(|id| Recipient::new(*id)).collect()
}

// ── Message rendering ──

#[test]
fn message_lists_events_in_order_with_units() {
    let text = render_alert_message(
        &[
            event(MetricKind::CpuLoad, 91.26, 80.0),
            event(MetricKind::GpuTemp, 88.0, 85.0),
        ],
        None,
    );

    let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("High CPU load: 91.3%"));
    assert!(lines[2].contains("High GPU temperature: 88.0°C (threshold 85.0°C)"));
}

// ── Dispatcher ──

#[tokio::test]
async fn dispatch_sends_one_message_per_recipient_for_whole_batch() {
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = AlertDispatcher::new(notifier.clone(), recipients(&["1", "2"]));

    let events = [
        event(MetricKind::CpuLoad, 95.0, 80.0),
        event(MetricKind::CpuTemp, 90.0, 85.0),
        event(MetricKind::GpuLoad, 99.0, 90.0),
    ];
    let report = dispatcher.dispatch(&events).await;

    assert_eq!(report, DispatchReport { delivered: 2, failed: 0 });
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    for (_, text) in &sent {
        assert!(text.contains("CPU load"));
        assert!(text.contains("CPU temperature"));
        assert!(text.contains("GPU load"));
    }
}

#[tokio::test]
async fn dispatch_of_empty_batch_sends_nothing() {
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = AlertDispatcher::new(notifier.clone(), recipients(&["1"]));

    let report = dispatcher.dispatch(&[]).await;

    assert_eq!(report, DispatchReport::default());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn dispatch_failure_for_one_recipient_does_not_block_others() {
    let notifier = Arc::new(RecordingNotifier::failing_for(&["2"]));
    let dispatcher = AlertDispatcher::new(notifier.clone(), recipients(&["1", "2", "3"]));

    let report = dispatcher
        .dispatch(&[event(MetricKind::CpuLoad, 95.0, 80.0)])
        .await;

    assert_eq!(report, DispatchReport { delivered: 2, failed: 1 });
    let delivered: Vec<String> = notifier
        .sent()
        .into_iter()
        .map(|(r, _)| r.to_string())
        .collect();
    assert_eq!(delivered, vec!["1", "3"]);
}

#[tokio::test]
async fn dispatch_names_host_in_header() {
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher =
        AlertDispatcher::new(notifier.clone(), recipients(&["1"])).with_host("gpu-box");

    dispatcher
        .dispatch(&[event(MetricKind::GpuTemp, 90.0, 80.0)])
        .await;

    assert!(notifier.sent()[0].1.starts_with("🔔 Host status alert (gpu-box):"));
}

// ── Telegram ──

async fn spawn_bot_api(status: StatusCode, body: &'static str) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_handler = seen.clone();

    let app = Router::new().route(
        "/botTEST-TOKEN/sendMessage",
        post(move |Json(payload): Json<Value>| {
            let seen = seen_by_handler.clone();
            async move {
                seen.lock().unwrap().push(payload);
                (status, body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

#[test]
fn telegram_rejects_empty_token() {
    let err = TelegramNotifier::new("http://localhost", "  ").err().expect("should fail");
    assert!(matches!(err, NotifyError::InvalidConfig(_)));
}

#[tokio::test]
async fn telegram_posts_chat_id_and_text() {
    let (base, seen) = spawn_bot_api(StatusCode::OK, r#"{"ok":true,"result":{}}"#).await;
    let notifier = TelegramNotifier::new(&base, "TEST-TOKEN").unwrap();

    notifier
        .send(&Recipient::new("424242"), "disk on fire")
        .await
        .expect("delivery should succeed");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["chat_id"], "424242");
    assert_eq!(seen[0]["text"], "disk on fire");
}

#[tokio::test]
async fn telegram_reports_api_errors() {
    let (base, _) = spawn_bot_api(
        StatusCode::BAD_REQUEST,
        r#"{"ok":false,"description":"Bad Request: chat not found"}"#,
    )
    .await;
    let notifier = TelegramNotifier::new(&base, "TEST-TOKEN").unwrap();

    let err = notifier
        .send(&Recipient::new("1"), "hello")
        .await
        .expect_err("delivery should fail");

    match err.downcast_ref::<NotifyError>() {
        Some(NotifyError::ApiError { status, body, .. }) => {
            assert_eq!(*status, 400);
            assert!(body.contains("chat not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn telegram_treats_ok_false_as_failure() {
    let (base, _) = spawn_bot_api(StatusCode::OK, r#"{"ok":false}"#).await;
    let notifier = TelegramNotifier::new(&base, "TEST-TOKEN").unwrap();

    assert!(notifier.send(&Recipient::new("1"), "hi").await.is_err());
}
