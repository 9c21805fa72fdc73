use anyhow::Result;
use async_trait::async_trait;
use hostwatch_agent::monitor::Monitor;
use hostwatch_alert::engine::AlertEngine;
use hostwatch_collector::Sensor;
use hostwatch_common::types::{MetricKind, Recipient, Thresholds};
use hostwatch_notify::dispatcher::AlertDispatcher;
use hostwatch_notify::Notifier;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-tick scripted values in `MetricKind::ALL` order. `Err` is a failed read.
type Tick = [Result<Option<f64>, &'static str>; 4];

struct ScriptedSensor {
    ticks: VecDeque<Tick>,
    current: Option<Tick>,
}

impl ScriptedSensor {
    fn new(ticks: Vec<Tick>) -> Self {
        Self {
            ticks: ticks.into(),
            current: None,
        }
    }

    fn value(&mut self, kind: MetricKind) -> Result<Option<f64>> {
        // CPU load is read first each tick, so it advances the script.
        if kind == MetricKind::CpuLoad {
            self.current = self.ticks.pop_front();
        }
        match self.current.as_ref().map(|t| t[kind.index()]) {
            Some(Ok(v)) => Ok(v),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Ok(None),
        }
    }
}

impl Sensor for ScriptedSensor {
    fn read_cpu_load(&mut self) -> Result<Option<f64>> {
        self.value(MetricKind::CpuLoad)
    }
    fn read_cpu_temp(&mut self) -> Result<Option<f64>> {
        self.value(MetricKind::CpuTemp)
    }
    fn read_gpu_load(&mut self) -> Result<Option<f64>> {
        self.value(MetricKind::GpuLoad)
    }
    fn read_gpu_temp(&mut self) -> Result<Option<f64>> {
        self.value(MetricKind::GpuTemp)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: Vec<String>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &Recipient, text: &str) -> Result<()> {
        if self.failing.iter().any(|f| f == recipient.as_str()) {
            anyhow::bail!("chat not found");
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn thresholds() -> Thresholds {
    Thresholds {
        cpu_load: 80.0,
        cpu_temp: 85.0,
        gpu_load: 90.0,
        gpu_temp: 85.0,
    }
}

fn monitor(ticks: Vec<Tick>, notifier: Arc<RecordingNotifier>, recipients: &[&str]) -> Monitor {
    let recipients = recipients.iter().map(|r| Recipient::new(*r)).collect();
    Monitor::new(
        Box::new(ScriptedSensor::new(ticks)),
        AlertEngine::new(thresholds()),
        AlertDispatcher::new(notifier, recipients),
        Duration::from_millis(10),
    )
}

const QUIET: Tick = [Ok(Some(10.0)), Ok(Some(40.0)), Ok(None), Ok(None)];

#[tokio::test]
async fn cpu_load_sequence_alerts_on_rising_edges_only() {
    let notifier = Arc::new(RecordingNotifier::default());
    let loads = [70.0, 85.0, 90.0, 75.0, 95.0];
    let ticks = loads
        .iter()
        .map(|&l| [Ok(Some(l)), Ok(Some(40.0)), Ok(None), Ok(None)])
        .collect();
    let mut monitor = monitor(ticks, notifier.clone(), &["1"]);

    let mut alerted = Vec::new();
    for _ in loads {
        let summary = monitor.tick().await;
        alerted.push(summary.events.len());
    }

    assert_eq!(alerted, vec![0, 1, 0, 0, 1]);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("85.0%"));
    assert!(sent[1].1.contains("95.0%"));
}

#[tokio::test]
async fn simultaneous_crossings_share_one_message_per_recipient() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ticks = vec![[Ok(Some(95.0)), Ok(Some(90.0)), Ok(Some(99.0)), Ok(Some(88.0))]];
    let mut monitor = monitor(ticks, notifier.clone(), &["1", "2"]);

    let summary = monitor.tick().await;

    assert_eq!(summary.events.len(), 4);
    assert_eq!(summary.report.delivered, 2);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, sent[1].1);
    let text = &sent[0].1;
    let cpu_load = text.find("CPU load").unwrap();
    let gpu_temp = text.find("GPU temperature").unwrap();
    assert!(cpu_load < gpu_temp);
}

#[tokio::test]
async fn sensor_failure_clears_and_rearms_the_metric() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ticks = vec![
        [Ok(Some(95.0)), Ok(Some(40.0)), Ok(None), Ok(None)],
        [Err("sysinfo unavailable"), Ok(Some(40.0)), Ok(None), Ok(None)],
        [Ok(Some(96.0)), Ok(Some(40.0)), Ok(None), Ok(None)],
    ];
    let mut monitor = monitor(ticks, notifier.clone(), &["1"]);

    let first = monitor.tick().await;
    assert_eq!(first.events.len(), 1);
    assert!(monitor.engine().state().is_alerting(MetricKind::CpuLoad));

    let second = monitor.tick().await;
    assert!(second.events.is_empty());
    assert_eq!(second.readings[0].value, None);
    assert!(!monitor.engine().state().is_alerting(MetricKind::CpuLoad));

    let third = monitor.tick().await;
    assert_eq!(third.events.len(), 1);
    assert!(monitor.engine().state().is_alerting(MetricKind::CpuLoad));
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn failed_recipient_does_not_block_others_or_the_loop() {
    let notifier = Arc::new(RecordingNotifier {
        failing: vec!["bad".to_string()],
        ..Default::default()
    });
    let ticks = vec![
        [Ok(Some(95.0)), Ok(Some(40.0)), Ok(None), Ok(None)],
        QUIET,
        [Ok(Some(95.0)), Ok(Some(40.0)), Ok(None), Ok(None)],
    ];
    let mut monitor = monitor(ticks, notifier.clone(), &["bad", "good"]);

    let first = monitor.tick().await;
    assert_eq!(first.report.delivered, 1);
    assert_eq!(first.report.failed, 1);

    monitor.tick().await;
    let third = monitor.tick().await;
    assert_eq!(third.report.delivered, 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(r, _)| r == "good"));
}

#[tokio::test]
async fn quiet_ticks_send_nothing() {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut monitor = monitor(vec![QUIET, QUIET, QUIET], notifier.clone(), &["1"]);

    for _ in 0..3 {
        let summary = monitor.tick().await;
        assert!(summary.events.is_empty());
    }
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn run_until_stops_on_shutdown() {
    let notifier = Arc::new(RecordingNotifier::default());
    let ticks = vec![[Ok(Some(95.0)), Ok(Some(40.0)), Ok(None), Ok(None)]; 100];
    let mut monitor = monitor(ticks, notifier.clone(), &["1"]);

    tokio::time::timeout(
        Duration::from_secs(5),
        monitor.run_until(tokio::time::sleep(Duration::from_millis(100))),
    )
    .await
    .expect("loop should stop when shutdown resolves");

    // Stays above the threshold the whole time: one alert.
    assert_eq!(notifier.sent().len(), 1);
    assert!(monitor.engine().state().is_alerting(MetricKind::CpuLoad));
}
