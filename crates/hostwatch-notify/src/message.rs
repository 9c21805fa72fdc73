use hostwatch_common::types::{AlertEvent, MetricKind};
use std::fmt::Write;

const HEADER: &str = "🔔 Host status alert";

/// Renders one tick's alerts as a single plain-text message, one line per
/// event in the order given.
///
/// ```
/// use hostwatch_common::types::{AlertEvent, MetricKind};
/// use hostwatch_notify::message::render_alert_message;
///
/// let text = render_alert_message(
///     &[AlertEvent { kind: MetricKind::CpuLoad, value: 93.0, threshold: 80.0 }],
///     Some("web-01"),
/// );
/// assert!(text.contains("web-01"));
/// assert!(text.contains("High CPU load: 93.0% (threshold 80.0%)"));
/// ```
pub fn render_alert_message(events: &[AlertEvent], host: Option<&str>) -> String {
    let mut text = match host {
        Some(host) => format!("{HEADER} ({host}):\n"),
        None => format!("{HEADER}:\n"),
    };

    for event in events {
        let icon = match event.kind {
            MetricKind::CpuLoad | MetricKind::GpuLoad => "⚠️",
            MetricKind::CpuTemp | MetricKind::GpuTemp => "🌡️",
        };
        let unit = event.kind.unit();
        let _ = write!(
            text,
            "\n{icon} High {label}: {value:.1}{unit} (threshold {threshold:.1}{unit})",
            label = event.kind.label(),
            value = event.value,
            threshold = event.threshold,
        );
    }

    text
}
