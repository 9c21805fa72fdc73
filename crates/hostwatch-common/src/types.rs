use serde::{Deserialize, Serialize};
use std::fmt;

/// A host metric watched by the threshold monitor.
///
/// The declaration order is the evaluation order of a polling tick, and
/// therefore the order alert events appear in a dispatched batch.
///
/// # Examples
///
/// ```
/// use hostwatch_common::types::MetricKind;
///
/// let kind: MetricKind = "gpu_temp".parse().unwrap();
/// assert_eq!(kind, MetricKind::GpuTemp);
/// assert_eq!(kind.to_string(), "gpu_temp");
/// assert_eq!(kind.unit(), "°C");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CpuLoad,
    CpuTemp,
    GpuLoad,
    GpuTemp,
}

impl MetricKind {
    /// Every kind, in evaluation order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::CpuLoad,
        MetricKind::CpuTemp,
        MetricKind::GpuLoad,
        MetricKind::GpuTemp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::CpuLoad => "cpu_load",
            MetricKind::CpuTemp => "cpu_temp",
            MetricKind::GpuLoad => "gpu_load",
            MetricKind::GpuTemp => "gpu_temp",
        }
    }

    /// Short human label used in alert text (e.g. `"CPU load"`).
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::CpuLoad => "CPU load",
            MetricKind::CpuTemp => "CPU temperature",
            MetricKind::GpuLoad => "GPU load",
            MetricKind::GpuTemp => "GPU temperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::CpuLoad | MetricKind::GpuLoad => "%",
            MetricKind::CpuTemp | MetricKind::GpuTemp => "°C",
        }
    }

    /// Position in [`MetricKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu_load" => Ok(MetricKind::CpuLoad),
            "cpu_temp" => Ok(MetricKind::CpuTemp),
            "gpu_load" => Ok(MetricKind::GpuLoad),
            "gpu_temp" => Ok(MetricKind::GpuTemp),
            _ => Err(format!("unknown metric kind: {s}")),
        }
    }
}

/// One sensor sample for one metric. `value` is `None` when the sensor had
/// nothing to report (no driver, no device, read error).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub kind: MetricKind,
    pub value: Option<f64>,
}

impl Reading {
    pub fn new(kind: MetricKind, value: Option<f64>) -> Self {
        Self { kind, value }
    }

    pub fn absent(kind: MetricKind) -> Self {
        Self { kind, value: None }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Per-metric alert limits, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_load_threshold")]
    pub cpu_load: f64,
    #[serde(default = "default_temp_threshold")]
    pub cpu_temp: f64,
    #[serde(default = "default_load_threshold")]
    pub gpu_load: f64,
    #[serde(default = "default_temp_threshold")]
    pub gpu_temp: f64,
}

fn default_load_threshold() -> f64 {
    90.0
}

fn default_temp_threshold() -> f64 {
    85.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_load: default_load_threshold(),
            cpu_temp: default_temp_threshold(),
            gpu_load: default_load_threshold(),
            gpu_temp: default_temp_threshold(),
        }
    }
}

impl Thresholds {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::CpuLoad => self.cpu_load,
            MetricKind::CpuTemp => self.cpu_temp,
            MetricKind::GpuLoad => self.gpu_load,
            MetricKind::GpuTemp => self.gpu_temp,
        }
    }
}

/// Emitted when a metric crosses above its threshold after having been at or
/// below it (or at process start).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: MetricKind,
    pub value: f64,
    pub threshold: f64,
}

/// An alert destination (chat / user id). Opaque to the core.
///
/// Accepts either an integer or a string when deserialized, so config files
/// can list chat ids as plain numbers.
///
/// # Examples
///
/// ```
/// use hostwatch_common::types::Recipient;
///
/// let ids: Vec<Recipient> = serde_json::from_str(r#"[123456, "@ops_channel"]"#).unwrap();
/// assert_eq!(ids[0].as_str(), "123456");
/// assert_eq!(ids[1].to_string(), "@ops_channel");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RecipientRepr", into = "String")]
pub struct Recipient(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientRepr {
    Number(i64),
    Text(String),
}

impl From<RecipientRepr> for Recipient {
    fn from(repr: RecipientRepr) -> Self {
        match repr {
            RecipientRepr::Number(n) => Recipient(n.to_string()),
            RecipientRepr::Text(s) => Recipient(s.trim().to_string()),
        }
    }
}

impl From<Recipient> for String {
    fn from(r: Recipient) -> Self {
        r.0
    }
}

impl Recipient {
    pub fn new(id: impl Into<String>) -> Self {
        Recipient(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
