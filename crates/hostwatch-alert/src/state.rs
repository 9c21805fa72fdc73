use hostwatch_common::types::MetricKind;

/// Debounce flags, one per [`MetricKind`].
///
/// `true` means the metric is above its threshold and the alert for the
/// current breach has already been emitted. A fresh state has every flag
/// cleared; nothing resets it other than a below-threshold or absent reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    alerting: [bool; MetricKind::ALL.len()],
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alerting(&self, kind: MetricKind) -> bool {
        self.alerting[kind.index()]
    }

    pub(crate) fn set(&mut self, kind: MetricKind, alerting: bool) {
        self.alerting[kind.index()] = alerting;
    }

    /// Kinds whose breach is currently latched, in evaluation order.
    pub fn active_kinds(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|k| self.is_alerting(*k))
            .collect()
    }
}
