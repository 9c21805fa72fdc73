use hostwatch_alert::engine::AlertEngine;
use hostwatch_collector::Sensor;
use hostwatch_common::types::{AlertEvent, MetricKind, Reading};
use hostwatch_notify::dispatcher::{AlertDispatcher, DispatchReport};
use std::future::Future;
use std::time::Duration;

/// What one tick saw and did.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub readings: Vec<Reading>,
    pub events: Vec<AlertEvent>,
    pub report: DispatchReport,
}

/// The polling loop: read, evaluate, dispatch, sleep.
pub struct Monitor {
    sensor: Box<dyn Sensor>,
    engine: AlertEngine,
    dispatcher: AlertDispatcher,
    interval: Duration,
}

impl Monitor {
    pub fn new(
        sensor: Box<dyn Sensor>,
        engine: AlertEngine,
        dispatcher: AlertDispatcher,
        interval: Duration,
    ) -> Self {
        Self {
            sensor,
            engine,
            dispatcher,
            interval,
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    /// Reads every metric once, in `MetricKind::ALL` order. A failed read
    /// becomes an absent reading.
    pub fn read_all(&mut self) -> Vec<Reading> {
        MetricKind::ALL
            .iter()
            .map(|&kind| match self.sensor.read(kind) {
                Ok(value) => Reading::new(kind, value),
                Err(e) => {
                    tracing::warn!(metric = %kind, error = %e, "Sensor read failed");
                    Reading::absent(kind)
                }
            })
            .collect()
    }

    /// Runs one read-evaluate-dispatch cycle.
    pub async fn tick(&mut self) -> TickSummary {
        let readings = self.read_all();
        tracing::debug!(readings = ?readings, "Collected readings");

        let events = self.engine.ingest(&readings);
        let report = if events.is_empty() {
            DispatchReport::default()
        } else {
            self.dispatcher.dispatch(&events).await
        };

        TickSummary {
            readings,
            events,
            report,
        }
    }

    /// Ticks until `shutdown` resolves, sleeping `interval` after each tick.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            recipients = self.dispatcher.recipients().len(),
            "Starting polling loop"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.tick() => {}
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Polling loop stopped");
    }
}
