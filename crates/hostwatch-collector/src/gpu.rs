//! NVML-based GPU metrics.
//!
//! NVML initialisation is optional: without NVIDIA drivers the collector
//! reports zero GPUs instead of failing.

use anyhow::Result;
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;
use serde::Serialize;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-GPU snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct GpuMetrics {
    pub gpu_index: u32,
    pub name: Option<String>,
    pub utilization_percent: u32,
    pub temperature_celsius: u32,
    pub vram_used_mb: u64,
    pub vram_total_mb: u64,
}

pub struct GpuCollector {
    /// `None` when NVML could not be initialised.
    nvml: Option<Nvml>,
}

impl GpuCollector {
    pub fn new() -> Self {
        let nvml = match Nvml::init() {
            Ok(nvml) => {
                tracing::info!("NVML initialised");
                Some(nvml)
            }
            Err(e) => {
                tracing::info!(error = %e, "NVML unavailable, GPU metrics disabled");
                None
            }
        };
        Self { nvml }
    }

    pub fn gpu_count(&self) -> u32 {
        self.nvml
            .as_ref()
            .and_then(|nvml| nvml.device_count().ok())
            .unwrap_or(0)
    }

    /// Metrics for every visible GPU. A device that fails to report is
    /// skipped; failing to enumerate devices at all is an error.
    pub fn collect(&self) -> Result<Vec<GpuMetrics>> {
        let Some(nvml) = self.nvml.as_ref() else {
            return Ok(Vec::new());
        };

        let device_count = nvml.device_count()?;
        let mut metrics = Vec::with_capacity(device_count as usize);

        for idx in 0..device_count {
            match collect_device(nvml, idx) {
                Ok(m) => metrics.push(m),
                Err(e) => {
                    tracing::warn!(gpu_index = idx, error = %e, "Skipping GPU, metrics read failed");
                }
            }
        }

        Ok(metrics)
    }
}

impl Default for GpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_device(nvml: &Nvml, idx: u32) -> Result<GpuMetrics, nvml_wrapper::error::NvmlError> {
    let device = nvml.device_by_index(idx)?;

    let utilization = device.utilization_rates()?;
    let temperature = device.temperature(TemperatureSensor::Gpu)?;
    let mem_info = device.memory_info()?;

    Ok(GpuMetrics {
        gpu_index: idx,
        name: device.name().ok(),
        utilization_percent: utilization.gpu,
        temperature_celsius: temperature,
        vram_used_mb: mem_info.used / BYTES_PER_MB,
        vram_total_mb: mem_info.total / BYTES_PER_MB,
    })
}

/// Mean of `field` across devices, `None` without devices.
pub fn average(metrics: &[GpuMetrics], field: impl Fn(&GpuMetrics) -> f64) -> Option<f64> {
    crate::mean(metrics.iter().map(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(idx: u32, util: u32, temp: u32) -> GpuMetrics {
        GpuMetrics {
            gpu_index: idx,
            name: None,
            utilization_percent: util,
            temperature_celsius: temp,
            vram_used_mb: 0,
            vram_total_mb: 0,
        }
    }

    #[test]
    fn average_across_devices() {
        let metrics = vec![gpu(0, 30, 60), gpu(1, 90, 80)];
        assert_eq!(average(&metrics, |m| m.utilization_percent as f64), Some(60.0));
        assert_eq!(average(&metrics, |m| m.temperature_celsius as f64), Some(70.0));
    }

    #[test]
    fn average_without_devices_is_absent() {
        assert_eq!(average(&[], |m| m.utilization_percent as f64), None);
    }

    #[test]
    fn collector_without_drivers_reports_no_gpus() {
        // Must not panic on hosts without NVIDIA drivers (CI).
        let collector = GpuCollector::new();
        if collector.gpu_count() == 0 {
            assert!(collector.collect().map(|m| m.is_empty()).unwrap_or(true));
        }
    }
}
