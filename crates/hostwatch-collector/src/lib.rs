//! Host sensors for the hostwatch agent.
//!
//! [`Sensor`] is what the polling loop reads once per tick: one optional
//! value per [`MetricKind`]. [`HostSensor`] backs it with `sysinfo` for the
//! CPU and NVML for NVIDIA GPUs. The remaining modules gather the richer,
//! on-demand [`snapshot::HostSnapshot`] (memory, disks, network, processes,
//! uptime).

pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod process;
pub mod snapshot;
pub mod system;

use anyhow::Result;
use hostwatch_common::types::MetricKind;

use crate::cpu::CpuCollector;
use crate::gpu::GpuCollector;

/// Source of the four monitored readings.
///
/// `Ok(None)` means the host has nothing to report for that metric (no
/// sensor, no GPU). An `Err` is a failed read; callers treat both the same.
pub trait Sensor: Send {
    fn read_cpu_load(&mut self) -> Result<Option<f64>>;

    fn read_cpu_temp(&mut self) -> Result<Option<f64>>;

    fn read_gpu_load(&mut self) -> Result<Option<f64>>;

    fn read_gpu_temp(&mut self) -> Result<Option<f64>>;

    fn read(&mut self, kind: MetricKind) -> Result<Option<f64>> {
        match kind {
            MetricKind::CpuLoad => self.read_cpu_load(),
            MetricKind::CpuTemp => self.read_cpu_temp(),
            MetricKind::GpuLoad => self.read_gpu_load(),
            MetricKind::GpuTemp => self.read_gpu_temp(),
        }
    }
}

/// The real host: `sysinfo` for CPU load and temperature, NVML for GPUs.
pub struct HostSensor {
    cpu: CpuCollector,
    gpu: GpuCollector,
}

impl HostSensor {
    pub fn new() -> Self {
        Self {
            cpu: CpuCollector::new(),
            gpu: GpuCollector::new(),
        }
    }

    pub fn gpu_count(&self) -> u32 {
        self.gpu.gpu_count()
    }
}

impl Default for HostSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensor for HostSensor {
    fn read_cpu_load(&mut self) -> Result<Option<f64>> {
        Ok(Some(self.cpu.global_usage()))
    }

    fn read_cpu_temp(&mut self) -> Result<Option<f64>> {
        Ok(cpu::average_temperature())
    }

    fn read_gpu_load(&mut self) -> Result<Option<f64>> {
        Ok(gpu::average(&self.gpu.collect()?, |m| m.utilization_percent as f64))
    }

    fn read_gpu_temp(&mut self) -> Result<Option<f64>> {
        Ok(gpu::average(&self.gpu.collect()?, |m| m.temperature_celsius as f64))
    }
}

/// Arithmetic mean, `None` for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
