use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cpu::{CpuCollector, CpuInfo};
use crate::disk::{self, DiskInfo};
use crate::gpu::{GpuCollector, GpuMetrics};
use crate::memory::{MemoryCollector, MemoryInfo};
use crate::network::{self, NetworkInfo};
use crate::process::{self, ProcessSummary};
use crate::system::{self, SystemInfo};

/// Default number of processes listed in a snapshot.
pub const DEFAULT_TOP_PROCESSES: usize = 10;

/// Everything an operator can ask about the host, collected on demand.
///
/// This is the structured answer to a status query; turning it into
/// chat text is the transport's job.
#[derive(Debug, Clone, Serialize)]
pub struct HostSnapshot {
    pub collected_at: DateTime<Utc>,
    pub system: SystemInfo,
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub gpus: Vec<GpuMetrics>,
    pub disks: Vec<DiskInfo>,
    pub networks: Vec<NetworkInfo>,
    pub processes: ProcessSummary,
}

impl HostSnapshot {
    /// Collects every section. Blocking: process CPU sampling waits one
    /// sysinfo refresh interval, so call it from a blocking context.
    pub fn collect(top_processes: usize) -> Self {
        let mut cpu = CpuCollector::new();
        let processes = process::collect(top_processes);
        // the process sampling sleep doubles as the CPU usage interval
        let cpu = cpu.collect();

        let gpus = match GpuCollector::new().collect() {
            Ok(gpus) => gpus,
            Err(e) => {
                tracing::warn!(error = %e, "GPU section omitted from snapshot");
                Vec::new()
            }
        };

        Self {
            collected_at: Utc::now(),
            system: system::collect(),
            cpu,
            memory: MemoryCollector::new().collect(),
            gpus,
            disks: disk::collect(),
            networks: network::collect(),
            processes,
        }
    }
}
