use crate::memory::percent;
use serde::Serialize;
use sysinfo::System;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub total: usize,
    /// Busiest processes by CPU usage, highest first.
    pub top: Vec<ProcessEntry>,
}

/// Samples process CPU usage over one refresh interval and returns the
/// `top_n` busiest. Blocks for [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`].
pub fn collect(top_n: usize) -> ProcessSummary {
    let mut system = System::new_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_all();

    let total_memory = system.total_memory();
    let mut entries: Vec<ProcessEntry> = system
        .processes()
        .values()
        .map(|p| ProcessEntry {
            pid: p.pid().as_u32(),
            name: p.name().to_string_lossy().to_string(),
            cpu_percent: p.cpu_usage(),
            memory_percent: percent(p.memory(), total_memory),
        })
        .collect();

    let total = entries.len();
    rank_by_cpu(&mut entries);
    entries.truncate(top_n);

    ProcessSummary {
        total,
        top: entries,
    }
}

fn rank_by_cpu(entries: &mut [ProcessEntry]) {
    entries.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then(a.pid.cmp(&b.pid))
    });
}
