use serde::Serialize;
use sysinfo::{Components, System};

/// Per-core sample.
#[derive(Debug, Clone, Serialize)]
pub struct CoreInfo {
    pub index: usize,
    pub usage_percent: f32,
    pub frequency_mhz: u64,
}

/// One temperature-reporting component (e.g. `"coretemp Package id 0"`).
#[derive(Debug, Clone, Serialize)]
pub struct ComponentTemperature {
    pub label: String,
    pub celsius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuInfo {
    /// `None` when the platform does not expose the physical topology.
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub global_usage_percent: f64,
    pub cores: Vec<CoreInfo>,
    /// Mean over `temperatures`, `None` when nothing reports.
    pub average_temperature: Option<f64>,
    pub temperatures: Vec<ComponentTemperature>,
}

pub struct CpuCollector {
    system: System,
}

impl CpuCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self { system }
    }

    /// Global usage since the previous refresh, in percent.
    pub fn global_usage(&mut self) -> f64 {
        self.system.refresh_cpu_all();
        self.system.global_cpu_usage() as f64
    }

    pub fn collect(&mut self) -> CpuInfo {
        let global_usage_percent = self.global_usage();

        let cores = self
            .system
            .cpus()
            .iter()
            .enumerate()
            .map(|(index, cpu)| CoreInfo {
                index,
                usage_percent: cpu.cpu_usage(),
                frequency_mhz: cpu.frequency(),
            })
            .collect::<Vec<_>>();

        let temperatures = component_temperatures();
        let average_temperature = crate::mean(temperatures.iter().map(|t| t.celsius as f64));

        CpuInfo {
            physical_cores: self.system.physical_core_count(),
            logical_cores: cores.len(),
            global_usage_percent,
            cores,
            average_temperature,
            temperatures,
        }
    }
}

impl Default for CpuCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Every component currently reporting a usable temperature.
pub fn component_temperatures() -> Vec<ComponentTemperature> {
    let components = Components::new_with_refreshed_list();
    components
        .iter()
        .filter_map(|c| {
            let celsius = c.temperature();
            // sysinfo reports NaN for sensors it could not read
            celsius.is_finite().then(|| ComponentTemperature {
                label: c.label().to_string(),
                celsius,
            })
        })
        .collect()
}

/// Mean temperature across all reporting zones.
pub fn average_temperature() -> Option<f64> {
    crate::mean(component_temperatures().iter().map(|t| t.celsius as f64))
}
