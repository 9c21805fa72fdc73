use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::System;

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub host_name: Option<String>,
    pub architecture: String,
    pub boot_time: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
    pub load_average: [f64; 3],
}

pub fn collect() -> SystemInfo {
    let load = System::load_average();

    SystemInfo {
        os_name: System::name(),
        os_version: System::os_version(),
        kernel_version: System::kernel_version(),
        host_name: System::host_name(),
        architecture: std::env::consts::ARCH.to_string(),
        boot_time: DateTime::from_timestamp(System::boot_time() as i64, 0),
        uptime_secs: System::uptime(),
        load_average: [load.one, load.five, load.fifteen],
    }
}
