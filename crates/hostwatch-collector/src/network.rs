use serde::Serialize;
use sysinfo::Networks;

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub interface: String,
    pub mac_address: String,
    pub addresses: Vec<String>,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
}

/// Cumulative counters per interface, sorted by interface name.
pub fn collect() -> Vec<NetworkInfo> {
    let networks = Networks::new_with_refreshed_list();

    let mut interfaces: Vec<NetworkInfo> = networks
        .iter()
        .map(|(name, data)| NetworkInfo {
            interface: name.clone(),
            mac_address: data.mac_address().to_string(),
            addresses: data
                .ip_networks()
                .iter()
                .map(|net| format!("{}/{}", net.addr, net.prefix))
                .collect(),
            bytes_received: data.total_received(),
            bytes_sent: data.total_transmitted(),
            packets_received: data.total_packets_received(),
            packets_sent: data.total_packets_transmitted(),
        })
        .collect();

    interfaces.sort_by(|a, b| a.interface.cmp(&b.interface));
    interfaces
}
