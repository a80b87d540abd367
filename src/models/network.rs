// Addresses, leases and interface throughput

use serde::{Deserialize, Serialize};

/// Throughput of one interface at poll time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStat {
    pub name: String,
    pub rx_bits_per_second: u64,
    pub tx_bits_per_second: u64,
    pub rx_kbps: f64,
    pub tx_kbps: f64,
}

impl InterfaceStat {
    pub fn new(name: impl Into<String>, rx_bits_per_second: u64, tx_bits_per_second: u64) -> Self {
        Self {
            name: name.into(),
            rx_bits_per_second,
            tx_bits_per_second,
            rx_kbps: rx_bits_per_second as f64 / 1000.0,
            tx_kbps: tx_bits_per_second as f64 / 1000.0,
        }
    }
}

/// Bytes moved by one IP since the previous poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    pub rx: u64,
    pub tx: u64,
}

/// Statically configured router address, e.g. `192.168.88.1/24`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAddressEntry {
    pub address: String,
    pub interface: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpLease {
    pub address: String,
    /// Set only while the lease is bound.
    pub active_address: Option<String>,
    pub mac_address: String,
    pub host_name: String,
    pub status: String,
}
