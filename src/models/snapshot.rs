// Versioned snapshot and the envelope it is streamed in

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{InterfaceStat, UsageSample, UserView};

/// Envelope `type` for snapshot updates.
pub const BANDWIDTH_UPDATE: &str = "bandwidth_update";

/// One poll cycle's aggregated state. Never mutated after publish; shared as `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub sequence_number: u64,
    pub taken_at: DateTime<Utc>,
    pub interfaces: Vec<InterfaceStat>,
    #[serde(rename = "activeIPs")]
    pub active_ips: BTreeSet<String>,
    #[serde(rename = "usageByIP")]
    pub usage_by_ip: BTreeMap<String, UsageSample>,
    pub users: Vec<UserView>,
}

impl TelemetrySnapshot {
    /// Placeholder published before the first poll completes (sequence 0).
    pub fn empty() -> Self {
        Self {
            sequence_number: 0,
            taken_at: Utc::now(),
            interfaces: Vec::new(),
            active_ips: BTreeSet::new(),
            usage_by_ip: BTreeMap::new(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Arc<TelemetrySnapshot>,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastEnvelope {
    pub fn bandwidth_update(snapshot: Arc<TelemetrySnapshot>) -> Self {
        Self {
            kind: BANDWIDTH_UPDATE.to_string(),
            data: snapshot,
            timestamp: Utc::now(),
        }
    }
}
