// Hotspot users, their sessions and connection history

use serde::{Deserialize, Serialize};

/// Base user account as configured on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotUser {
    /// Device-internal row id, required for set/remove.
    pub id: String,
    pub name: String,
    pub profile: String,
    pub uptime_seconds: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub disabled: bool,
    pub comment: String,
    pub limit_bytes_in: u64,
    pub limit_bytes_out: u64,
}

/// One logged-in session, tagged with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub user: String,
    pub detail: SessionDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub ip_address: String,
    pub mac_address: String,
    pub login_time: String,
    pub uptime_seconds: u64,
    pub session_id: String,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// One connection-history row, tagged with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub user: String,
    pub entry: HistoryEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub ip_address: String,
    pub mac_address: String,
    pub last_seen: String,
    pub status: String,
    pub host: String,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// User row as broadcast and listed: base record plus session count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub username: String,
    pub profile: String,
    pub uptime_seconds: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub disabled: bool,
    pub comment: String,
    pub limit_bytes_in: u64,
    pub limit_bytes_out: u64,
    pub is_online: bool,
    pub active_session_count: usize,
}

/// Per-user detail: the view plus every matching session and history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserView,
    pub sessions: Vec<SessionDetail>,
    pub history: Vec<HistoryEntry>,
}
