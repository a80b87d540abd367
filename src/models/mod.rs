// Domain models: device entities, correlated views and the broadcast snapshot

mod log;
mod network;
mod snapshot;
mod user;

pub use log::LogEntry;
pub use network::{DhcpLease, InterfaceStat, IpAddressEntry, UsageSample};
pub use snapshot::{BANDWIDTH_UPDATE, BroadcastEnvelope, TelemetrySnapshot};
pub use user::{
    ActiveSession, HistoryEntry, HistoryRecord, HotspotUser, SessionDetail, UserDetail, UserView,
};
