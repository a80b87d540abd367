// Raw device rows -> typed domain entities. Pure functions, no I/O.

use crate::device_repo::Record;
use crate::models::{
    ActiveSession, DhcpLease, HistoryEntry, HistoryRecord, HotspotUser, InterfaceStat,
    IpAddressEntry, LogEntry, SessionDetail,
};

/// Literal the device uses for boolean true.
pub const TRUE_TOKEN: &str = "true";

fn unit_seconds(unit: char) -> Option<u64> {
    match unit {
        'w' => Some(604_800),
        'd' => Some(86_400),
        'h' => Some(3_600),
        'm' => Some(60),
        's' => Some(1),
        _ => None,
    }
}

/// Parses durations like `1w2d3h4m5s` or `2h30m` into seconds.
///
/// Each `<integer><unit>` run adds `value * unit`. Runs with an unknown unit
/// or no digits are skipped; empty input is 0.
pub fn parse_uptime(text: &str) -> u64 {
    let mut total: u64 = 0;
    let mut value: Option<u64> = None;
    for c in text.chars() {
        if let Some(d) = c.to_digit(10) {
            value = Some(
                value
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(d as u64),
            );
            continue;
        }
        if let (Some(v), Some(secs)) = (value, unit_seconds(c)) {
            total = total.saturating_add(v.saturating_mul(secs));
        }
        value = None;
    }
    total
}

/// Absent, empty or non-numeric counters read as 0.
pub fn parse_byte_count(text: Option<&str>) -> u64 {
    match text.map(str::trim) {
        None | Some("") => 0,
        Some(s) => s.parse().unwrap_or(0),
    }
}

pub fn parse_disabled_flag(text: Option<&str>) -> bool {
    text == Some(TRUE_TOKEN)
}

fn field(record: &Record, key: &str) -> String {
    record.get(key).cloned().unwrap_or_default()
}

fn count(record: &Record, key: &str) -> u64 {
    parse_byte_count(record.get(key).map(String::as_str))
}

fn uptime(record: &Record, key: &str) -> u64 {
    record.get(key).map(|s| parse_uptime(s)).unwrap_or(0)
}

pub fn ip_address(record: &Record) -> Option<IpAddressEntry> {
    let address = record.get("address").filter(|a| !a.is_empty())?;
    Some(IpAddressEntry {
        address: address.clone(),
        interface: field(record, "interface"),
    })
}

pub fn dhcp_lease(record: &Record) -> DhcpLease {
    DhcpLease {
        address: field(record, "address"),
        active_address: record
            .get("active-address")
            .filter(|a| !a.is_empty())
            .cloned(),
        mac_address: field(record, "mac-address"),
        host_name: field(record, "host-name"),
        status: field(record, "status"),
    }
}

/// Interface names from an interface listing; nameless rows are skipped.
pub fn interface_name(record: &Record) -> Option<String> {
    record.get("name").filter(|n| !n.is_empty()).cloned()
}

/// Builds throughput from a single monitor-traffic row.
pub fn interface_stat(name: &str, monitor: Option<&Record>) -> InterfaceStat {
    match monitor {
        Some(r) => InterfaceStat::new(
            name,
            count(r, "rx-bits-per-second"),
            count(r, "tx-bits-per-second"),
        ),
        None => InterfaceStat::new(name, 0, 0),
    }
}

pub fn hotspot_user(record: &Record) -> Option<HotspotUser> {
    let name = record.get("name").filter(|n| !n.is_empty())?;
    Some(HotspotUser {
        id: field(record, ".id"),
        name: name.clone(),
        profile: field(record, "profile"),
        uptime_seconds: uptime(record, "uptime"),
        bytes_in: count(record, "bytes-in"),
        bytes_out: count(record, "bytes-out"),
        disabled: parse_disabled_flag(record.get("disabled").map(String::as_str)),
        comment: field(record, "comment"),
        limit_bytes_in: count(record, "limit-bytes-in"),
        limit_bytes_out: count(record, "limit-bytes-out"),
    })
}

pub fn active_session(record: &Record) -> ActiveSession {
    ActiveSession {
        user: field(record, "user"),
        detail: SessionDetail {
            ip_address: field(record, "address"),
            mac_address: field(record, "mac-address"),
            login_time: field(record, "login-time"),
            uptime_seconds: uptime(record, "uptime"),
            session_id: field(record, ".id"),
            bytes_in: count(record, "bytes-in"),
            bytes_out: count(record, "bytes-out"),
        },
    }
}

pub fn history_record(record: &Record) -> HistoryRecord {
    HistoryRecord {
        user: field(record, "user"),
        entry: HistoryEntry {
            ip_address: field(record, "address"),
            mac_address: field(record, "mac-address"),
            last_seen: field(record, "last-seen"),
            status: field(record, "status"),
            host: field(record, "host-name"),
            bytes_in: count(record, "bytes-in"),
            bytes_out: count(record, "bytes-out"),
        },
    }
}

pub fn log_entry(record: &Record) -> LogEntry {
    LogEntry {
        id: field(record, ".id"),
        time: field(record, "time"),
        topics: field(record, "topics"),
        message: field(record, "message"),
    }
}
