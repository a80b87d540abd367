// Joins users, sessions, history and address sources into the views that are
// served and broadcast. Recomputed from scratch every cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{
    ActiveSession, DhcpLease, HistoryRecord, HotspotUser, IpAddressEntry, UsageSample,
    UserDetail, UserView,
};

fn user_view(user: &HotspotUser, sessions: &[ActiveSession]) -> UserView {
    let active_session_count = sessions.iter().filter(|s| s.user == user.name).count();
    UserView {
        username: user.name.clone(),
        profile: user.profile.clone(),
        uptime_seconds: user.uptime_seconds,
        bytes_in: user.bytes_in,
        bytes_out: user.bytes_out,
        disabled: user.disabled,
        comment: user.comment.clone(),
        limit_bytes_in: user.limit_bytes_in,
        limit_bytes_out: user.limit_bytes_out,
        is_online: active_session_count > 0,
        active_session_count,
    }
}

/// One view per user, in input order. Sessions are counted, not expanded.
pub fn correlate_users(users: &[HotspotUser], sessions: &[ActiveSession]) -> Vec<UserView> {
    users.iter().map(|u| user_view(u, sessions)).collect()
}

/// Union of static router addresses (prefix stripped) and bound DHCP lease addresses.
pub fn correlate_active_ips(addresses: &[IpAddressEntry], leases: &[DhcpLease]) -> BTreeSet<String> {
    let statics = addresses.iter().filter_map(|a| {
        let ip = a.address.split('/').next().unwrap_or_default();
        (!ip.is_empty()).then(|| ip.to_string())
    });
    let leased = leases.iter().filter_map(|l| l.active_address.clone());
    statics.chain(leased).collect()
}

/// Exact-match lookup; attaches every session and history row of that user.
pub fn build_user_detail(
    username: &str,
    users: &[HotspotUser],
    sessions: &[ActiveSession],
    history: &[HistoryRecord],
) -> Option<UserDetail> {
    let user = users.iter().find(|u| u.name == username)?;
    Some(UserDetail {
        user: user_view(user, sessions),
        sessions: sessions
            .iter()
            .filter(|s| s.user == username)
            .map(|s| s.detail.clone())
            .collect(),
        history: history
            .iter()
            .filter(|h| h.user == username)
            .map(|h| h.entry.clone())
            .collect(),
    })
}

/// Per-IP byte deltas across poll cycles.
///
/// Counters come from active sessions (summed when several share an IP).
/// The first sighting of an IP, an IP without session counters, and a counter
/// reset all report zero.
#[derive(Debug, Default)]
pub struct UsageTracker {
    previous: HashMap<String, (u64, u64)>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns one sample per active IP and forgets IPs no longer active.
    pub fn sample(
        &mut self,
        active_ips: &BTreeSet<String>,
        sessions: &[ActiveSession],
    ) -> BTreeMap<String, UsageSample> {
        let mut current: HashMap<String, (u64, u64)> = HashMap::new();
        for s in sessions {
            if !active_ips.contains(&s.detail.ip_address) {
                continue;
            }
            let entry = current.entry(s.detail.ip_address.clone()).or_default();
            entry.0 = entry.0.saturating_add(s.detail.bytes_in);
            entry.1 = entry.1.saturating_add(s.detail.bytes_out);
        }

        let usage = active_ips
            .iter()
            .map(|ip| {
                let sample = match (current.get(ip), self.previous.get(ip)) {
                    (Some(&(rx, tx)), Some(&(prev_rx, prev_tx))) => UsageSample {
                        rx: rx.saturating_sub(prev_rx),
                        tx: tx.saturating_sub(prev_tx),
                    },
                    _ => UsageSample::default(),
                };
                (ip.clone(), sample)
            })
            .collect();

        self.previous = current;
        usage
    }
}
