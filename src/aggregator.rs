// Snapshot aggregation: concurrent fetch of every device section, correlation,
// and atomic publish of the next sequence-numbered snapshot.

use chrono::Utc;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::config::AppConfig;
use crate::correlate::{self, UsageTracker};
use crate::device_repo::{QueryArg, TelemetrySource, paths};
use crate::error::QueryError;
use crate::models::{
    ActiveSession, DhcpLease, HistoryRecord, HotspotUser, InterfaceStat, IpAddressEntry,
    TelemetrySnapshot,
};
use crate::normalize;

pub async fn fetch_addresses(source: &dyn TelemetrySource) -> Result<Vec<IpAddressEntry>, QueryError> {
    let rows = source.query(paths::IP_ADDRESSES, &[]).await?;
    Ok(rows.iter().filter_map(normalize::ip_address).collect())
}

pub async fn fetch_leases(source: &dyn TelemetrySource) -> Result<Vec<DhcpLease>, QueryError> {
    let rows = source.query(paths::DHCP_LEASES, &[]).await?;
    Ok(rows.iter().map(normalize::dhcp_lease).collect())
}

/// Lists interfaces, then queries traffic for each with at most
/// `max_concurrent` requests in flight. Any failed request fails the section.
pub async fn fetch_interfaces(
    source: &dyn TelemetrySource,
    max_concurrent: usize,
) -> Result<Vec<InterfaceStat>, QueryError> {
    let rows = source.query(paths::INTERFACES, &[]).await?;
    let names: Vec<String> = rows.iter().filter_map(normalize::interface_name).collect();
    stream::iter(names)
        .map(|name| async move {
            let args = [QueryArg::with("interface", &name), QueryArg::with("once", "")];
            let monitor = source.query(paths::MONITOR_TRAFFIC, &args).await?;
            Ok::<_, QueryError>(normalize::interface_stat(&name, monitor.first()))
        })
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await
}

pub async fn fetch_users(
    source: &dyn TelemetrySource,
    args: &[QueryArg],
) -> Result<Vec<HotspotUser>, QueryError> {
    let rows = source.query(paths::HOTSPOT_USERS, args).await?;
    Ok(rows.iter().filter_map(normalize::hotspot_user).collect())
}

pub async fn fetch_sessions(
    source: &dyn TelemetrySource,
    args: &[QueryArg],
) -> Result<Vec<ActiveSession>, QueryError> {
    let rows = source.query(paths::HOTSPOT_ACTIVE, args).await?;
    Ok(rows.iter().map(normalize::active_session).collect())
}

pub async fn fetch_history(
    source: &dyn TelemetrySource,
    args: &[QueryArg],
) -> Result<Vec<HistoryRecord>, QueryError> {
    let rows = source.query(paths::HOTSPOT_HOSTS, args).await?;
    Ok(rows.iter().map(normalize::history_record).collect())
}

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Upper bound for one section (all of its queries) in a poll cycle.
    pub section_timeout: Duration,
    pub max_concurrent_interface_queries: usize,
}

impl AggregatorConfig {
    /// Sections finish strictly inside one poll interval, leaving headroom for
    /// correlation and publish.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            section_timeout: config.polling.section_timeout(),
            max_concurrent_interface_queries: config.polling.max_concurrent_interface_queries,
        }
    }
}

pub struct SnapshotAggregator {
    source: Arc<dyn TelemetrySource>,
    config: AggregatorConfig,
    usage: Mutex<UsageTracker>,
    latest: watch::Sender<Arc<TelemetrySnapshot>>,
}

impl SnapshotAggregator {
    pub fn new(source: Arc<dyn TelemetrySource>, config: AggregatorConfig) -> Self {
        let (latest, _) = watch::channel(Arc::new(TelemetrySnapshot::empty()));
        Self {
            source,
            config,
            usage: Mutex::new(UsageTracker::new()),
            latest,
        }
    }

    /// Latest published snapshot (sequence 0 before the first poll completes).
    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        self.latest.borrow().clone()
    }

    async fn section<T: Default>(
        &self,
        name: &'static str,
        fetch: impl Future<Output = Result<T, QueryError>>,
    ) -> T {
        match timeout(self.config.section_timeout, fetch).await {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                warn!(
                    operation = "take_snapshot",
                    section = name,
                    error = %e,
                    "Section query failed; publishing it empty"
                );
                T::default()
            }
            Err(_) => {
                warn!(
                    operation = "take_snapshot",
                    section = name,
                    timeout_ms = self.config.section_timeout.as_millis() as u64,
                    "Section query timed out; publishing it empty"
                );
                T::default()
            }
        }
    }

    /// Runs one poll cycle and publishes its snapshot. Never fails: a failed
    /// section is published empty while the others still populate.
    #[instrument(skip(self), fields(operation = "take_snapshot"))]
    pub async fn take_snapshot(&self) -> Arc<TelemetrySnapshot> {
        let source = self.source.as_ref();
        let (addresses, leases, interfaces, users, sessions) = tokio::join!(
            self.section("addresses", fetch_addresses(source)),
            self.section("leases", fetch_leases(source)),
            self.section(
                "interfaces",
                fetch_interfaces(source, self.config.max_concurrent_interface_queries)
            ),
            self.section("users", fetch_users(source, &[])),
            self.section("sessions", fetch_sessions(source, &[])),
        );

        let active_ips = correlate::correlate_active_ips(&addresses, &leases);
        let usage_by_ip = self
            .usage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .sample(&active_ips, &sessions);
        let users = correlate::correlate_users(&users, &sessions);

        let mut published = None;
        self.latest.send_modify(|current| {
            let snapshot = Arc::new(TelemetrySnapshot {
                sequence_number: current.sequence_number + 1,
                taken_at: Utc::now(),
                interfaces,
                active_ips,
                usage_by_ip,
                users,
            });
            *current = snapshot.clone();
            published = Some(snapshot);
        });
        let snapshot = published.unwrap_or_else(|| self.latest());
        debug!(
            sequence_number = snapshot.sequence_number,
            interfaces = snapshot.interfaces.len(),
            users = snapshot.users.len(),
            active_ips = snapshot.active_ips.len(),
            "Snapshot published"
        );
        snapshot
    }
}
