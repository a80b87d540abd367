// Background poll loop: one snapshot per tick, strictly serialized, handed to
// the broadcast hub. Ticks that fire while a cycle is still running are
// skipped, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

use crate::aggregator::SnapshotAggregator;
use crate::hub::BroadcastHub;

/// Rate limit for "no subscribers" message (avoid logging every cycle when no one is connected)
const NO_SUBSCRIBERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Components the poller drives, plus its shutdown signal.
pub struct PollerDeps {
    pub aggregator: Arc<SnapshotAggregator>,
    pub hub: Arc<BroadcastHub>,
    pub stats: Arc<PollerStats>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct PollerConfig {
    pub interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Counters shared with whoever wants to report on the poller.
#[derive(Debug, Default)]
pub struct PollerStats {
    pub polls_total: AtomicU64,
    pub missed_cycles_total: AtomicU64,
}

/// Number of ticks that elapsed while a cycle of length `elapsed` was running.
pub fn missed_cycles(elapsed: Duration, period: Duration) -> u64 {
    if period.is_zero() {
        return 0;
    }
    (elapsed.as_nanos() / period.as_nanos()) as u64
}

pub fn spawn(deps: PollerDeps, config: PollerConfig) -> tokio::task::JoinHandle<()> {
    let PollerDeps {
        aggregator,
        hub,
        stats,
        mut shutdown_rx,
    } = deps;
    let PollerConfig {
        interval_ms,
        stats_log_interval_secs,
    } = config;

    let period = Duration::from_millis(interval_ms);
    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);
    let span = tracing::debug_span!("poller", interval_ms);

    tokio::spawn(
        async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut stats_log_tick = interval(stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut last_no_subscribers_log: Option<Instant> = None;

            loop {
                tokio::select! {
                    started = tick.tick() => {
                        let snapshot = aggregator.take_snapshot().await;
                        stats.polls_total.fetch_add(1, Ordering::Relaxed);

                        let report = hub.publish(&snapshot);
                        if report.delivered + report.dropped == 0 {
                            let should_log = last_no_subscribers_log
                                .is_none_or(|t| t.elapsed() >= NO_SUBSCRIBERS_LOG_INTERVAL);
                            if should_log {
                                tracing::debug!(
                                    operation = "publish_snapshot",
                                    "No live subscribers for snapshot updates"
                                );
                                last_no_subscribers_log = Some(Instant::now());
                            }
                        }
                        if report.dropped > 0 {
                            tracing::debug!(
                                operation = "publish_snapshot",
                                sequence_number = snapshot.sequence_number,
                                dropped = report.dropped,
                                "Slow subscribers missed a snapshot"
                            );
                        }

                        let elapsed = started.elapsed();
                        let missed = missed_cycles(elapsed, period);
                        if missed > 0 {
                            stats.missed_cycles_total.fetch_add(missed, Ordering::Relaxed);
                            tracing::warn!(
                                operation = "poll",
                                missed_cycles = missed,
                                elapsed_ms = elapsed.as_millis() as u64,
                                "Poll cycle overran its interval; missed ticks skipped"
                            );
                            // Next cycle starts one full period from now instead of immediately.
                            tick.reset();
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Poller shutting down");
                        break;
                    }
                    _ = stats_log_tick.tick() => {
                        tracing::info!(
                            subscribers = hub.subscriber_count(),
                            polls_total = stats.polls_total.load(Ordering::Relaxed),
                            missed_cycles_total = stats.missed_cycles_total.load(Ordering::Relaxed),
                            "app stats"
                        );
                    }
                }
            }
        }
        .instrument(span),
    )
}
