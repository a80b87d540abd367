use anyhow::Result;
use hotspot_monitor::device_repo::{DeviceRepo, TelemetrySource};
use hotspot_monitor::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let device = Arc::new(DeviceRepo::new(&app_config.device));
    // Connect failures are not fatal: every later request retries lazily.
    if let Err(e) = device.connect().await {
        tracing::warn!(error = %e, addr = device.addr(), "Initial device connect failed; will retry on next poll");
    }
    let source: Arc<dyn TelemetrySource> = device;

    let aggregator = Arc::new(aggregator::SnapshotAggregator::new(
        source.clone(),
        aggregator::AggregatorConfig::from_app_config(&app_config),
    ));
    let hub = Arc::new(hub::BroadcastHub::new(
        app_config.publishing.subscriber_queue_capacity,
    ));
    let query = Arc::new(query::QueryService::new(aggregator.clone(), source.clone()));
    let commands = Arc::new(commands::CommandExecutor::new(source));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let poller_handle = worker::spawn(
        worker::PollerDeps {
            aggregator,
            hub: hub.clone(),
            stats: Arc::new(worker::PollerStats::default()),
            shutdown_rx,
        },
        worker::PollerConfig {
            interval_ms: app_config.polling.interval_ms,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let state = routes::AppState::new(query, commands, hub);
    let api_addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let stream_addr = format!("{}:{}", app_config.server.host, app_config.server.stream_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    let stream_listener = tokio::net::TcpListener::bind(&stream_addr).await?;
    tracing::info!("REST API listening on http://{}", api_addr);
    tracing::info!("Snapshot stream listening on ws://{}", stream_addr);

    tokio::select! {
        result = axum::serve(api_listener, routes::api(state.clone())) => {
            result?;
        }
        result = axum::serve(stream_listener, routes::stream(state)) => {
            result?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = poller_handle.await;
        }
    }

    Ok(())
}
