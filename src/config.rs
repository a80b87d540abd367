use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    /// REST API port.
    pub port: u16,
    /// WebSocket streaming port.
    pub stream_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    #[serde(default = "default_device_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Upper bound for a single request/response exchange; a section whose
    /// query exceeds it is published empty for that cycle.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

fn default_device_port() -> u16 {
    8728
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_query_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound for one snapshot section. Must be below `interval_ms`;
    /// when unset, two thirds of the interval.
    #[serde(default)]
    pub section_timeout_ms: Option<u64>,
    /// Max in-flight per-interface traffic queries in one poll cycle.
    #[serde(default = "default_max_concurrent_interface_queries")]
    pub max_concurrent_interface_queries: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            section_timeout_ms: None,
            max_concurrent_interface_queries: default_max_concurrent_interface_queries(),
        }
    }
}

fn default_interval_ms() -> u64 {
    3000
}

impl PollingConfig {
    /// Section bound that leaves the rest of the interval for correlation and publish.
    pub fn section_timeout(&self) -> Duration {
        let ms = self
            .section_timeout_ms
            .unwrap_or(self.interval_ms * 2 / 3)
            .max(1);
        Duration::from_millis(ms)
    }
}

fn default_max_concurrent_interface_queries() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Envelopes buffered per WebSocket subscriber before new ones are dropped for it.
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
        }
    }
}

fn default_subscriber_queue_capacity() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (subscribers, polls, missed cycles) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.server.stream_port > 0,
            "server.stream_port must be between 1 and 65535, got {}",
            self.server.stream_port
        );
        anyhow::ensure!(
            self.server.stream_port != self.server.port,
            "server.stream_port must differ from server.port ({})",
            self.server.port
        );
        anyhow::ensure!(!self.device.host.is_empty(), "device.host must be non-empty");
        anyhow::ensure!(
            self.device.port > 0,
            "device.port must be between 1 and 65535, got {}",
            self.device.port
        );
        anyhow::ensure!(
            !self.device.username.is_empty(),
            "device.username must be non-empty"
        );
        anyhow::ensure!(
            self.device.connect_timeout_ms > 0,
            "device.connect_timeout_ms must be > 0, got {}",
            self.device.connect_timeout_ms
        );
        anyhow::ensure!(
            self.device.query_timeout_ms > 0,
            "device.query_timeout_ms must be > 0, got {}",
            self.device.query_timeout_ms
        );
        anyhow::ensure!(
            self.polling.interval_ms > 0,
            "polling.interval_ms must be > 0, got {}",
            self.polling.interval_ms
        );
        if let Some(section_timeout_ms) = self.polling.section_timeout_ms {
            anyhow::ensure!(
                section_timeout_ms > 0 && section_timeout_ms < self.polling.interval_ms,
                "polling.section_timeout_ms must be > 0 and below polling.interval_ms ({}), got {}",
                self.polling.interval_ms,
                section_timeout_ms
            );
        }
        anyhow::ensure!(
            self.polling.max_concurrent_interface_queries > 0,
            "polling.max_concurrent_interface_queries must be > 0, got {}",
            self.polling.max_concurrent_interface_queries
        );
        anyhow::ensure!(
            self.publishing.subscriber_queue_capacity > 0,
            "publishing.subscriber_queue_capacity must be > 0, got {}",
            self.publishing.subscriber_queue_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
