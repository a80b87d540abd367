// Shared test helpers: scriptable in-memory device
#![allow(dead_code)]

use async_trait::async_trait;
use hotspot_monitor::aggregator::{AggregatorConfig, SnapshotAggregator};
use hotspot_monitor::device_repo::{QueryArg, Record, TelemetrySource, paths};
use hotspot_monitor::error::{ConnectError, MutateError, QueryError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// In-memory device: one table of rows per command path.
#[derive(Default)]
pub struct MockSource {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    failing: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    mutations: Mutex<Vec<(String, Vec<(String, String)>)>>,
    queries: Mutex<Vec<(String, Vec<QueryArg>)>>,
    /// Per command: (currently in flight, max ever in flight).
    in_flight: Mutex<HashMap<String, (usize, usize)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_table(&self, command: &str, rows: Vec<Record>) {
        self.tables.lock().unwrap().insert(command.to_string(), rows);
    }

    pub fn table(&self, command: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail(&self, command: &str) {
        self.failing.lock().unwrap().insert(command.to_string());
    }

    pub fn recover(&self, command: &str) {
        self.failing.lock().unwrap().remove(command);
    }

    pub fn delay(&self, command: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(command.to_string(), delay);
    }

    pub fn mutations(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.mutations.lock().unwrap().clone()
    }

    pub fn queries(&self, command: &str) -> Vec<Vec<QueryArg>> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == command)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn max_in_flight(&self, command: &str) -> usize {
        self.in_flight
            .lock()
            .unwrap()
            .get(command)
            .map(|(_, max)| *max)
            .unwrap_or(0)
    }

    fn matches(row: &Record, args: &[QueryArg]) -> bool {
        args.iter().all(|arg| match arg {
            QueryArg::Where(k, v) => row.get(k) == Some(v),
            QueryArg::With(_, v) if v.is_empty() => true,
            QueryArg::With(k, v) => row.get(k) == Some(v),
        })
    }
}

#[async_trait]
impl TelemetrySource for MockSource {
    async fn connect(&self) -> Result<(), ConnectError> {
        Ok(())
    }

    async fn query(&self, command: &str, args: &[QueryArg]) -> Result<Vec<Record>, QueryError> {
        self.queries
            .lock()
            .unwrap()
            .push((command.to_string(), args.to_vec()));
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let entry = in_flight.entry(command.to_string()).or_default();
            entry.0 += 1;
            entry.1 = entry.1.max(entry.0);
        }
        let delay = self.delays.lock().unwrap().get(command).copied();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if let Some(entry) = self.in_flight.lock().unwrap().get_mut(command) {
            entry.0 -= 1;
        }

        if self.failing.lock().unwrap().contains(command) {
            return Err(QueryError::Trap {
                command: command.to_string(),
                message: "injected failure".into(),
            });
        }
        Ok(self
            .table(command)
            .into_iter()
            .filter(|row| Self::matches(row, args))
            .collect())
    }

    async fn mutate(&self, command: &str, fields: &[(&str, &str)]) -> Result<(), MutateError> {
        if self.failing.lock().unwrap().contains(command) {
            return Err(MutateError::Rejected {
                command: command.to_string(),
                message: "injected failure".into(),
            });
        }
        self.mutations.lock().unwrap().push((
            command.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));

        let id = fields
            .iter()
            .find(|(k, _)| *k == ".id")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        let mut tables = self.tables.lock().unwrap();
        let users = tables.entry(paths::HOTSPOT_USERS.to_string()).or_default();
        let Some(pos) = users.iter().position(|u| u.get(".id") == Some(&id)) else {
            return Err(MutateError::Rejected {
                command: command.to_string(),
                message: "no such item".into(),
            });
        };
        match command {
            paths::HOTSPOT_USER_SET => {
                for (k, v) in fields.iter().filter(|(k, _)| *k != ".id") {
                    users[pos].insert(k.to_string(), v.to_string());
                }
            }
            paths::HOTSPOT_USER_REMOVE => {
                users.remove(pos);
            }
            _ => {}
        }
        Ok(())
    }
}

/// alice (enabled, one session) and bob (disabled, offline), two interfaces,
/// one static address and one bound lease.
pub fn sample_source() -> Arc<MockSource> {
    let source = MockSource::new();
    source.set_table(
        paths::HOTSPOT_USERS,
        vec![
            record(&[
                (".id", "*1"),
                ("name", "alice"),
                ("profile", "default"),
                ("uptime", "2h30m"),
                ("bytes-in", "1024"),
                ("bytes-out", "2048"),
                ("disabled", "false"),
                ("comment", "front desk"),
                ("limit-bytes-in", "1000000"),
            ]),
            record(&[
                (".id", "*2"),
                ("name", "bob"),
                ("profile", "guest"),
                ("disabled", "true"),
            ]),
        ],
    );
    source.set_table(
        paths::HOTSPOT_ACTIVE,
        vec![record(&[
            (".id", "*A1"),
            ("user", "alice"),
            ("address", "10.5.50.10"),
            ("mac-address", "AA:BB:CC:00:00:01"),
            ("login-time", "2026-10-18 09:00:00"),
            ("uptime", "15m"),
            ("bytes-in", "500"),
            ("bytes-out", "700"),
        ])],
    );
    source.set_table(
        paths::HOTSPOT_HOSTS,
        vec![
            record(&[
                ("user", "alice"),
                ("address", "10.5.50.10"),
                ("mac-address", "AA:BB:CC:00:00:01"),
                ("last-seen", "1m"),
                ("status", "authorized"),
                ("host-name", "alice-laptop"),
                ("bytes-in", "500"),
                ("bytes-out", "700"),
            ]),
            record(&[
                ("user", "alice"),
                ("address", "10.5.50.11"),
                ("mac-address", "AA:BB:CC:00:00:02"),
                ("last-seen", "3h"),
                ("status", "idle"),
                ("host-name", "alice-phone"),
            ]),
        ],
    );
    source.set_table(
        paths::IP_ADDRESSES,
        vec![record(&[("address", "192.168.88.1/24"), ("interface", "bridge")])],
    );
    source.set_table(
        paths::DHCP_LEASES,
        vec![
            record(&[
                ("address", "10.5.50.10"),
                ("active-address", "10.5.50.10"),
                ("mac-address", "AA:BB:CC:00:00:01"),
                ("status", "bound"),
            ]),
            record(&[("address", "10.5.50.99"), ("status", "waiting")]),
        ],
    );
    source.set_table(
        paths::INTERFACES,
        vec![record(&[("name", "ether1")]), record(&[("name", "ether2")])],
    );
    source.set_table(
        paths::MONITOR_TRAFFIC,
        vec![
            record(&[
                ("interface", "ether1"),
                ("rx-bits-per-second", "8000"),
                ("tx-bits-per-second", "4000"),
            ]),
            record(&[
                ("interface", "ether2"),
                ("rx-bits-per-second", "1500"),
                ("tx-bits-per-second", "0"),
            ]),
        ],
    );
    source.set_table(
        paths::LOG,
        vec![record(&[
            (".id", "*10"),
            ("time", "09:00:01"),
            ("topics", "hotspot,info"),
            ("message", "alice logged in"),
        ])],
    );
    Arc::new(source)
}

pub fn test_aggregator_config() -> AggregatorConfig {
    AggregatorConfig {
        section_timeout: Duration::from_millis(500),
        max_concurrent_interface_queries: 2,
    }
}

pub fn aggregator_for(source: Arc<MockSource>) -> Arc<SnapshotAggregator> {
    Arc::new(SnapshotAggregator::new(source, test_aggregator_config()))
}
