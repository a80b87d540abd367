// Telemetry source: RouterOS API over a single TCP connection

pub mod codec;
pub mod paths;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::config::DeviceConfig;
use crate::error::{ConnectError, MutateError, QueryError};
use codec::Reply;

/// One flat row returned by the device, keyed by attribute name.
pub type Record = HashMap<String, String>;

/// Argument to a read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    /// Row filter (`?key=value`).
    Where(String, String),
    /// Command parameter (`=key=value`), e.g. `interface` for monitor-traffic.
    With(String, String),
}

impl QueryArg {
    pub fn where_eq(key: &str, value: &str) -> Self {
        QueryArg::Where(key.to_string(), value.to_string())
    }

    pub fn with(key: &str, value: &str) -> Self {
        QueryArg::With(key.to_string(), value.to_string())
    }

    fn to_word(&self) -> String {
        match self {
            QueryArg::Where(k, v) => format!("?{k}={v}"),
            QueryArg::With(k, v) => format!("={k}={v}"),
        }
    }
}

/// Read/write primitives of the monitored device.
///
/// Shared as `Arc<dyn TelemetrySource>` by the aggregator, the query façade
/// and the command executor; implementations must serialize access to the
/// underlying connection themselves.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Establishes the session. No-op when already connected.
    async fn connect(&self) -> Result<(), ConnectError>;

    async fn query(&self, command: &str, args: &[QueryArg]) -> Result<Vec<Record>, QueryError>;

    async fn mutate(&self, command: &str, fields: &[(&str, &str)]) -> Result<(), MutateError>;
}

struct Connection {
    stream: BufStream<TcpStream>,
}

enum Outcome {
    Rows(Vec<Record>),
    Trap(String),
}

impl Connection {
    /// Sends one sentence and reads replies up to `!done`.
    async fn request(&mut self, words: &[String]) -> std::io::Result<Outcome> {
        let sentence = codec::encode_sentence(words);
        self.stream.write_all(&sentence).await?;
        self.stream.flush().await?;

        let mut rows = Vec::new();
        let mut trap = None;
        loop {
            let reply = Reply::parse(codec::read_sentence(&mut self.stream).await?)?;
            match reply {
                Reply::Re(record) => rows.push(record),
                Reply::Trap(record) => {
                    trap = Some(
                        record
                            .get("message")
                            .cloned()
                            .unwrap_or_else(|| "unknown error".into()),
                    );
                }
                Reply::Done(_) => {
                    return Ok(match trap {
                        Some(message) => Outcome::Trap(message),
                        None => Outcome::Rows(rows),
                    });
                }
                Reply::Fatal(reason) => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionAborted,
                        format!("device closed the session: {reason}"),
                    ));
                }
            }
        }
    }
}

#[derive(Default)]
struct ConnState {
    conn: Option<Connection>,
    /// Reason of the most recent failed connect attempt; cleared on success.
    last_failure: Option<String>,
}

enum ExchangeError {
    Connect(ConnectError),
    Transport(String),
    Timeout(u64),
    Trap(String),
}

pub struct DeviceRepo {
    addr: String,
    username: String,
    password: String,
    connect_timeout: Duration,
    query_timeout: Duration,
    state: Mutex<ConnState>,
    /// Number of finished connect attempts.
    attempts: AtomicU64,
}

impl DeviceRepo {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            addr: format!("{}:{}", config.host, config.port),
            username: config.username.clone(),
            password: config.password.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            query_timeout: Duration::from_millis(config.query_timeout_ms),
            state: Mutex::new(ConnState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn open(&self) -> Result<Connection, ConnectError> {
        let timeout_ms = self.connect_timeout.as_millis() as u64;
        let stream = match timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(s)) => s,
            Ok(Err(source)) => {
                return Err(ConnectError::Unreachable {
                    addr: self.addr.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(ConnectError::Timeout {
                    addr: self.addr.clone(),
                    timeout_ms,
                });
            }
        };
        let mut conn = Connection {
            stream: BufStream::new(stream),
        };
        let login = [
            "/login".to_string(),
            format!("=name={}", self.username),
            format!("=password={}", self.password),
        ];
        match timeout(self.connect_timeout, conn.request(&login)).await {
            Ok(Ok(Outcome::Rows(_))) => Ok(conn),
            Ok(Ok(Outcome::Trap(message))) => Err(ConnectError::Auth { message }),
            Ok(Err(source)) => Err(ConnectError::Unreachable {
                addr: self.addr.clone(),
                source,
            }),
            Err(_) => Err(ConnectError::Timeout {
                addr: self.addr.clone(),
                timeout_ms,
            }),
        }
    }

    /// Connects if needed while the caller holds the connection lock.
    /// `seen` is the attempt counter observed before waiting for the lock.
    async fn ensure_connected(
        &self,
        state: &mut ConnState,
        seen: u64,
    ) -> Result<(), ConnectError> {
        if state.conn.is_some() {
            return Ok(());
        }
        if self.attempts.load(Ordering::Acquire) != seen
            && let Some(reason) = state.last_failure.clone()
        {
            return Err(ConnectError::AttemptFailed {
                addr: self.addr.clone(),
                reason,
            });
        }

        info!(operation = "connect", addr = %self.addr, "Connecting to device");
        let result = self.open().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(conn) => {
                state.conn = Some(conn);
                state.last_failure = None;
                info!(operation = "connect", addr = %self.addr, "Connected to device");
                Ok(())
            }
            Err(e) => {
                warn!(operation = "connect", addr = %self.addr, error = %e, "Device connect failed");
                state.last_failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    #[instrument(skip(self, command, words), fields(repo = "device", command = %command))]
    async fn exchange(&self, command: &str, words: Vec<String>) -> Result<Vec<Record>, ExchangeError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state, seen)
            .await
            .map_err(ExchangeError::Connect)?;
        // Out of the shared slot until `!done` is read: if this future is dropped
        // mid-exchange the connection goes with it and the next call reconnects.
        let Some(mut conn) = state.conn.take() else {
            return Err(ExchangeError::Transport("connection unavailable".into()));
        };

        match timeout(self.query_timeout, conn.request(&words)).await {
            Ok(Ok(outcome)) => {
                state.conn = Some(conn);
                match outcome {
                    Outcome::Rows(rows) => Ok(rows),
                    Outcome::Trap(message) => Err(ExchangeError::Trap(message)),
                }
            }
            Ok(Err(e)) => {
                // Stream position is unknown after an I/O error; reconnect on next use.
                warn!(error = %e, "Device connection dropped");
                Err(ExchangeError::Transport(e.to_string()))
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Device request timed out; connection dropped"
                );
                Err(ExchangeError::Timeout(self.query_timeout.as_millis() as u64))
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for DeviceRepo {
    async fn connect(&self) -> Result<(), ConnectError> {
        let seen = self.attempts.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        self.ensure_connected(&mut state, seen).await
    }

    async fn query(&self, command: &str, args: &[QueryArg]) -> Result<Vec<Record>, QueryError> {
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(command.to_string());
        words.extend(args.iter().map(QueryArg::to_word));
        self.exchange(command, words).await.map_err(|e| match e {
            ExchangeError::Connect(e) => QueryError::Connect(e),
            ExchangeError::Transport(reason) => QueryError::Transport {
                command: command.to_string(),
                reason,
            },
            ExchangeError::Timeout(timeout_ms) => QueryError::Timeout {
                command: command.to_string(),
                timeout_ms,
            },
            ExchangeError::Trap(message) => QueryError::Trap {
                command: command.to_string(),
                message,
            },
        })
    }

    async fn mutate(&self, command: &str, fields: &[(&str, &str)]) -> Result<(), MutateError> {
        let mut words = Vec::with_capacity(fields.len() + 1);
        words.push(command.to_string());
        words.extend(fields.iter().map(|(k, v)| format!("={k}={v}")));
        self.exchange(command, words)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                ExchangeError::Connect(e) => MutateError::Connect(e),
                ExchangeError::Transport(reason) => MutateError::Transport {
                    command: command.to_string(),
                    reason,
                },
                ExchangeError::Timeout(timeout_ms) => MutateError::Timeout {
                    command: command.to_string(),
                    timeout_ms,
                },
                ExchangeError::Trap(message) => MutateError::Rejected {
                    command: command.to_string(),
                    message,
                },
            })
    }
}
