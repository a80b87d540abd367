use serde::{Deserialize, Serialize};

/// One line of the device log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub time: String,
    pub topics: String,
    pub message: String,
}
