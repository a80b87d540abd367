// Read API behind the REST surface.
//
// Listings are served from the latest published snapshot (cheap, at most one
// poll interval old). User detail and logs are fetched on demand, since
// session and history rows are not part of the broadcast snapshot.

use std::sync::Arc;
use tracing::instrument;

use crate::aggregator::{SnapshotAggregator, fetch_history, fetch_sessions, fetch_users};
use crate::correlate;
use crate::device_repo::{QueryArg, TelemetrySource, paths};
use crate::error::QueryError;
use crate::models::{LogEntry, TelemetrySnapshot, UserDetail, UserView};
use crate::normalize;

pub struct QueryService {
    aggregator: Arc<SnapshotAggregator>,
    source: Arc<dyn TelemetrySource>,
}

impl QueryService {
    pub fn new(aggregator: Arc<SnapshotAggregator>, source: Arc<dyn TelemetrySource>) -> Self {
        Self { aggregator, source }
    }

    pub fn network_data(&self) -> Arc<TelemetrySnapshot> {
        self.aggregator.latest()
    }

    pub fn list_users(&self) -> Vec<UserView> {
        self.aggregator.latest().users.clone()
    }

    /// Fresh per-user detail; `Ok(None)` when no such user exists.
    #[instrument(skip(self), fields(operation = "get_user_detail"))]
    pub async fn get_user_detail(&self, username: &str) -> Result<Option<UserDetail>, QueryError> {
        let source = self.source.as_ref();
        let by_name = [QueryArg::where_eq("name", username)];
        let by_user = [QueryArg::where_eq("user", username)];
        let (users, sessions, history) = tokio::try_join!(
            fetch_users(source, &by_name),
            fetch_sessions(source, &by_user),
            fetch_history(source, &by_user),
        )?;
        Ok(correlate::build_user_detail(
            username, &users, &sessions, &history,
        ))
    }

    #[instrument(skip(self), fields(operation = "device_logs"))]
    pub async fn device_logs(&self) -> Result<Vec<LogEntry>, QueryError> {
        let rows = self.source.query(paths::LOG, &[]).await?;
        Ok(rows.iter().map(normalize::log_entry).collect())
    }
}
