// Administrative mutations against live device state.
//
// Commands never touch the cached snapshot and never force a re-poll: the
// change becomes visible in the next scheduled snapshot.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::aggregator::fetch_users;
use crate::device_repo::{QueryArg, TelemetrySource, paths};
use crate::error::CommandError;
use crate::models::HotspotUser;
use crate::normalize;

pub struct CommandExecutor {
    source: Arc<dyn TelemetrySource>,
}

impl CommandExecutor {
    pub fn new(source: Arc<dyn TelemetrySource>) -> Self {
        Self { source }
    }

    async fn find_user(&self, username: &str) -> Result<HotspotUser, CommandError> {
        let users = fetch_users(self.source.as_ref(), &[QueryArg::where_eq("name", username)]).await?;
        users
            .into_iter()
            .find(|u| u.name == username)
            .ok_or_else(|| CommandError::NotFound {
                username: username.to_string(),
            })
    }

    /// Flips the user's disabled flag and returns the new state.
    #[instrument(skip(self), fields(operation = "toggle_user_disabled"))]
    pub async fn toggle_user_disabled(&self, username: &str) -> Result<bool, CommandError> {
        let user = self.find_user(username).await?;
        let disabled = !user.disabled;
        let flag = if disabled { normalize::TRUE_TOKEN } else { "false" };
        self.source
            .mutate(
                paths::HOTSPOT_USER_SET,
                &[(".id", user.id.as_str()), ("disabled", flag)],
            )
            .await?;
        info!(username, disabled, "User disabled flag changed");
        Ok(disabled)
    }

    #[instrument(skip(self), fields(operation = "delete_user"))]
    pub async fn delete_user(&self, username: &str) -> Result<(), CommandError> {
        let user = self.find_user(username).await?;
        self.source
            .mutate(paths::HOTSPOT_USER_REMOVE, &[(".id", user.id.as_str())])
            .await?;
        info!(username, "User removed");
        Ok(())
    }
}
