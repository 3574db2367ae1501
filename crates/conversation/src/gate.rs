use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

/// Membership status of a user in a single channel, as reported by the
/// provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    Left,
    Kicked,
    /// The provider could not determine a status. Treated as non-member.
    Unknown,
}

/// External collaborator answering "is this user currently in channel C".
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    async fn status(&self, user_id: &str, channel_id: &str) -> Result<MembershipStatus>;
}

/// A channel the user must be a member of before the bot serves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredChannel {
    /// Channel id or @username, as the membership provider expects it.
    pub id: String,
    /// Button label on the join prompt.
    pub label: String,
    /// Public join link.
    pub join_url: String,
}

/// Access gate requiring membership in every configured channel.
///
/// The verdict is computed fresh on every check and never cached. Any
/// provider error counts as non-member: an error from the membership
/// provider must never be treated as implicit permission.
pub struct MembershipGate {
    provider: Arc<dyn MembershipProvider>,
    channels: Vec<RequiredChannel>,
}

impl MembershipGate {
    #[must_use]
    pub fn new(provider: Arc<dyn MembershipProvider>, channels: Vec<RequiredChannel>) -> Self {
        Self { provider, channels }
    }

    #[must_use]
    pub fn channels(&self) -> &[RequiredChannel] {
        &self.channels
    }

    /// AND over all configured channels, fail-closed.
    pub async fn verdict(&self, user_id: &str) -> bool {
        for channel in &self.channels {
            match self.provider.status(user_id, &channel.id).await {
                Ok(MembershipStatus::Member) => {},
                Ok(status) => {
                    debug!(user_id, channel = %channel.id, ?status, "gate: not a member");
                    return false;
                },
                Err(error) => {
                    warn!(user_id, channel = %channel.id, %error, "gate: provider error, denying");
                    return false;
                },
            }
        }
        true
    }
}
