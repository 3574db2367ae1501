use {
    anyhow::Result,
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{Recipient, UserId},
    },
};

use talash_conversation::{MembershipProvider, MembershipStatus};

/// Membership checks through the Bot API's `getChatMember`.
///
/// Errors (channel unknown, bot lacking permission, network failure) are
/// propagated as-is; the gate fail-closes on them.
pub struct TelegramMembership {
    bot: Bot,
}

impl TelegramMembership {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Channel ids in config are either numeric chat ids or @usernames.
    fn recipient(channel_id: &str) -> Recipient {
        match channel_id.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) => Recipient::ChannelUsername(channel_id.to_string()),
        }
    }
}

#[async_trait]
impl MembershipProvider for TelegramMembership {
    async fn status(&self, user_id: &str, channel_id: &str) -> Result<MembershipStatus> {
        let user_id: u64 = user_id
            .parse()
            .map_err(|_| anyhow::anyhow!("non-numeric telegram user id: {user_id}"))?;

        let member = self
            .bot
            .get_chat_member(Self::recipient(channel_id), UserId(user_id))
            .await?;

        // Only left/kicked fail the gate; restricted-but-present users and
        // admins all count as members, matching the Bot API's notion of
        // "currently in the channel".
        let status = if member.kind.is_banned() {
            MembershipStatus::Kicked
        } else if member.kind.is_left() {
            MembershipStatus::Left
        } else {
            MembershipStatus::Member
        };
        Ok(status)
    }
}
