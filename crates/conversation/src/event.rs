/// Identity of the user an event came from, plus where replies are routed.
///
/// Both ids are opaque stable strings owned by the transport. For Telegram
/// DMs they happen to coincide, but the engine never relies on that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub chat_id: String,
    pub display_name: Option<String>,
}

/// An inbound conversation event, as classified by the transport binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `/start` command, or the "back" button.
    Start { user: UserRef },
    /// The "joined" confirm button while gated.
    RecheckJoin { user: UserRef },
    /// A type-selection button; `key` is the registry key payload.
    Select { user: UserRef, key: String },
    /// Free text.
    Text { user: UserRef, body: String },
}

impl InboundEvent {
    #[must_use]
    pub fn user(&self) -> &UserRef {
        match self {
            Self::Start { user }
            | Self::RecheckJoin { user }
            | Self::Select { user, .. }
            | Self::Text { user, .. } => user,
        }
    }
}
