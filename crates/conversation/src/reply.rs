use {anyhow::Result, async_trait::async_trait};

use talash_registry::IdentifierKind;

use crate::{event::UserRef, gate::RequiredChannel, lookup::LookupResult};

/// A render instruction produced by the conversation engine.
///
/// The transport binding decides how each instruction is delivered: a new
/// message, an in-place edit, or a callback alert.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// User is gated: show per-channel join links plus a confirm button.
    JoinPrompt { channels: Vec<RequiredChannel> },
    /// Re-check passed: tell the user to start over.
    JoinConfirmed,
    /// Re-check still failing: alert, nothing else changes.
    JoinStillMissing,
    /// The type menu. `greeting` carries the user's display name on /start.
    Menu { greeting: Option<String> },
    /// Ask for a value of the selected kind, with its example placeholder.
    ValuePrompt { kind: IdentifierKind },
    /// Free text arrived with no prior selection.
    NoSelection,
    /// Input did not match the selected kind's pattern.
    InvalidFormat { kind: IdentifierKind },
    /// Lookup dispatch is about to start.
    Processing,
    /// Outcome of the dispatched lookup, success or generic failure.
    LookupReport(LookupResult),
    /// Selected key not present in the registry.
    UnknownSelection,
}

/// Delivery seam owned by the transport. The engine emits replies in the
/// order they must reach the user.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, user: &UserRef, reply: Reply) -> Result<()>;
}
