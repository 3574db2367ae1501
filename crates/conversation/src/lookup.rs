use {async_trait::async_trait, thiserror::Error};

use talash_registry::IdentifierKind;

/// Why a lookup produced no document.
///
/// These are the only causes shown to users; the dispatcher logs the
/// underlying transport/parse errors and never surfaces their internals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("lookup service unreachable")]
    Unreachable,
    #[error("lookup service returned status {0}")]
    Status(u16),
    #[error("lookup service returned an unreadable response")]
    MalformedBody,
}

/// Either the service's JSON document (shape opaque to this system) or a
/// generic failure cause.
pub type LookupResult = Result<serde_json::Value, LookupFailure>;

/// External lookup service: take a validated string, return a JSON document.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Issue a single lookup. One attempt, no retry, no backoff.
    async fn dispatch(&self, kind: IdentifierKind, value: &str) -> LookupResult;
}
