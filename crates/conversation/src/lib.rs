//! Conversation state machine for the lookup bot.
//!
//! Drives the sequence: membership gate → type menu → type selection →
//! value prompt → validation → dispatch → result render. The chat
//! transport, the membership provider, and the lookup service are external
//! collaborators behind traits; the engine owns only the state transitions
//! and the input contract.

pub mod engine;
pub mod event;
pub mod gate;
pub mod lookup;
pub mod reply;

pub use {
    engine::Conversation,
    event::{InboundEvent, UserRef},
    gate::{MembershipGate, MembershipProvider, MembershipStatus, RequiredChannel},
    lookup::{Lookup, LookupFailure, LookupResult},
    reply::{Reply, ReplySink},
};
