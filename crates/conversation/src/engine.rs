use std::sync::Arc;

use {anyhow::Result, tracing::warn};

use {talash_registry::IdentifierKind, talash_sessions::SessionStore};

use crate::{
    event::{InboundEvent, UserRef},
    gate::MembershipGate,
    lookup::Lookup,
    reply::{Reply, ReplySink},
};

/// The per-user conversation state machine.
///
/// States: Gated → MenuShown → AwaitingValue → Processing → MenuShown.
/// The only suspending step it owns is the lookup dispatch; everything else
/// is a session read/write or a pure registry check. Collaborators are
/// injected so the engine can be driven entirely by stubs in tests.
pub struct Conversation {
    gate: MembershipGate,
    sessions: Arc<SessionStore>,
    lookup: Arc<dyn Lookup>,
}

impl Conversation {
    #[must_use]
    pub fn new(gate: MembershipGate, sessions: Arc<SessionStore>, lookup: Arc<dyn Lookup>) -> Self {
        Self {
            gate,
            sessions,
            lookup,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Process one inbound event, emitting replies through the sink in
    /// delivery order. Errors are transport failures only; every
    /// conversation-level failure is rendered as a reply instead.
    pub async fn handle(&self, event: InboundEvent, sink: &dyn ReplySink) -> Result<()> {
        match event {
            InboundEvent::Start { user } => self.on_start(&user, sink).await,
            InboundEvent::RecheckJoin { user } => self.on_recheck(&user, sink).await,
            InboundEvent::Select { user, key } => self.on_select(&user, &key, sink).await,
            InboundEvent::Text { user, body } => self.on_text(&user, &body, sink).await,
        }
    }

    async fn on_start(&self, user: &UserRef, sink: &dyn ReplySink) -> Result<()> {
        if !self.gate.verdict(&user.id).await {
            return sink
                .send(
                    user,
                    Reply::JoinPrompt {
                        channels: self.gate.channels().to_vec(),
                    },
                )
                .await;
        }
        sink.send(
            user,
            Reply::Menu {
                greeting: user.display_name.clone(),
            },
        )
        .await
    }

    /// Re-run the gate with no side effects on the session store.
    async fn on_recheck(&self, user: &UserRef, sink: &dyn ReplySink) -> Result<()> {
        let reply = if self.gate.verdict(&user.id).await {
            Reply::JoinConfirmed
        } else {
            Reply::JoinStillMissing
        };
        sink.send(user, reply).await
    }

    async fn on_select(&self, user: &UserRef, key: &str, sink: &dyn ReplySink) -> Result<()> {
        match IdentifierKind::from_key(key) {
            Some(kind) => {
                self.sessions.set_selection(&user.id, kind);
                sink.send(user, Reply::ValuePrompt { kind }).await
            },
            None => {
                // Stale or foreign callback payload. Not a crash: generic
                // error, then back to the menu.
                warn!(user_id = %user.id, key, "selected key not in registry");
                sink.send(user, Reply::UnknownSelection).await?;
                sink.send(user, Reply::Menu { greeting: None }).await
            },
        }
    }

    async fn on_text(&self, user: &UserRef, body: &str, sink: &dyn ReplySink) -> Result<()> {
        let value = body.trim();

        let Some(kind) = self.sessions.selection(&user.id) else {
            return sink.send(user, Reply::NoSelection).await;
        };

        if !kind.validate(value) {
            // Selection retained: the user may retry without reselecting.
            return sink.send(user, Reply::InvalidFormat { kind }).await;
        }

        sink.send(user, Reply::Processing).await?;
        let result = self.lookup.dispatch(kind, value).await;
        // Selection is left untouched so another value of the same kind
        // can follow immediately.
        sink.send(user, Reply::LookupReport(result)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Mutex;

    use {async_trait::async_trait, serde_json::json};

    use crate::{
        gate::{MembershipProvider, MembershipStatus, RequiredChannel},
        lookup::{LookupFailure, LookupResult},
    };

    use super::*;

    struct FixedProvider {
        statuses: Vec<MembershipStatus>,
        fail: bool,
    }

    impl FixedProvider {
        fn members(count: usize) -> Self {
            Self {
                statuses: vec![MembershipStatus::Member; count],
                fail: false,
            }
        }
    }

    #[async_trait]
    impl MembershipProvider for FixedProvider {
        async fn status(&self, _user_id: &str, channel_id: &str) -> Result<MembershipStatus> {
            if self.fail {
                anyhow::bail!("provider unreachable");
            }
            let index = channel_id
                .trim_start_matches("@ch")
                .parse::<usize>()
                .unwrap_or(0);
            Ok(self.statuses[index])
        }
    }

    struct StubLookup {
        calls: Mutex<Vec<(IdentifierKind, String)>>,
        result: LookupResult,
    }

    impl StubLookup {
        fn ok(value: serde_json::Value) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Ok(value),
            }
        }

        fn failing(failure: LookupFailure) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result: Err(failure),
            }
        }

        fn calls(&self) -> Vec<(IdentifierKind, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Lookup for StubLookup {
        async fn dispatch(&self, kind: IdentifierKind, value: &str) -> LookupResult {
            self.calls.lock().unwrap().push((kind, value.to_string()));
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        replies: Mutex<Vec<Reply>>,
    }

    impl RecordingSink {
        fn replies(&self) -> Vec<Reply> {
            self.replies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send(&self, _user: &UserRef, reply: Reply) -> Result<()> {
            self.replies.lock().unwrap().push(reply);
            Ok(())
        }
    }

    fn channels(count: usize) -> Vec<RequiredChannel> {
        (0..count)
            .map(|i| RequiredChannel {
                id: format!("@ch{i}"),
                label: format!("Join Channel {}", i + 1),
                join_url: format!("https://t.me/ch{i}"),
            })
            .collect()
    }

    fn user() -> UserRef {
        UserRef {
            id: "42".to_string(),
            chat_id: "42".to_string(),
            display_name: Some("Asha".to_string()),
        }
    }

    fn engine(provider: FixedProvider, lookup: Arc<StubLookup>) -> (Conversation, Arc<SessionStore>) {
        let sessions = Arc::new(SessionStore::new());
        let channel_count = if provider.fail { 2 } else { provider.statuses.len() };
        let gate = MembershipGate::new(Arc::new(provider), channels(channel_count));
        let conversation = Conversation::new(gate, Arc::clone(&sessions), lookup);
        (conversation, sessions)
    }

    #[tokio::test]
    async fn start_with_passing_gate_shows_menu() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, _) = engine(FixedProvider::members(2), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(InboundEvent::Start { user: user() }, &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.replies(),
            vec![Reply::Menu {
                greeting: Some("Asha".to_string())
            }]
        );
    }

    #[tokio::test]
    async fn start_with_left_channel_shows_join_prompt_and_touches_nothing() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let provider = FixedProvider {
            statuses: vec![MembershipStatus::Member, MembershipStatus::Left],
            fail: false,
        };
        let (engine, sessions) = engine(provider, Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(InboundEvent::Start { user: user() }, &sink)
            .await
            .unwrap();

        assert_eq!(
            sink.replies(),
            vec![Reply::JoinPrompt {
                channels: channels(2)
            }]
        );
        assert!(sessions.is_empty());
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn start_with_provider_failure_fails_closed() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let provider = FixedProvider {
            statuses: Vec::new(),
            fail: true,
        };
        let (engine, _) = engine(provider, Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(InboundEvent::Start { user: user() }, &sink)
            .await
            .unwrap();

        assert!(matches!(sink.replies()[0], Reply::JoinPrompt { .. }));
    }

    #[tokio::test]
    async fn full_sequence_dispatches_exactly_once() {
        let lookup = Arc::new(StubLookup::ok(json!({"status": "found"})));
        let (engine, sessions) = engine(FixedProvider::members(2), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(InboundEvent::Start { user: user() }, &sink)
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "phone".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "9876543210".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            lookup.calls(),
            vec![(IdentifierKind::Phone, "9876543210".to_string())]
        );
        assert_eq!(
            sink.replies(),
            vec![
                Reply::Menu {
                    greeting: Some("Asha".to_string())
                },
                Reply::ValuePrompt {
                    kind: IdentifierKind::Phone
                },
                Reply::Processing,
                Reply::LookupReport(Ok(json!({"status": "found"}))),
            ]
        );
        // Selection survives the lookup: another value can follow directly.
        assert_eq!(sessions.selection("42"), Some(IdentifierKind::Phone));
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_dispatcher() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, sessions) = engine(FixedProvider::members(2), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "aadhaar".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "12345".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert!(lookup.calls().is_empty());
        assert_eq!(
            sink.replies()[1],
            Reply::InvalidFormat {
                kind: IdentifierKind::Aadhaar
            }
        );
        assert_eq!(sessions.selection("42"), Some(IdentifierKind::Aadhaar));
    }

    #[tokio::test]
    async fn invalid_then_valid_retry_without_reselecting() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, _) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "pincode".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "1100".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "110001".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            lookup.calls(),
            vec![(IdentifierKind::Pincode, "110001".to_string())]
        );
    }

    #[tokio::test]
    async fn text_without_selection_gets_usage_hint() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, _) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "9876543210".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(sink.replies(), vec![Reply::NoSelection]);
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_trimmed_before_validation() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, _) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "phone".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "  9876543210\n".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            lookup.calls(),
            vec![(IdentifierKind::Phone, "9876543210".to_string())]
        );
    }

    #[tokio::test]
    async fn lookup_failure_is_reported_not_raised() {
        let lookup = Arc::new(StubLookup::failing(LookupFailure::Status(502)));
        let (engine, _) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "ifsc".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: user(),
                    body: "SBIN0001234".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            sink.replies()[2],
            Reply::LookupReport(Err(LookupFailure::Status(502)))
        );
    }

    #[tokio::test]
    async fn recheck_is_idempotent_while_still_gated() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let provider = FixedProvider {
            statuses: vec![MembershipStatus::Left],
            fail: false,
        };
        let (engine, sessions) = engine(provider, Arc::clone(&lookup));
        let sink = RecordingSink::default();

        for _ in 0..3 {
            engine
                .handle(InboundEvent::RecheckJoin { user: user() }, &sink)
                .await
                .unwrap();
        }

        assert_eq!(
            sink.replies(),
            vec![Reply::JoinStillMissing, Reply::JoinStillMissing, Reply::JoinStillMissing]
        );
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn recheck_after_joining_confirms() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, _) = engine(FixedProvider::members(2), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(InboundEvent::RecheckJoin { user: user() }, &sink)
            .await
            .unwrap();

        assert_eq!(sink.replies(), vec![Reply::JoinConfirmed]);
    }

    #[tokio::test]
    async fn unknown_selection_key_renders_error_and_menu() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, sessions) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "pan".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(
            sink.replies(),
            vec![Reply::UnknownSelection, Reply::Menu { greeting: None }]
        );
        assert!(sessions.is_empty());
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn new_selection_overwrites_previous() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, sessions) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "phone".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "gst".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(sessions.selection("42"), Some(IdentifierKind::Gst));
    }

    #[tokio::test]
    async fn interleaved_users_keep_their_own_selections() {
        let lookup = Arc::new(StubLookup::ok(json!({})));
        let (engine, sessions) = engine(FixedProvider::members(1), Arc::clone(&lookup));
        let sink = RecordingSink::default();

        let other = UserRef {
            id: "7".to_string(),
            chat_id: "7".to_string(),
            display_name: None,
        };

        engine
            .handle(
                InboundEvent::Select {
                    user: user(),
                    key: "phone".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Select {
                    user: other.clone(),
                    key: "vehicle".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();
        engine
            .handle(
                InboundEvent::Text {
                    user: other,
                    body: "UP32QP0001".to_string(),
                },
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(sessions.selection("42"), Some(IdentifierKind::Phone));
        assert_eq!(
            lookup.calls(),
            vec![(IdentifierKind::Vehicle, "UP32QP0001".to_string())]
        );
    }
}
