use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use {
    talash_conversation::{Conversation, Lookup, MembershipGate},
    talash_sessions::SessionStore,
};

use crate::{config::BotConfig, handlers, membership::TelegramMembership, state::BotContext};

/// Start the bot.
///
/// Verifies credentials, wires the conversation engine, and spawns a
/// background task that polls for updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_bot(
    config: BotConfig,
    sessions: Arc<SessionStore>,
    lookup: Arc<dyn Lookup>,
) -> anyhow::Result<CancellationToken> {
    // Client timeout must exceed the long-polling timeout (30s) so the
    // HTTP client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(std::time::Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    // Verify credentials and get the bot username.
    let me = bot.get_me().await?;
    info!(username = ?me.username, "telegram bot connected");

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Show the lookup menu"),
        BotCommand::new("help", "How to use the bot"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    let gate = MembershipGate::new(
        Arc::new(TelegramMembership::new(bot.clone())),
        config.required_channels.clone(),
    );
    let engine = Arc::new(Conversation::new(gate, sessions, lookup));
    let context = BotContext {
        bot: bot.clone(),
        engine,
    };

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    // Awaited in arrival order: one user's messages are
                    // never reordered relative to each other.
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(chat_id = msg.chat.id.0, "received telegram message");
                                if let Err(e) = handlers::handle_message(msg, &context).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            UpdateKind::CallbackQuery(query) => {
                                debug!(callback_data = ?query.data, "received telegram callback query");
                                if let Err(e) =
                                    handlers::handle_callback_query(query, &context).await
                                {
                                    error!(error = %e, "error handling telegram callback query");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Conflict: another instance is polling with this token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!("telegram polling stopped: another instance is running with this token");
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
