use {
    teloxide::{
        prelude::*,
        types::{CallbackQuery, Message},
    },
    tracing::debug,
};

use talash_conversation::{InboundEvent, UserRef};

use crate::{
    render::{self, Rendered},
    replier::{CallbackReplier, MessageReplier, send_rendered},
    state::BotContext,
};

/// Handle a single inbound message (called from the polling loop).
pub async fn handle_message(msg: Message, ctx: &BotContext) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    let Some(user) = user_ref(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };

    if let Some(command) = text.strip_prefix('/') {
        // Strip arguments and any @BotName suffix.
        let command = command.split_whitespace().next().unwrap_or("");
        let command = command.split('@').next().unwrap_or(command);
        return handle_command(command, user, ctx).await;
    }

    let replier = MessageReplier {
        bot: ctx.bot.clone(),
    };
    ctx.engine
        .handle(
            InboundEvent::Text {
                user,
                body: text.to_string(),
            },
            &replier,
        )
        .await
}

async fn handle_command(command: &str, user: UserRef, ctx: &BotContext) -> anyhow::Result<()> {
    match command {
        "start" => {
            let replier = MessageReplier {
                bot: ctx.bot.clone(),
            };
            ctx.engine
                .handle(InboundEvent::Start { user }, &replier)
                .await
        },
        "help" => send_help(ctx, &user).await,
        other => {
            debug!(user_id = %user.id, command = other, "ignoring unknown command");
            Ok(())
        },
    }
}

/// Handle a button press.
///
/// Payloads: `check_join` re-runs the gate, `back` re-enters the menu flow,
/// `help`/`stats` are presentation-only, anything else is a type selection
/// resolved by the registry.
pub async fn handle_callback_query(query: CallbackQuery, ctx: &BotContext) -> anyhow::Result<()> {
    let Some(data) = query.data.clone() else {
        let _ = ctx.bot.answer_callback_query(&query.id).await;
        return Ok(());
    };

    let message = query.message.as_ref().map(|m| (m.chat().id, m.id()));
    let user = UserRef {
        id: query.from.id.0.to_string(),
        chat_id: message
            .map(|(chat, _)| chat.0.to_string())
            .unwrap_or_else(|| query.from.id.0.to_string()),
        display_name: Some(query.from.first_name.clone()),
    };

    match data.as_str() {
        "help" => {
            let _ = ctx.bot.answer_callback_query(&query.id).await;
            return send_help(ctx, &user).await;
        },
        "stats" => {
            let _ = ctx.bot.answer_callback_query(&query.id).await;
            return send_stats(ctx, &user).await;
        },
        _ => {},
    }

    let replier = CallbackReplier {
        bot: ctx.bot.clone(),
        query_id: query.id.clone(),
        message,
    };

    let event = match data.as_str() {
        "check_join" => InboundEvent::RecheckJoin { user },
        "back" => InboundEvent::Start { user },
        key => InboundEvent::Select {
            user,
            key: key.to_string(),
        },
    };
    ctx.engine.handle(event, &replier).await
}

async fn send_help(ctx: &BotContext, user: &UserRef) -> anyhow::Result<()> {
    send_rendered(
        &ctx.bot,
        ChatId(user.chat_id.parse().unwrap_or(0)),
        Rendered {
            text: render::help_text(),
            keyboard: None,
            html: true,
        },
    )
    .await
}

async fn send_stats(ctx: &BotContext, user: &UserRef) -> anyhow::Result<()> {
    send_rendered(
        &ctx.bot,
        ChatId(user.chat_id.parse().unwrap_or(0)),
        Rendered {
            text: render::stats_text(ctx.engine.sessions().len()),
            keyboard: None,
            html: true,
        },
    )
    .await
}

fn user_ref(msg: &Message) -> Option<UserRef> {
    let from = msg.from.as_ref()?;
    Some(UserRef {
        id: from.id.0.to_string(),
        chat_id: msg.chat.id.0.to_string(),
        display_name: Some(from.first_name.clone()),
    })
}
