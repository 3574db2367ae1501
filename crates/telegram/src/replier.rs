//! Reply delivery.
//!
//! Two [`ReplySink`] implementations: one for plain message updates, one
//! for callback-query updates where prompt and confirm replies edit the
//! originating message in place and gate alerts ride on the query answer.

use {
    anyhow::Result,
    async_trait::async_trait,
    teloxide::{
        payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
        prelude::*,
        types::{InlineKeyboardMarkup, MessageId, ParseMode},
    },
    tracing::warn,
};

use talash_conversation::{Reply, ReplySink, UserRef};

use crate::render::{self, Rendered};

/// Sends every reply as a new message. Used for commands and free text.
pub struct MessageReplier {
    pub bot: Bot,
}

/// Replies in the context of a callback query.
pub struct CallbackReplier {
    pub bot: Bot,
    pub query_id: String,
    /// Chat and message the pressed button lives on, when Telegram still
    /// considers it accessible.
    pub message: Option<(ChatId, MessageId)>,
}

#[async_trait]
impl ReplySink for MessageReplier {
    async fn send(&self, user: &UserRef, reply: Reply) -> Result<()> {
        send_rendered(&self.bot, chat_of(user), render::render_reply(&reply)).await
    }
}

#[async_trait]
impl ReplySink for CallbackReplier {
    async fn send(&self, user: &UserRef, reply: Reply) -> Result<()> {
        match &reply {
            // Still gated: alert on the query, nothing else changes.
            Reply::JoinStillMissing => {
                let _ = self
                    .bot
                    .answer_callback_query(&self.query_id)
                    .text(render::JOIN_STILL_MISSING_TEXT)
                    .show_alert(true)
                    .await;
                Ok(())
            },
            // Selecting a type or confirming the join edits the menu
            // message in place rather than stacking new messages.
            Reply::ValuePrompt { .. } | Reply::JoinConfirmed => {
                let _ = self.bot.answer_callback_query(&self.query_id).await;
                let rendered = render::render_reply(&reply);
                match self.message {
                    Some((chat, message_id)) => {
                        edit_rendered(&self.bot, chat, message_id, &rendered).await
                    },
                    None => send_rendered(&self.bot, chat_of(user), rendered).await,
                }
            },
            _ => {
                // Repeated answers on the same query are no-ops; only the
                // first dismisses the spinner.
                let _ = self.bot.answer_callback_query(&self.query_id).await;
                send_rendered(&self.bot, chat_of(user), render::render_reply(&reply)).await
            },
        }
    }
}

fn chat_of(user: &UserRef) -> ChatId {
    ChatId(user.chat_id.parse().unwrap_or(0))
}

/// Send a rendered reply, chunked at the message size limit; the keyboard
/// rides on the final chunk.
pub(crate) async fn send_rendered(bot: &Bot, chat: ChatId, rendered: Rendered) -> Result<()> {
    let chunks = render::chunk_message(&rendered.text, render::TELEGRAM_MAX_MESSAGE_LEN);
    let last = chunks.len().saturating_sub(1);
    for (index, chunk) in chunks.iter().enumerate() {
        let keyboard = if index == last {
            rendered.keyboard.clone()
        } else {
            None
        };
        send_chunk(bot, chat, chunk, keyboard, rendered.html).await?;
    }
    Ok(())
}

async fn send_chunk(
    bot: &Bot,
    chat: ChatId,
    chunk: &str,
    keyboard: Option<InlineKeyboardMarkup>,
    html: bool,
) -> Result<()> {
    if html {
        let mut request = bot.send_message(chat, chunk).parse_mode(ParseMode::Html);
        if let Some(kb) = keyboard.clone() {
            request = request.reply_markup(kb);
        }
        match request.await {
            Ok(_) => return Ok(()),
            Err(error) => {
                warn!(chat_id = chat.0, %error, "telegram HTML send failed, retrying as plain text");
            },
        }
    }

    let mut request = bot.send_message(chat, chunk);
    if let Some(kb) = keyboard {
        request = request.reply_markup(kb);
    }
    request.await?;
    Ok(())
}

async fn edit_rendered(
    bot: &Bot,
    chat: ChatId,
    message_id: MessageId,
    rendered: &Rendered,
) -> Result<()> {
    // Edited replies are short prompts; no chunking needed.
    if rendered.html {
        match bot
            .edit_message_text(chat, message_id, rendered.text.clone())
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => return Ok(()),
            Err(error) => {
                warn!(chat_id = chat.0, %error, "telegram HTML edit failed, retrying as plain text");
            },
        }
    }
    bot.edit_message_text(chat, message_id, rendered.text.clone())
        .await?;
    Ok(())
}
