//! Message texts and keyboards.
//!
//! Pure builders only; nothing here touches the network. User-facing
//! strings are a fixed Hinglish/English mix.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use {
    talash_conversation::{LookupResult, Reply, RequiredChannel},
    talash_registry::IdentifierKind,
};

/// Telegram message size limit.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

pub const JOIN_PROMPT_TEXT: &str = "⚠️ Bot use karne ke liye pehle dono channel join karo:";
pub const JOIN_CONFIRMED_TEXT: &str = "✅ Thanks! Ab /start likho.";
pub const JOIN_STILL_MISSING_TEXT: &str = "❌ Pehle dono channel join karo!";
pub const NO_SELECTION_TEXT: &str = "Use /start first";
pub const INVALID_FORMAT_TEXT: &str = "❌ Invalid format";
pub const PROCESSING_TEXT: &str = "⏳ Processing...";
pub const UNKNOWN_SELECTION_TEXT: &str = "⚠️ Something went wrong. Select a lookup type again:";

/// A reply rendered into transport terms.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
    /// Send with HTML parse mode (falls back to plain on rejection).
    pub html: bool,
}

/// Map an engine reply to its text and markup.
#[must_use]
pub fn render_reply(reply: &Reply) -> Rendered {
    match reply {
        Reply::JoinPrompt { channels } => Rendered {
            text: JOIN_PROMPT_TEXT.to_string(),
            keyboard: Some(join_keyboard(channels)),
            html: false,
        },
        Reply::JoinConfirmed => Rendered {
            text: JOIN_CONFIRMED_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
        Reply::JoinStillMissing => Rendered {
            text: JOIN_STILL_MISSING_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
        Reply::Menu { greeting } => Rendered {
            text: menu_text(greeting.as_deref()),
            keyboard: Some(menu_keyboard()),
            html: true,
        },
        Reply::ValuePrompt { kind } => Rendered {
            text: value_prompt_text(*kind),
            keyboard: None,
            html: true,
        },
        Reply::NoSelection => Rendered {
            text: NO_SELECTION_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
        Reply::InvalidFormat { .. } => Rendered {
            text: INVALID_FORMAT_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
        Reply::Processing => Rendered {
            text: PROCESSING_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
        // The lookup document is relayed verbatim, so never parsed as HTML.
        Reply::LookupReport(result) => Rendered {
            text: lookup_report_text(result),
            keyboard: None,
            html: false,
        },
        Reply::UnknownSelection => Rendered {
            text: UNKNOWN_SELECTION_TEXT.to_string(),
            keyboard: None,
            html: false,
        },
    }
}

/// One join-link row per channel, then the confirm button.
#[must_use]
pub fn join_keyboard(channels: &[RequiredChannel]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = channels
        .iter()
        .filter_map(|channel| {
            url::Url::parse(&channel.join_url)
                .ok()
                .map(|link| vec![InlineKeyboardButton::url(format!("🔔 {}", channel.label), link)])
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("✅ Joined", "check_join")]);
    InlineKeyboardMarkup::new(rows)
}

#[must_use]
pub fn menu_text(greeting: Option<&str>) -> String {
    let mut text = String::new();
    if let Some(name) = greeting {
        text.push_str(&format!("👋 Hello <b>{}</b>!\n\n", escape_html(name)));
    }
    text.push_str("🤖 <b>Multi-Service Lookup Bot</b>\n");
    text.push_str("━━━━━━━━━━━━━━━━━━━━\n\n");
    text.push_str("👇 Select a lookup type below:");
    text
}

/// One row per identifier kind in registry order, then the Help/Stats row.
#[must_use]
pub fn menu_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = IdentifierKind::ALL
        .iter()
        .map(|kind| vec![InlineKeyboardButton::callback(kind.name(), kind.key())])
        .collect();
    rows.push(vec![
        InlineKeyboardButton::callback("ℹ️ Help", "help"),
        InlineKeyboardButton::callback("📊 Stats", "stats"),
    ]);
    InlineKeyboardMarkup::new(rows)
}

#[must_use]
pub fn value_prompt_text(kind: IdentifierKind) -> String {
    let spec = kind.spec();
    format!(
        "<b>Enter {}</b>\nExample: <code>{}</code>",
        escape_html(spec.name),
        spec.example
    )
}

/// The service's document pretty-printed, or the generic failure cause.
#[must_use]
pub fn lookup_report_text(result: &LookupResult) -> String {
    match result {
        Ok(document) => {
            serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string())
        },
        Err(failure) => format!("⚠️ Lookup failed: {failure}"),
    }
}

#[must_use]
pub fn help_text() -> String {
    let mut text = String::from(
        "ℹ️ <b>How to use</b>\n\
         1. Send /start\n\
         2. Select a lookup type\n\
         3. Send the value in the shown format\n\n\
         Supported lookups:\n",
    );
    for kind in IdentifierKind::ALL {
        text.push_str(&format!(
            "• {} — e.g. <code>{}</code>\n",
            kind.name(),
            kind.spec().example
        ));
    }
    text
}

#[must_use]
pub fn stats_text(active_sessions: usize) -> String {
    format!(
        "📊 <b>Stats</b>\nLookup types: {}\nActive sessions: {}",
        IdentifierKind::ALL.len(),
        active_sessions
    )
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split text into chunks that fit within Telegram's message limit.
/// Prefers newline, then space boundaries to avoid breaking words.
#[must_use]
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.len() > max_len {
        let mut end = max_len;
        while !remaining.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // max_len is smaller than the first char; emit it whole.
            end = remaining
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(remaining.len());
        }

        let window = &remaining[..end];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&at| at > 0)
            .unwrap_or(end);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches(['\n', ' ']);
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}
