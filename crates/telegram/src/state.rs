use std::sync::Arc;

use teloxide::Bot;

use talash_conversation::Conversation;

/// Shared runtime state handed to the update handlers.
pub struct BotContext {
    pub bot: Bot,
    pub engine: Arc<Conversation>,
}
