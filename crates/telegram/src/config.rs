use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use talash_conversation::RequiredChannel;

/// Lookup service used when the config does not name one.
pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://veerulookup.onrender.com";

/// Configuration for the bot.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Channels the user must have joined before the bot serves them.
    /// An empty list disables gating.
    pub required_channels: Vec<RequiredChannel>,

    /// Base URL of the external lookup service.
    pub lookup_base_url: String,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("required_channels", &self.required_channels)
            .field("lookup_base_url", &self.lookup_base_url)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            required_channels: Vec::new(),
            lookup_base_url: DEFAULT_LOOKUP_BASE_URL.to_string(),
        }
    }
}
