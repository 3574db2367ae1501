//! Lookup dispatcher.
//!
//! Builds the request for a validated identifier value and relays the
//! service's JSON document. One GET per dispatch: no retries, no backoff.

use {
    async_trait::async_trait,
    thiserror::Error,
    tracing::{debug, warn},
};

use {
    talash_conversation::{Lookup, LookupFailure, LookupResult},
    talash_registry::IdentifierKind,
};

/// Default request timeout. A hung lookup would otherwise pin its
/// conversation until the transport gives up.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build lookup http client")]
    Client(#[source] reqwest::Error),
}

/// HTTP client for the external lookup service.
pub struct LookupClient {
    http: reqwest::Client,
    base_url: String,
}

impl LookupClient {
    /// Build a client against the service's base URL. A trailing slash on
    /// `base_url` is tolerated; endpoint paths always start with one.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Client)?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    /// Request target: endpoint path for the kind plus the percent-encoded
    /// value. UPI handles and the like contain characters that need
    /// escaping.
    fn endpoint(&self, kind: IdentifierKind, value: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            kind.spec().endpoint_path,
            urlencoding::encode(value)
        )
    }
}

#[async_trait]
impl Lookup for LookupClient {
    async fn dispatch(&self, kind: IdentifierKind, value: &str) -> LookupResult {
        let url = self.endpoint(kind, value);
        debug!(kind = kind.key(), %url, "dispatching lookup");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(kind = kind.key(), %error, "lookup request failed");
                return Err(LookupFailure::Unreachable);
            },
        };

        let status = response.status();
        if !status.is_success() {
            warn!(kind = kind.key(), status = status.as_u16(), "lookup returned non-success");
            return Err(LookupFailure::Status(status.as_u16()));
        }

        match response.json::<serde_json::Value>().await {
            Ok(document) => Ok(document),
            Err(error) => {
                warn!(kind = kind.key(), %error, "lookup body was not valid JSON");
                Err(LookupFailure::MalformedBody)
            },
        }
    }
}
