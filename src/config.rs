//! Client configuration injected once at startup.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat page is rendered by the server with request-scoped values
//! (session token, a secondary value, display name) substituted into it.
//! The browser host reads them from a JSON block on the page; the terminal
//! host gets them from flags and environment variables. Either way they end
//! up in one immutable [`ClientConfig`] handed to the client core.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::net::backoff::BackoffConfig;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";
pub const DEFAULT_MESSAGES_ID: &str = "messages";
pub const DEFAULT_INPUT_ID: &str = "message";
pub const DEFAULT_SEND_ID: &str = "send";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing session token")]
    MissingToken,
    #[error("`{field}` still holds an unsubstituted template placeholder")]
    Placeholder { field: &'static str },
    #[error("endpoint must be a ws:// or wss:// URL, got `{0}`")]
    InvalidEndpoint(String),
    #[error("invalid page config: {0}")]
    PageConfig(#[from] serde_json::Error),
    #[error("invalid number in {var}: `{value}`")]
    InvalidNumber { var: String, value: String },
}

/// Element ids of the page's chat widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomIds {
    pub messages: String,
    pub input: String,
    pub send: String,
}

impl Default for DomIds {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGES_ID.to_owned(),
            input: DEFAULT_INPUT_ID.to_owned(),
            send: DEFAULT_SEND_ID.to_owned(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
    pub secondary: String,
    pub display_name: String,
    /// Transcript cap; unbounded when `None`.
    pub history_limit: Option<usize>,
    pub reconnect: BackoffConfig,
    pub dom: DomIds,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("secondary", &self.secondary)
            .field("display_name", &self.display_name)
            .field("history_limit", &self.history_limit)
            .field("reconnect", &self.reconnect)
            .field("dom", &self.dom)
            .finish()
    }
}

/// Shape of the `<script type="application/json">` block on the chat page.
#[derive(Debug, Deserialize)]
struct PageConfig {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    token: String,
    #[serde(default)]
    secondary: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    history_limit: Option<usize>,
    #[serde(default)]
    messages_id: Option<String>,
    #[serde(default)]
    input_id: Option<String>,
    #[serde(default)]
    send_id: Option<String>,
    #[serde(default)]
    reconnect_initial_ms: Option<u64>,
    #[serde(default)]
    reconnect_max_ms: Option<u64>,
    #[serde(default)]
    reconnect_max_attempts: Option<u32>,
}

impl ClientConfig {
    /// Build a validated config with defaults for everything but the
    /// endpoint and token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] for a blank token,
    /// [`ConfigError::Placeholder`] for an unrendered template value, and
    /// [`ConfigError::InvalidEndpoint`] for a non-WebSocket URL.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            endpoint: endpoint.into().trim().to_owned(),
            token: token.into().trim().to_owned(),
            secondary: String::new(),
            display_name: String::new(),
            history_limit: None,
            reconnect: BackoffConfig::default(),
            dom: DomIds::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse the JSON block the server renders into the chat page.
    ///
    /// Only `token` is required; `endpoint` defaults to
    /// [`DEFAULT_ENDPOINT`] and the element ids to `messages`, `message`
    /// and `send`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PageConfig`] for malformed JSON, plus every
    /// error [`ClientConfig::new`] returns.
    pub fn from_page_json(raw: &str) -> Result<Self, ConfigError> {
        let page: PageConfig = serde_json::from_str(raw)?;

        let defaults = BackoffConfig::default();
        let reconnect = BackoffConfig {
            initial: page
                .reconnect_initial_ms
                .map_or(defaults.initial, std::time::Duration::from_millis),
            max: page.reconnect_max_ms.map_or(defaults.max, std::time::Duration::from_millis),
            max_attempts: page.reconnect_max_attempts,
        };
        let dom_defaults = DomIds::default();
        let dom = DomIds {
            messages: page.messages_id.unwrap_or(dom_defaults.messages),
            input: page.input_id.unwrap_or(dom_defaults.input),
            send: page.send_id.unwrap_or(dom_defaults.send),
        };

        let config = Self::new(page.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()), page.token)?
            .with_secondary(page.secondary)
            .with_display_name(page.name)
            .with_history_limit(page.history_limit.filter(|limit| *limit > 0))
            .with_reconnect(reconnect)
            .with_dom_ids(dom);
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = secondary.into();
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: BackoffConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    #[must_use]
    pub fn with_dom_ids(mut self, dom: DomIds) -> Self {
        self.dom = dom;
        self
    }

    /// Check the invariants every host relies on.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if is_placeholder(&self.token) {
            return Err(ConfigError::Placeholder { field: "token" });
        }
        if self.token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if is_placeholder(&self.secondary) {
            return Err(ConfigError::Placeholder { field: "secondary" });
        }
        if is_placeholder(&self.display_name) {
            return Err(ConfigError::Placeholder { field: "name" });
        }
        if is_placeholder(&self.endpoint) {
            return Err(ConfigError::Placeholder { field: "endpoint" });
        }
        let host = self
            .endpoint
            .strip_prefix("ws://")
            .or_else(|| self.endpoint.strip_prefix("wss://"));
        match host {
            Some(rest) if !rest.is_empty() => Ok(()),
            _ => Err(ConfigError::InvalidEndpoint(self.endpoint.clone())),
        }
    }

    /// Debug-log the injected template values. The token is never logged.
    pub fn log_template_values(&self) {
        log::debug!(
            "chat config: endpoint={} name={:?} secondary={:?} token=<redacted, {} chars>",
            self.endpoint,
            self.display_name,
            self.secondary,
            self.token.chars().count()
        );
    }
}

/// Read an optional numeric environment variable.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidNumber`] when the variable is set but does
/// not parse as `T`.
pub fn env_parse<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var: var.to_owned(), value }),
        Err(_) => Ok(None),
    }
}

/// Transcript cap from `CHAT_HISTORY_LIMIT`; `0` means unbounded.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidNumber`] for a non-numeric value.
pub fn history_limit_from_env() -> Result<Option<usize>, ConfigError> {
    Ok(env_parse::<usize>("CHAT_HISTORY_LIMIT")?.filter(|limit| *limit > 0))
}

/// A value the server-side template engine left unrendered, e.g. `{{ .Token }}`.
fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("{{") && value.ends_with("}}")
}
