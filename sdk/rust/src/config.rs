//! Client configuration and externally supplied integration keys.

use std::fmt;
use std::time::Duration;

use crate::store::TOKEN_KEY;

/// Path prefix that routes calls through the gateway.
pub const DEFAULT_BASE_PATH: &str = "/api/proxy";

/// Every call fails once this elapses.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Where and how the client talks to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and authority of the gateway, e.g. "http://localhost:3000".
    pub origin: String,
    /// Prefix every endpoint path is appended to.
    pub base_path: String,
    pub timeout: Duration,
    /// Session store key holding the bearer token.
    pub token_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_key: TOKEN_KEY.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the origin taken from `BOOKING_API_ORIGIN` when set.
    pub fn from_env() -> Self {
        match std::env::var("BOOKING_API_ORIGIN") {
            Ok(origin) if !origin.is_empty() => Self::new(origin),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL for an endpoint path such as `/Rooms/3`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.origin.trim_end_matches('/'),
            self.base_path,
            path
        )
    }
}

/// A credential that must never be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Keys for third-party integrations, injected at deploy time.
///
/// The OAuth client id and the payment publishable key are public by
/// design and may ship to end users. The AI completion key is a secret and
/// belongs on a server only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationKeys {
    pub oauth_client_id: Option<String>,
    pub payment_publishable_key: Option<String>,
    pub ai_completion_key: Option<SecretValue>,
}

impl IntegrationKeys {
    pub const OAUTH_CLIENT_ID_VAR: &'static str = "BOOKING_OAUTH_CLIENT_ID";
    pub const PAYMENT_PUBLISHABLE_KEY_VAR: &'static str = "BOOKING_PAYMENT_PUBLISHABLE_KEY";
    pub const AI_COMPLETION_KEY_VAR: &'static str = "BOOKING_AI_API_KEY";

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            oauth_client_id: get(Self::OAUTH_CLIENT_ID_VAR),
            payment_publishable_key: get(Self::PAYMENT_PUBLISHABLE_KEY_VAR),
            ai_completion_key: get(Self::AI_COMPLETION_KEY_VAR).map(SecretValue::new),
        }
    }
}
