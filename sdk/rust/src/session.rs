//! Sign-in state on top of a [`SessionStore`].
//!
//! A session is a bearer token plus the user profile decoded from that
//! token's claims. The token is never validated locally; the backend
//! decides whether it is still good.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::store::{SessionStore, StoreError, StoreEvent, TOKEN_KEY, USER_KEY};

const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
const NAME_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
const EMAIL_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
const PHONE_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/mobilephone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Anything other than "admin" (any case) is a regular user.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Profile kept under [`USER_KEY`] while signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, deserialize_with = "deserialize_role")]
    pub role: Role,
}

fn deserialize_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Build a profile from decoded token claims.
    pub fn from_claims(claims: &Map<String, Value>) -> Self {
        let name = claim(claims, &[NAME_CLAIM, "unique_name"]);
        Self {
            full_name: name.clone(),
            name,
            email: claim(claims, &[EMAIL_CLAIM, "email"]),
            phone_number: claim(claims, &[PHONE_CLAIM, "mobilephone"]),
            role: role_claim(claims),
        }
    }
}

fn claim(claims: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| claims.get(*name))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

// An array claim reads as its comma-joined entries, so only a single
// "admin" entry makes an admin.
fn role_claim(claims: &Map<String, Value>) -> Role {
    for name in [ROLE_CLAIM, "role"] {
        match claims.get(name) {
            Some(Value::String(s)) if !s.is_empty() => return Role::parse(s),
            Some(Value::Array(items)) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                return Role::parse(&joined);
            }
            _ => {}
        }
    }
    Role::User
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No token returned.")]
    MissingToken,

    #[error("token is not a readable JWT")]
    MalformedToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode user profile: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Decode the claims segment of a JWT without verifying it.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, SessionError> {
    let payload = token.split('.').nth(1).ok_or(SessionError::MalformedToken)?;
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| SessionError::MalformedToken)?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(claims)) => Ok(claims),
        _ => Err(SessionError::MalformedToken),
    }
}

/// Pull the token out of a login response: `token`, then `accessToken`,
/// then a bare string body.
pub fn token_from_login(data: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);
    data.get("token")
        .and_then(non_empty)
        .or_else(|| data.get("accessToken").and_then(non_empty))
        .or_else(|| non_empty(data))
}

/// Handle on the signed-in state.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// The stored profile. A corrupt entry reads as signed out.
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable user profile");
                None
            }
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token().is_some() && self.current_user().is_some()
    }

    /// Store a freshly issued token and the profile decoded from it.
    ///
    /// Nothing is written when the token cannot be decoded.
    pub fn sign_in(&self, token: &str) -> Result<UserProfile, SessionError> {
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }
        let claims = decode_claims(token)?;
        let user = UserProfile::from_claims(&claims);
        let encoded = serde_json::to_string(&user)?;

        self.store.set(TOKEN_KEY, token)?;
        self.store.set(USER_KEY, &encoded)?;

        tracing::info!(email = %user.email, role = ?user.role, "Signed in");
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.remove(USER_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        tracing::info!("Signed out");
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }
}
