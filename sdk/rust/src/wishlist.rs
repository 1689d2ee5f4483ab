//! Per-user saved rooms, kept in the session store.
//!
//! Each user's list lives under its own key so switching accounts switches
//! lists. Signed-out visitors share a single guest list.

use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::session::Session;
use crate::store::StoreError;

const KEY_PREFIX: &str = "hotel_wishlist_";
const GUEST_SUFFIX: &str = "guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, thiserror::Error)]
pub enum WishlistError {
    #[error("room has no id")]
    MissingId,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode wishlist: {0}")]
    Encode(#[from] serde_json::Error),
}

fn room_id(room: &Value) -> Option<&Value> {
    room.get("id").filter(|id| !id.is_null())
}

/// Wishlist of whoever is signed in to `session`.
///
/// Clones share one update lock, so concurrent toggles never lose a write.
#[derive(Clone)]
pub struct Wishlist {
    session: Session,
    update: Arc<Mutex<()>>,
}

impl Wishlist {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            update: Arc::new(Mutex::new(())),
        }
    }

    /// Store key for the current user.
    pub fn storage_key(&self) -> String {
        match self.session.current_user() {
            Some(user) if !user.email.is_empty() => format!("{}{}", KEY_PREFIX, user.email),
            _ => format!("{}{}", KEY_PREFIX, GUEST_SUFFIX),
        }
    }

    /// Saved rooms, oldest first. Unreadable lists read as empty.
    pub fn items(&self) -> Vec<Value> {
        let Some(raw) = self.session.store().get(&self.storage_key()) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(Value::Array(items)) => items,
            _ => {
                tracing::warn!(key = %self.storage_key(), "Ignoring unreadable wishlist");
                Vec::new()
            }
        }
    }

    pub fn contains(&self, room: &Value) -> bool {
        let Some(id) = room_id(room) else {
            return false;
        };
        self.items().iter().any(|item| room_id(item) == Some(id))
    }

    /// Add the room, or remove it if a room with the same id is saved.
    pub fn toggle(&self, room: Value) -> Result<Toggled, WishlistError> {
        let id = room_id(&room).cloned().ok_or(WishlistError::MissingId)?;
        let _guard = self.update.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.items();

        let before = items.len();
        items.retain(|item| room_id(item) != Some(&id));
        let outcome = if items.len() < before {
            Toggled::Removed
        } else {
            items.push(room);
            Toggled::Added
        };

        let encoded = serde_json::to_string(&items)?;
        self.session.store().set(&self.storage_key(), &encoded)?;
        Ok(outcome)
    }
}
