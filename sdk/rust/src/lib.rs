//! Client SDK for the hotel-booking API.
//!
//! Every call goes through the gateway's forwarding route with the signed-in
//! user's bearer token attached. Local state (token, profile, wishlists)
//! lives in a [`SessionStore`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use booking_sdk::{ApiClient, ClientConfig, MemoryStore, extract_error};
//!
//! # async fn demo() {
//! let client = ApiClient::new(ClientConfig::from_env(), Arc::new(MemoryStore::new())).unwrap();
//! match client.get_rooms().await {
//!     Ok(rooms) => println!("{}", rooms.data),
//!     Err(e) => eprintln!("{}", extract_error(&e)),
//! }
//! # }
//! ```

pub mod client;
pub mod config;
mod endpoints;
pub mod error;
pub mod models;
pub mod notifications;
pub mod session;
pub mod store;
pub mod wishlist;

pub use client::{ApiClient, ApiResponse};
pub use config::{ClientConfig, IntegrationKeys, SecretValue};
pub use error::{extract_error, ApiError};
pub use notifications::{Notification, NotificationKind, NotificationPoller};
pub use session::{Role, Session, SessionError, UserProfile};
pub use store::{FileStore, MemoryStore, SessionStore, StoreError, StoreEvent};
pub use wishlist::{Toggled, Wishlist, WishlistError};

pub use reqwest::{Method, StatusCode};
