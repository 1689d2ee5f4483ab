//! Notification feed for the signed-in user.
//!
//! Admins are notified of bookings awaiting review and unread contact
//! messages. Regular users are notified when one of their bookings has been
//! decided. The feed is rebuilt from scratch on every poll.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::{Session, UserProfile};
use crate::store::USER_KEY;

/// How often the feed is rebuilt while signed in.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

const PENDING_STATUSES: &[&str] = &["pending", "pendingpayment"];
const DECIDED_STATUSES: &[&str] = &["approved", "rejected", "confirmed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Booking,
    Message,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    /// `None` when the record carries no readable date.
    pub date: Option<DateTime<Utc>>,
    /// The record the notification was built from.
    pub source: Value,
}

fn text<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn status_in(booking: &Value, statuses: &[&str]) -> bool {
    text(booking, "status")
        .map(|s| statuses.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn room_title(booking: &Value) -> String {
    let number = match booking.pointer("/room/number") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "?".to_string(),
    };
    format!("Room {}", number)
}

/// Accepts RFC 3339, naive date-times (taken as UTC) and bare dates.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn date_of(record: &Value, fields: &[&str]) -> Option<DateTime<Utc>> {
    fields
        .iter()
        .find_map(|field| text(record, field))
        .and_then(parse_date)
}

fn records(data: &Value) -> &[Value] {
    data.as_array().map(Vec::as_slice).unwrap_or(&[])
}

// Newest first, undated last.
fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Feed for an admin from the admin booking list and the contact inbox.
pub fn admin_notifications(bookings: &Value, messages: &Value) -> Vec<Notification> {
    let pending = records(bookings)
        .iter()
        .filter(|b| text(b, "status").is_none() || status_in(b, PENDING_STATUSES))
        .map(|b| Notification {
            kind: NotificationKind::Booking,
            title: room_title(b),
            description: b
                .pointer("/user/fullName")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or("Guest Request")
                .to_string(),
            date: date_of(b, &["createdAt"]),
            source: b.clone(),
        });

    let unread = records(messages)
        .iter()
        .filter(|m| !m.get("isRead").and_then(Value::as_bool).unwrap_or(false))
        .map(|m| Notification {
            kind: NotificationKind::Message,
            title: "New Message".to_string(),
            description: text(m, "subject").unwrap_or("Visitor Inquiry").to_string(),
            date: date_of(m, &["createdAt"]),
            source: m.clone(),
        });

    let mut feed: Vec<_> = pending.chain(unread).collect();
    sort_newest_first(&mut feed);
    feed
}

/// Feed for a regular user from their own bookings.
pub fn user_notifications(bookings: &Value) -> Vec<Notification> {
    let mut feed: Vec<_> = records(bookings)
        .iter()
        .filter(|b| status_in(b, DECIDED_STATUSES))
        .map(|b| Notification {
            kind: NotificationKind::Booking,
            title: room_title(b),
            description: text(b, "status").unwrap_or_default().to_string(),
            date: date_of(b, &["updatedAt", "startDate"]),
            source: b.clone(),
        })
        .collect();
    sort_newest_first(&mut feed);
    feed
}

/// Fetch and build the feed for `user`.
pub async fn collect(client: &ApiClient, user: &UserProfile) -> Result<Vec<Notification>, ApiError> {
    if user.is_admin() {
        let (bookings, messages) =
            tokio::try_join!(client.get_admin_bookings(), client.get_messages())?;
        Ok(admin_notifications(&bookings.data, &messages.data))
    } else {
        let bookings = client.my_bookings().await?;
        Ok(user_notifications(&bookings.data))
    }
}

/// Rebuilds the feed on an interval and publishes it on a watch channel.
pub struct NotificationPoller {
    client: Arc<ApiClient>,
    session: Session,
    interval: Duration,
    feed: Arc<watch::Sender<Vec<Notification>>>,
}

impl NotificationPoller {
    pub fn new(client: Arc<ApiClient>, session: Session) -> (Self, watch::Receiver<Vec<Notification>>) {
        let (tx, rx) = watch::channel(Vec::new());
        let poller = Self {
            client,
            session,
            interval: POLL_INTERVAL,
            feed: Arc::new(tx),
        };
        (poller, rx)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "Notification poller starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut events = self.session.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => self.spawn_poll(),
                event = events.recv() => match event {
                    Ok(event) if event.touches(USER_KEY) => {
                        if self.session.is_signed_in() {
                            self.spawn_poll();
                        } else {
                            self.feed.send_replace(Vec::new());
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Session events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::warn!("Session store closed, stopping notification poller");
                        break;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Notification poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    // Each poll runs on its own task so a slow backend never delays the
    // next tick.
    fn spawn_poll(&self) {
        let Some(user) = self.session.current_user() else {
            return;
        };
        if self.session.token().is_none() {
            return;
        }

        let client = self.client.clone();
        let session = self.session.clone();
        let feed = self.feed.clone();

        tokio::spawn(async move {
            match collect(&client, &user).await {
                Ok(notifications) => {
                    // Drop results for a user who has since signed out.
                    let still_current = session
                        .current_user()
                        .map(|current| current.email == user.email)
                        .unwrap_or(false);
                    if still_current {
                        tracing::debug!(count = notifications.len(), "Notifications refreshed");
                        feed.send_replace(notifications);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Notification check failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::tests::make_token;
    use crate::store::MemoryStore;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `my-bookings` with one approved booking whose id is the call
    /// number. The n-th call waits `delays_ms[n]` before answering.
    async fn start_bookings_upstream(delays_ms: &'static [u64]) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/api/proxy/Bookings/my-bookings",
            get(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let delay = delays_ms.get(n).copied().unwrap_or(0);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Json(json!([{ "id": n + 1, "status": "Approved", "room": { "number": "5" } }]))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), calls)
    }

    fn signed_in_user(origin: &str) -> (Session, Arc<ApiClient>) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session
            .sign_in(&make_token(json!({ "email": "guest@hotel.test", "role": "User" })))
            .unwrap();
        let client = Arc::new(ApiClient::new(ClientConfig::new(origin), store).unwrap());
        (session, client)
    }

    #[test]
    fn test_admin_feed_filters_and_sorts() {
        let bookings = json!([
            { "id": 1, "status": "Pending", "room": { "number": "101" },
              "user": { "fullName": "Hana" }, "createdAt": "2025-01-02T10:00:00" },
            { "id": 2, "status": "Approved", "room": { "number": "102" },
              "createdAt": "2025-01-03T10:00:00" },
            { "id": 3, "createdAt": "2025-01-04T10:00:00Z" },
            { "id": 4, "status": "PendingPayment", "room": { "number": 7 } },
        ]);
        let messages = json!([
            { "id": 9, "isRead": false, "subject": "Late checkout",
              "createdAt": "2025-01-05T08:00:00Z" },
            { "id": 10, "isRead": true, "createdAt": "2025-01-06T08:00:00Z" },
            { "id": 11, "createdAt": "2025-01-01T08:00:00Z" },
        ]);

        let feed = admin_notifications(&bookings, &messages);
        let ids: Vec<_> = feed.iter().map(|n| n.source["id"].clone()).collect();
        assert_eq!(ids, vec![json!(9), json!(3), json!(1), json!(11), json!(4)]);

        assert_eq!(feed[0].kind, NotificationKind::Message);
        assert_eq!(feed[0].description, "Late checkout");
        assert_eq!(feed[1].title, "Room ?");
        assert_eq!(feed[1].description, "Guest Request");
        assert_eq!(feed[2].title, "Room 101");
        assert_eq!(feed[2].description, "Hana");
        assert_eq!(feed[3].description, "Visitor Inquiry");
        assert_eq!(feed[4].title, "Room 7");
        assert_eq!(feed[4].date, None);
    }

    #[test]
    fn test_user_feed_only_decided_bookings() {
        let bookings = json!([
            { "id": 1, "status": "pending", "startDate": "2025-02-01" },
            { "id": 2, "status": "Approved", "startDate": "2025-02-01" },
            { "id": 3, "status": "rejected", "updatedAt": "2025-02-03T00:00:00Z",
              "startDate": "2025-01-01" },
            { "id": 4 },
        ]);

        let feed = user_notifications(&bookings);
        let ids: Vec<_> = feed.iter().map(|n| n.source["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2)]);
        assert_eq!(feed[1].description, "Approved");
    }

    #[test]
    fn test_non_array_data_is_empty() {
        assert!(user_notifications(&json!("")).is_empty());
        assert!(admin_notifications(&json!({ "error": "x" }), &Value::Null).is_empty());
    }

    #[test]
    fn test_parse_date_forms() {
        assert!(parse_date("2025-01-01T10:00:00Z").is_some());
        assert!(parse_date("2025-01-01T10:00:00.1234567").is_some());
        assert!(parse_date("2025-01-01").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[tokio::test]
    async fn test_slow_poll_does_not_hold_back_the_next_tick() {
        let (origin, _calls) = start_bookings_upstream(&[2000]).await;
        let (session, client) = signed_in_user(&origin);

        let (poller, mut feed) = NotificationPoller::new(client, session);
        let (stop_tx, stop_rx) = broadcast::channel(1);
        tokio::spawn(poller.with_interval(Duration::from_millis(100)).run(stop_rx));

        // The first call is still sleeping when this resolves.
        tokio::time::timeout(Duration::from_secs(1), feed.changed())
            .await
            .expect("no feed published while the first poll was in flight")
            .unwrap();
        {
            let published = feed.borrow_and_update();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].title, "Room 5");
            assert_eq!(published[0].description, "Approved");
            assert_ne!(published[0].source["id"], json!(1));
        }

        stop_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_results_after_sign_out_are_dropped() {
        let (origin, calls) = start_bookings_upstream(&[400]).await;
        let (session, client) = signed_in_user(&origin);

        let (poller, mut feed) = NotificationPoller::new(client, session.clone());
        let (stop_tx, stop_rx) = broadcast::channel(1);
        tokio::spawn(poller.with_interval(Duration::from_secs(3600)).run(stop_rx));

        // Wait for the first poll to reach the upstream.
        tokio::time::timeout(Duration::from_secs(1), async {
            while calls.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("poller never called the upstream");

        session.sign_out().unwrap();
        tokio::time::timeout(Duration::from_secs(1), feed.changed())
            .await
            .expect("feed was not cleared")
            .unwrap();
        assert!(feed.borrow_and_update().is_empty());

        // The in-flight poll answers after this, and must not repopulate the feed.
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(!feed.has_changed().unwrap());
        assert!(feed.borrow().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        stop_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn test_poller_clears_on_sign_out_and_stops_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(store.clone());
        session
            .sign_in(&make_token(json!({ "email": "a@b.c", "role": "Admin" })))
            .unwrap();
        let client = Arc::new(ApiClient::new(ClientConfig::new("http://127.0.0.1:9"), store).unwrap());

        let (poller, mut feed) = NotificationPoller::new(client, session.clone());
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let task = tokio::spawn(poller.with_interval(Duration::from_secs(3600)).run(stop_rx));

        // Let the poller subscribe to session events.
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.sign_out().unwrap();

        tokio::time::timeout(Duration::from_secs(2), feed.changed())
            .await
            .expect("feed was not cleared")
            .unwrap();
        assert!(feed.borrow().is_empty());

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("poller did not stop")
            .unwrap();
    }
}
