//! Per-user push notifications
//!
//! Producers (charging engine, ETA coordinator, order service) publish
//! typed events to a user's mailbox; an attached stream drains the mailbox
//! and heartbeats when idle. Delivery is at-most-once: publishing to a
//! user with no attached stream is a no-op, and nothing survives a process
//! restart.

pub mod events;
pub mod hub;

pub use events::{Event, EventEnvelope};
pub use hub::{create_notification_hub, NotificationHub, NotificationStream, SharedNotificationHub};
