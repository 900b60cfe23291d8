//! Notification fan-out hub
//!
//! One mailbox per user, keyed by user id. Producers publish typed events;
//! the attached stream drains them in publish order, falling back to a
//! heartbeat on a fixed interval when idle. Wakeup is channel-driven, not
//! polled. Publishing to a user with no mailbox returns `false` and drops
//! the event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::events::{Event, EventEnvelope};

/// Default heartbeat interval while a stream is idle.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(5);

struct Mailbox {
    sender: mpsc::UnboundedSender<EventEnvelope>,
    /// Attach generation; a replaced stream's teardown must not release
    /// the replacement's mailbox.
    stream_id: u64,
}

/// Per-user notification fan-out.
pub struct NotificationHub {
    mailboxes: DashMap<i64, Mailbox>,
    attach_seq: AtomicU64,
    heartbeat: Duration,
}

/// Shared, reference-counted hub
pub type SharedNotificationHub = Arc<NotificationHub>;

/// Create a shared hub with the default heartbeat interval.
pub fn create_notification_hub() -> SharedNotificationHub {
    Arc::new(NotificationHub::new(DEFAULT_HEARTBEAT))
}

impl NotificationHub {
    pub fn new(heartbeat: Duration) -> Self {
        Self {
            mailboxes: DashMap::new(),
            attach_seq: AtomicU64::new(0),
            heartbeat,
        }
    }

    /// Open a stream for `user_id`, replacing any existing mailbox.
    ///
    /// The previous stream (if any) sees its channel close and terminates.
    /// The first event on the fresh stream is `connected`; anything
    /// published afterwards is flushed in publish order.
    pub fn attach(self: &Arc<Self>, user_id: i64) -> NotificationStream {
        let stream_id = self.attach_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = mpsc::unbounded_channel();

        let _ = sender.send(EventEnvelope::new(Event::connected()));
        self.mailboxes.insert(user_id, Mailbox { sender, stream_id });

        info!(user_id, stream_id, "Notification stream attached");

        // First heartbeat one full interval out, not immediately.
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + self.heartbeat, self.heartbeat);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        NotificationStream {
            hub: Arc::clone(self),
            user_id,
            stream_id,
            receiver,
            heartbeat: interval,
        }
    }

    /// Append an event to the user's mailbox.
    ///
    /// Returns `false` when the user has no mailbox (offline) or the
    /// stream is gone; the event is dropped, never queued durably.
    pub fn publish(&self, user_id: i64, event: Event) -> bool {
        let event_type = event.event_type();
        let Some(mailbox) = self.mailboxes.get(&user_id) else {
            debug!(user_id, event_type, "No mailbox, event dropped");
            return false;
        };

        if mailbox.sender.send(EventEnvelope::new(event)).is_err() {
            // Receiver is gone but the mailbox was not cleaned up yet.
            let stale_id = mailbox.stream_id;
            drop(mailbox);
            self.mailboxes
                .remove_if(&user_id, |_, m| m.stream_id == stale_id);
            debug!(user_id, event_type, "Stream gone, mailbox released");
            return false;
        }

        counter!("notifications_published_total").increment(1);
        debug!(user_id, event_type, "Event published");
        true
    }

    /// Whether a stream is currently attached for this user.
    pub fn is_attached(&self, user_id: i64) -> bool {
        self.mailboxes.contains_key(&user_id)
    }

    /// Number of attached mailboxes.
    pub fn attached_count(&self) -> usize {
        self.mailboxes.len()
    }

    fn release(&self, user_id: i64, stream_id: u64) {
        if self
            .mailboxes
            .remove_if(&user_id, |_, m| m.stream_id == stream_id)
            .is_some()
        {
            info!(user_id, stream_id, "Notification stream detached");
        }
    }
}

/// Receiving half of a user's mailbox, plus the idle heartbeat.
///
/// Dropping the stream (client disconnect, failed write) releases the
/// mailbox so it does not silently absorb events nobody will read.
pub struct NotificationStream {
    hub: SharedNotificationHub,
    user_id: i64,
    stream_id: u64,
    receiver: mpsc::UnboundedReceiver<EventEnvelope>,
    heartbeat: tokio::time::Interval,
}

impl NotificationStream {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Next event to deliver: a pending mailbox entry if there is one,
    /// otherwise the heartbeat when its interval elapses. Returns `None`
    /// once the mailbox was replaced by a newer attach.
    pub async fn next_event(&mut self) -> Option<EventEnvelope> {
        tokio::select! {
            // Pending entries win over a due heartbeat.
            biased;

            received = self.receiver.recv() => received,
            _ = self.heartbeat.tick() => Some(EventEnvelope::new(Event::ping())),
        }
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.hub.release(self.user_id, self.stream_id);
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> SharedNotificationHub {
        Arc::new(NotificationHub::new(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn publish_without_mailbox_is_a_noop() {
        let hub = hub();
        assert!(!hub.publish(7, Event::notification("lost")));
        assert_eq!(hub.attached_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_before_attach_is_not_replayed() {
        let hub = hub();
        hub.publish(7, Event::notification("before attach"));

        let mut stream = hub.attach(7);
        let first = stream.next_event().await.expect("connected");
        assert_eq!(first.event.event_type(), "connected");

        // Nothing was queued, so the next thing out is a heartbeat.
        let next = stream.next_event().await.expect("heartbeat");
        assert_eq!(next.event.event_type(), "ping");
    }

    #[tokio::test]
    async fn events_are_delivered_in_publish_order() {
        let hub = hub();
        let mut stream = hub.attach(3);

        assert!(hub.publish(3, Event::notification("a")));
        assert!(hub.publish(3, Event::notification("b")));
        assert!(hub.publish(3, Event::notification("c")));

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        for expected in ["a", "b", "c"] {
            match stream.next_event().await.unwrap().event {
                Event::Notification(n) => assert_eq!(n.message, expected),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn queued_event_beats_a_due_heartbeat() {
        let hub = hub();
        let mut stream = hub.attach(9);
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");

        // Make the heartbeat due, then publish: the entry must come first.
        tokio::time::advance(Duration::from_secs(6)).await;
        hub.publish(9, Event::notification("urgent"));

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "notification");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "ping");
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_fires_while_idle() {
        let hub = hub();
        let mut stream = hub.attach(1);
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");

        let ev = stream.next_event().await.unwrap();
        assert_eq!(ev.event.event_type(), "ping");
        let ev = stream.next_event().await.unwrap();
        assert_eq!(ev.event.event_type(), "ping");
    }

    #[tokio::test]
    async fn reattach_replaces_the_mailbox() {
        let hub = hub();
        let mut old = hub.attach(5);
        assert_eq!(old.next_event().await.unwrap().event.event_type(), "connected");

        let mut new = hub.attach(5);
        // The old stream's channel closed with the replacement.
        assert!(old.next_event().await.is_none());

        // Old stream teardown must not release the new mailbox.
        drop(old);
        assert!(hub.is_attached(5));
        assert!(hub.publish(5, Event::notification("to the new stream")));

        assert_eq!(new.next_event().await.unwrap().event.event_type(), "connected");
        assert_eq!(new.next_event().await.unwrap().event.event_type(), "notification");
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_mailbox() {
        let hub = hub();
        let stream = hub.attach(2);
        assert!(hub.is_attached(2));

        drop(stream);
        assert!(!hub.is_attached(2));
        assert!(!hub.publish(2, Event::notification("nobody home")));
    }
}
