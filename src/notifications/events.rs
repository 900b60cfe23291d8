//! Push-event vocabulary
//!
//! A closed tagged union, one variant per event name on the wire, so
//! consumers can exhaustively handle them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::order::FoodStatus;
use crate::domain::reservation::Reservation;

/// Events pushed to a user's notification stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Stream opened; always the first event on a fresh stream.
    Connected(ConnectedEvent),
    /// Heartbeat, emitted on a fixed interval while the stream is idle.
    Ping(PingEvent),
    /// Generic human-readable message.
    Notification(NotificationEvent),
    /// Food preparation status changed.
    FoodStatus(FoodStatusEvent),
    /// Lateness report led to the reservation being shifted.
    ReservationShiftSuccess(ReservationShiftSuccessEvent),
    /// Lateness report could not shift the reservation (conflict).
    ReservationShiftNotAllowed(ReservationShiftNotAllowedEvent),
    /// First charge-update opened a charging session.
    ChargingStarted(ChargingStartedEvent),
    /// Per-update snapshot of the running session.
    ChargingProgress(ChargingProgressEvent),
    /// Session completed after the idle window elapsed.
    ChargingStopped(ChargingStoppedEvent),
    /// Driver finished charging and the payment time was recorded.
    ChargingPaid(ChargingPaidEvent),
}

impl Event {
    /// Wire name of the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Connected(_) => "connected",
            Event::Ping(_) => "ping",
            Event::Notification(_) => "notification",
            Event::FoodStatus(_) => "food_status",
            Event::ReservationShiftSuccess(_) => "reservation_shift_success",
            Event::ReservationShiftNotAllowed(_) => "reservation_shift_not_allowed",
            Event::ChargingStarted(_) => "charging_started",
            Event::ChargingProgress(_) => "charging_progress",
            Event::ChargingStopped(_) => "charging_stopped",
            Event::ChargingPaid(_) => "charging_paid",
        }
    }

    pub fn connected() -> Self {
        Event::Connected(ConnectedEvent {
            message: "Connected to notification stream".to_string(),
            time: Utc::now(),
        })
    }

    pub fn ping() -> Self {
        Event::Ping(PingEvent { time: Utc::now() })
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Event::Notification(NotificationEvent {
            message: message.into(),
            time: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedEvent {
    pub message: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingEvent {
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub message: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodStatusEvent {
    pub order_id: i64,
    pub status: FoodStatus,
    pub message: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationShiftSuccessEvent {
    pub reservation_id: i64,
    pub new_end: DateTime<Utc>,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationShiftNotAllowedEvent {
    pub reservation_id: i64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingStartedEvent {
    pub charger_id: i64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingProgressEvent {
    pub reservation: Reservation,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingStoppedEvent {
    pub charger_id: i64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingPaidEvent {
    pub charger_id: i64,
    pub time: DateTime<Utc>,
}

/// Wrapper adding delivery metadata to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
