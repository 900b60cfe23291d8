//! Reservation domain entity and its time window

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Half-open UTC interval `[start, end)` during which a charger is reserved.
///
/// Boundary-adjacent windows (one ends exactly where the other starts) do
/// not overlap, so back-to-back scheduling is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, enforcing `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::Validation(format!(
                "reservation window must satisfy start < end (got {} >= {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of the given length starting at `anchor`.
    pub fn from_anchor(anchor: DateTime<Utc>, length: Duration) -> DomainResult<Self> {
        Self::new(anchor, anchor + length)
    }

    /// Strict half-open overlap test: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the instant falls inside `[start, end)`.
    pub fn covers(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Charger reservation, created 1:1 with its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub order_id: i64,
    pub charger_id: i64,
    pub window: TimeWindow,
    pub created_at: DateTime<Utc>,
    /// Set when the driver finishes and pays for the charge.
    pub time_of_payment: Option<DateTime<Utc>>,
    /// 0-100, absent until charging begins.
    pub current_soc: Option<f64>,
    pub cumulative_price_of_charge: Option<f64>,
    pub cumulative_power: Option<f64>,
}

impl Reservation {
    /// Whether this reservation's window covers the given instant.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.window.covers(now)
    }

    pub fn charging_has_begun(&self) -> bool {
        self.current_soc.is_some()
    }
}

/// Fields for creating a reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub order_id: i64,
    pub charger_id: i64,
    pub window: TimeWindow,
}

/// One charge-update from a charger: the device's current view of the
/// session. Persisted onto the reservation whose window covers now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeSnapshot {
    pub current_soc: f64,
    pub cumulative_price_of_charge: f64,
    pub cumulative_power: f64,
}

// ── Tests ──────────────────────────────────────────────────────
