//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{ChargeSnapshot, NewReservation, Reservation, TimeWindow};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Persist a new reservation and return it with its assigned id.
    async fn create(&self, new: NewReservation) -> DomainResult<Reservation>;

    /// Find reservation by ID
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Reservation>>;

    /// Find the reservation belonging to an order (1:1).
    async fn find_by_order(&self, order_id: i64) -> DomainResult<Option<Reservation>>;

    /// All reservations on a charger whose window strictly overlaps the
    /// given one (half-open semantics), optionally excluding one
    /// reservation id (the one under evaluation).
    async fn find_overlapping(
        &self,
        charger_id: i64,
        window: &TimeWindow,
        exclude: Option<i64>,
    ) -> DomainResult<Vec<Reservation>>;

    /// Move `reservation_end` to a new instant. Fails with `NotFound` for
    /// an unknown id.
    async fn update_end(&self, id: i64, new_end: DateTime<Utc>) -> DomainResult<Reservation>;

    /// Apply a charge update to the reservation on this charger whose
    /// window covers `now`. Returns `None` when no such reservation
    /// exists (charging with no active window).
    async fn record_charging(
        &self,
        charger_id: i64,
        snapshot: &ChargeSnapshot,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>>;

    /// Stamp `time_of_payment` on the reservation covering `now` for this
    /// charger. Returns `None` when no such reservation exists.
    async fn set_time_of_payment(
        &self,
        charger_id: i64,
        paid_at: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>>;

    /// Customer id of the order owning the reservation currently active
    /// on this charger.
    async fn find_driver_for_charger(
        &self,
        charger_id: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<i64>>;
}
