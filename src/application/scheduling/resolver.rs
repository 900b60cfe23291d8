//! Reservation conflict resolver
//!
//! Temporal-interval logic over the reservation store: availability
//! queries, extension eligibility, and the commit-time re-check that
//! guards a shift against a reservation created in between.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::{Charger, DomainError, DomainResult, RepositoryProvider, Reservation, TimeWindow};

/// Scheduling constants. The reference values are policy, not derived;
/// they are loaded from configuration.
#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    /// Look-ahead window checked by `can_extend`.
    pub extend_lookahead: Duration,
    /// How far a lateness-triggered shift pushes `reservation_end`.
    pub shift_step: Duration,
    /// Nominal travel time added on top of `reservation_start` when a
    /// lateness report recomputes the ETA.
    pub eta_base_offset: Duration,
    /// A driver within this margin past `reservation_start` is on
    /// schedule and no shift is attempted.
    pub on_schedule_threshold: Duration,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            extend_lookahead: Duration::minutes(10),
            shift_step: Duration::minutes(5),
            eta_base_offset: Duration::minutes(19),
            on_schedule_threshold: Duration::minutes(15),
        }
    }
}

/// Conflict resolver over the reservation and charger repositories.
pub struct ConflictResolver {
    repos: Arc<dyn RepositoryProvider>,
    policy: SchedulingPolicy,
}

impl ConflictResolver {
    pub fn new(repos: Arc<dyn RepositoryProvider>, policy: SchedulingPolicy) -> Self {
        Self { repos, policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Chargers at the station with no reservation overlapping `window`.
    pub async fn available_chargers(
        &self,
        station_id: i64,
        window: &TimeWindow,
    ) -> DomainResult<Vec<Charger>> {
        let chargers = self.repos.chargers().find_by_station(station_id).await?;
        let mut free = Vec::with_capacity(chargers.len());
        for charger in chargers {
            let taken = self
                .repos
                .reservations()
                .find_overlapping(charger.id, window, None)
                .await?;
            if taken.is_empty() {
                free.push(charger);
            }
        }
        Ok(free)
    }

    /// Whether any reservation on the charger overlaps
    /// `[anchor, anchor + extension)`, excluding the reservation under
    /// evaluation.
    pub async fn has_conflict(
        &self,
        charger_id: i64,
        anchor: DateTime<Utc>,
        extension: Duration,
        exclude: Option<i64>,
    ) -> DomainResult<bool> {
        let probe = TimeWindow::from_anchor(anchor, extension)?;
        let overlapping = self
            .repos
            .reservations()
            .find_overlapping(charger_id, &probe, exclude)
            .await?;
        Ok(!overlapping.is_empty())
    }

    /// Whether the reservation may be extended past its current end.
    ///
    /// An unknown id is a lookup failure, never silently "extendable".
    pub async fn can_extend(&self, reservation_id: i64) -> DomainResult<bool> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        let conflicted = self
            .has_conflict(
                reservation.charger_id,
                reservation.window.end,
                self.policy.extend_lookahead,
                Some(reservation.id),
            )
            .await?;
        Ok(!conflicted)
    }

    /// Push `reservation_end` forward by `minutes`.
    ///
    /// Re-checks for conflicts immediately before committing; losing that
    /// race fails with `Conflict` rather than truncating the shift.
    pub async fn shift(&self, reservation_id: i64, minutes: i64) -> DomainResult<Reservation> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        let extension = Duration::minutes(minutes);
        let conflicted = self
            .has_conflict(
                reservation.charger_id,
                reservation.window.end,
                extension,
                Some(reservation.id),
            )
            .await?;
        if conflicted {
            return Err(DomainError::Conflict(format!(
                "charger {} is reserved within {} minutes of {}",
                reservation.charger_id, minutes, reservation.window.end
            )));
        }

        let new_end = reservation.window.end + extension;
        let shifted = self.repos.reservations().update_end(reservation_id, new_end).await?;
        debug!(reservation_id, %new_end, "Reservation shifted");
        Ok(shifted)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewReservation, ReservationRepository};
    use crate::infrastructure::storage::MemoryStorage;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn win(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeWindow {
        TimeWindow::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    fn charger(id: i64, station_id: i64) -> Charger {
        Charger {
            id,
            station_id,
            connector_type: "CCS".to_string(),
            max_power_kw: 150.0,
        }
    }

    async fn seed_reservation(
        storage: &MemoryStorage,
        charger_id: i64,
        window: TimeWindow,
    ) -> Reservation {
        ReservationRepository::create(
            storage,
            NewReservation {
                order_id: 0,
                charger_id,
                window,
            },
        )
        .await
        .unwrap()
    }

    fn resolver(storage: &Arc<MemoryStorage>) -> ConflictResolver {
        ConflictResolver::new(storage.clone(), SchedulingPolicy::default())
    }

    #[tokio::test]
    async fn available_chargers_excludes_overlapping_windows() {
        let storage = MemoryStorage::shared();
        storage.chargers().save(charger(7, 1)).await.unwrap();
        storage.chargers().save(charger(8, 1)).await.unwrap();
        seed_reservation(&storage, 7, win(10, 0, 10, 30)).await;

        let resolver = resolver(&storage);

        let free = resolver
            .available_chargers(1, &win(10, 15, 10, 20))
            .await
            .unwrap();
        let ids: Vec<i64> = free.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![8]);

        let free = resolver
            .available_chargers(1, &win(10, 30, 11, 0))
            .await
            .unwrap();
        let ids: Vec<i64> = free.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 8]);
    }

    #[tokio::test]
    async fn back_to_back_reservations_are_legal() {
        let storage = MemoryStorage::shared();
        storage.chargers().save(charger(4, 2)).await.unwrap();
        seed_reservation(&storage, 4, win(9, 0, 9, 30)).await;
        seed_reservation(&storage, 4, win(9, 30, 10, 0)).await;

        let resolver = resolver(&storage);
        let free = resolver
            .available_chargers(2, &win(10, 0, 10, 30))
            .await
            .unwrap();
        assert_eq!(free.len(), 1);
    }

    #[tokio::test]
    async fn can_extend_true_when_lookahead_is_free() {
        let storage = MemoryStorage::shared();
        let r = seed_reservation(&storage, 7, win(10, 0, 10, 30)).await;

        let resolver = resolver(&storage);
        assert!(resolver.can_extend(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn can_extend_false_when_lookahead_is_taken() {
        let storage = MemoryStorage::shared();
        let r = seed_reservation(&storage, 7, win(10, 0, 10, 30)).await;
        // Next booking begins 5 minutes after r ends, inside the 10-minute
        // look-ahead.
        seed_reservation(&storage, 7, win(10, 35, 11, 0)).await;

        let resolver = resolver(&storage);
        assert!(!resolver.can_extend(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn can_extend_ignores_back_to_back_follower_outside_lookahead() {
        let storage = MemoryStorage::shared();
        let r = seed_reservation(&storage, 7, win(10, 0, 10, 30)).await;
        seed_reservation(&storage, 7, win(10, 40, 11, 0)).await;

        let resolver = resolver(&storage);
        // Follower starts exactly at the end of the look-ahead window;
        // half-open semantics keep it out of conflict.
        assert!(resolver.can_extend(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn can_extend_fails_for_unknown_reservation() {
        let storage = MemoryStorage::shared();
        let resolver = resolver(&storage);
        let err = resolver.can_extend(404).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn shift_moves_the_end_by_the_requested_minutes() {
        let storage = MemoryStorage::shared();
        let r = seed_reservation(&storage, 7, win(10, 11, 10, 30)).await;

        let resolver = resolver(&storage);
        let shifted = resolver.shift(r.id, 5).await.unwrap();
        assert_eq!(shifted.window.end, at(10, 35));
        assert_eq!(shifted.window.start, at(10, 11));
    }

    #[tokio::test]
    async fn shift_fails_with_conflict_when_the_slot_is_taken() {
        let storage = MemoryStorage::shared();
        let r = seed_reservation(&storage, 7, win(10, 0, 10, 30)).await;
        seed_reservation(&storage, 7, win(10, 32, 11, 0)).await;

        let resolver = resolver(&storage);
        let err = resolver.shift(r.id, 5).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // The reservation is untouched after the failed shift.
        let unchanged = storage.reservations().find_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(unchanged.window.end, at(10, 30));
    }
}
