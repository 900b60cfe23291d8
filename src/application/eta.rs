//! ETA coordination
//!
//! Recomputes a driver's arrival estimate from a lateness report, persists
//! it on the order, and decides whether the reservation end needs to move
//! through the conflict resolver's shift protocol.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::application::scheduling::ConflictResolver;
use crate::domain::{DomainError, DomainResult, Order, RepositoryProvider, Reservation};
use crate::notifications::{
    events::{Event, ReservationShiftNotAllowedEvent, ReservationShiftSuccessEvent},
    SharedNotificationHub,
};

/// Result of a lateness report.
#[derive(Debug, Clone, PartialEq)]
pub enum LatenessOutcome {
    /// Driver arrives within the on-schedule margin; nothing shifted.
    OnSchedule {
        order: Order,
        reservation: Reservation,
    },
    /// Shift needed but a conflicting reservation blocks it; the
    /// reservation is returned unshifted.
    ShiftRejected {
        order: Order,
        reservation: Reservation,
    },
    /// Reservation end moved by the configured shift step.
    Shifted {
        order: Order,
        reservation: Reservation,
    },
}

pub struct EtaCoordinator {
    repos: Arc<dyn RepositoryProvider>,
    resolver: Arc<ConflictResolver>,
    hub: SharedNotificationHub,
}

impl EtaCoordinator {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        resolver: Arc<ConflictResolver>,
        hub: SharedNotificationHub,
    ) -> Self {
        Self {
            repos,
            resolver,
            hub,
        }
    }

    /// Handle a driver's lateness report.
    ///
    /// The recomputed ETA is persisted on the order regardless of the
    /// downstream conflict outcome. Retrying the same report is safe: the
    /// ETA recomputes to the same value and the shift amount is fixed, so
    /// the conflict check guards a second extension the same way it
    /// guarded the first.
    pub async fn report_lateness(
        &self,
        reservation_id: i64,
        order_id: i64,
        lateness_minutes: i64,
    ) -> DomainResult<LatenessOutcome> {
        let policy = self.resolver.policy().clone();

        let reservation = self
            .repos
            .reservations()
            .find_by_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        let new_eta =
            reservation.window.start + policy.eta_base_offset + Duration::minutes(lateness_minutes);
        let order = self.repos.orders().update_eta(order_id, new_eta).await?;

        if new_eta - reservation.window.start <= policy.on_schedule_threshold {
            info!(reservation_id, order_id, %new_eta, "Driver on schedule");
            return Ok(LatenessOutcome::OnSchedule { order, reservation });
        }

        let conflicted = self
            .resolver
            .has_conflict(
                reservation.charger_id,
                reservation.window.end,
                policy.shift_step,
                Some(reservation.id),
            )
            .await?;

        if conflicted {
            warn!(
                reservation_id,
                charger_id = reservation.charger_id,
                "Late driver, but the shift slot is taken"
            );
            self.hub.publish(
                order.customer_id,
                Event::ReservationShiftNotAllowed(ReservationShiftNotAllowedEvent {
                    reservation_id,
                    time: chrono::Utc::now(),
                }),
            );
            return Ok(LatenessOutcome::ShiftRejected { order, reservation });
        }

        // A conflicting reservation may still appear between the check
        // above and the commit; shift() re-checks and a lost race
        // surfaces as Conflict rather than a silent truncation.
        let shifted = self
            .resolver
            .shift(reservation_id, policy.shift_step.num_minutes())
            .await?;

        info!(reservation_id, new_end = %shifted.window.end, "Reservation shifted for late driver");
        self.hub.publish(
            order.customer_id,
            Event::ReservationShiftSuccess(ReservationShiftSuccessEvent {
                reservation_id,
                new_end: shifted.window.end,
                time: chrono::Utc::now(),
            }),
        );

        Ok(LatenessOutcome::Shifted {
            order,
            reservation: shifted,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scheduling::SchedulingPolicy;
    use crate::domain::{NewOrder, NewReservation, ReservationRepository, TimeWindow};
    use crate::infrastructure::storage::MemoryStorage;
    use crate::notifications::NotificationHub;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration as StdDuration;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn win(h1: u32, m1: u32, h2: u32, m2: u32) -> TimeWindow {
        TimeWindow::new(at(h1, m1), at(h2, m2)).unwrap()
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        hub: SharedNotificationHub,
        coordinator: EtaCoordinator,
    }

    fn fixture() -> Fixture {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(StdDuration::from_secs(5)));
        let resolver = Arc::new(ConflictResolver::new(
            storage.clone(),
            SchedulingPolicy::default(),
        ));
        let coordinator = EtaCoordinator::new(storage.clone(), resolver, hub.clone());
        Fixture {
            storage,
            hub,
            coordinator,
        }
    }

    /// Order with reservation `[10:11, 10:30)` on charger 7.
    async fn seed(fx: &Fixture) -> (i64, i64, i64) {
        let (order, reservation) = fx
            .storage
            .orders()
            .create_with_reservation(
                NewOrder {
                    customer_id: 42,
                    restaurant_id: 1,
                    total_price: 23.5,
                    customer_eta: at(10, 30),
                },
                7,
                win(10, 11, 10, 30),
            )
            .await
            .unwrap();
        (order.id, reservation.id, order.customer_id)
    }

    #[tokio::test]
    async fn small_lateness_is_on_schedule_and_never_shifts() {
        let fx = fixture();
        let (order_id, reservation_id, _) = seed(&fx).await;

        // ETA = 10:11 + 19min - 5min = 10:25, 14 min past start.
        let outcome = fx
            .coordinator
            .report_lateness(reservation_id, order_id, -5)
            .await
            .unwrap();

        match outcome {
            LatenessOutcome::OnSchedule { order, reservation } => {
                assert_eq!(order.customer_eta, at(10, 25));
                assert_eq!(reservation.window.end, at(10, 30));
            }
            other => panic!("expected OnSchedule, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn eta_is_persisted_even_when_no_shift_happens() {
        let fx = fixture();
        let (order_id, reservation_id, _) = seed(&fx).await;

        fx.coordinator
            .report_lateness(reservation_id, order_id, -10)
            .await
            .unwrap();

        let order = fx.storage.orders().find_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(order.customer_eta, at(10, 20));
    }

    #[tokio::test]
    async fn late_driver_with_free_slot_gets_a_five_minute_shift() {
        let fx = fixture();
        let (order_id, reservation_id, customer_id) = seed(&fx).await;
        let mut stream = fx.hub.attach(customer_id);

        // ETA = 10:11 + 19 + 20 = 10:50, well past the 15-minute margin.
        let outcome = fx
            .coordinator
            .report_lateness(reservation_id, order_id, 20)
            .await
            .unwrap();

        match outcome {
            LatenessOutcome::Shifted { order, reservation } => {
                assert_eq!(order.customer_eta, at(10, 50));
                assert_eq!(reservation.window.end, at(10, 35));
            }
            other => panic!("expected Shifted, got {:?}", other),
        }

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        match stream.next_event().await.unwrap().event {
            Event::ReservationShiftSuccess(e) => {
                assert_eq!(e.reservation_id, reservation_id);
                assert_eq!(e.new_end, at(10, 35));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn late_driver_with_taken_slot_keeps_the_old_end() {
        let fx = fixture();
        let (order_id, reservation_id, customer_id) = seed(&fx).await;
        // Conflicting booking inside [10:30, 10:35).
        ReservationRepository::create(
            fx.storage.as_ref(),
            NewReservation {
                order_id: 0,
                charger_id: 7,
                window: win(10, 32, 11, 0),
            },
        )
        .await
        .unwrap();

        let mut stream = fx.hub.attach(customer_id);

        let outcome = fx
            .coordinator
            .report_lateness(reservation_id, order_id, 20)
            .await
            .unwrap();

        match outcome {
            LatenessOutcome::ShiftRejected { order, reservation } => {
                // The ETA update still went through.
                assert_eq!(order.customer_eta, at(10, 50));
                assert_eq!(reservation.window.end, at(10, 30));
            }
            other => panic!("expected ShiftRejected, got {:?}", other),
        }

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        assert_eq!(
            stream.next_event().await.unwrap().event.event_type(),
            "reservation_shift_not_allowed"
        );
    }

    #[tokio::test]
    async fn retrying_the_same_report_is_idempotent_up_to_the_conflict_guard() {
        let fx = fixture();
        let (order_id, reservation_id, _) = seed(&fx).await;

        let first = fx
            .coordinator
            .report_lateness(reservation_id, order_id, 20)
            .await
            .unwrap();
        let LatenessOutcome::Shifted { .. } = first else {
            panic!("expected Shifted");
        };

        // Same report again: same ETA, and the fixed-step shift extends
        // from the already-shifted end, guarded by the same conflict check.
        let second = fx
            .coordinator
            .report_lateness(reservation_id, order_id, 20)
            .await
            .unwrap();
        match second {
            LatenessOutcome::Shifted { order, .. } => {
                assert_eq!(order.customer_eta, at(10, 50));
            }
            other => panic!("expected Shifted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_reservation_is_a_lookup_failure() {
        let fx = fixture();
        let err = fx
            .coordinator
            .report_lateness(999, 999, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
