//! Charging session engine
//!
//! Tracks the live charging session per charger. A charge-update for a
//! charger with no session opens one (and tells the driver); each update
//! persists the device's snapshot onto the reservation covering now and
//! re-arms the idle timer; a gap longer than the idle window completes
//! the session automatically.
//!
//! Sessions are keyed by charger id and serialized per key: updates for
//! the same charger never interleave, updates for different chargers are
//! independent. Idle timers carry the generation they were armed for and
//! self-discard when the session has moved on, so a stale timer can never
//! finish a newer session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use metrics::counter;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{ChargeSnapshot, DomainError, DomainResult, RepositoryProvider, Reservation};
use crate::notifications::{
    events::{ChargingPaidEvent, ChargingProgressEvent, ChargingStartedEvent, ChargingStoppedEvent, Event},
    SharedNotificationHub,
};

struct ChargingSession {
    driver_id: i64,
    generation: u64,
    idle_timer: JoinHandle<()>,
}

pub struct ChargingSessionEngine {
    repos: Arc<dyn RepositoryProvider>,
    hub: SharedNotificationHub,
    sessions: DashMap<i64, ChargingSession>,
    /// Per-charger serialization: one writer per key at a time.
    lanes: DashMap<i64, Arc<Mutex<()>>>,
    generation_seq: AtomicU64,
    idle_timeout: Duration,
}

impl ChargingSessionEngine {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        hub: SharedNotificationHub,
        idle_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            repos,
            hub,
            sessions: DashMap::new(),
            lanes: DashMap::new(),
            generation_seq: AtomicU64::new(0),
            idle_timeout,
        })
    }

    fn lane(&self, charger_id: i64) -> Arc<Mutex<()>> {
        self.lanes
            .entry(charger_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Whether a session is currently live on this charger.
    pub fn is_charging(&self, charger_id: i64) -> bool {
        self.sessions.contains_key(&charger_id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Apply one charge-update from a charger.
    ///
    /// Persists the snapshot onto the reservation whose window covers now
    /// (no covering window is `InvalidState` - charging without an active
    /// reservation is not a valid state), opens the session on the first
    /// update, and re-arms the idle timer.
    pub async fn start_or_update(
        self: &Arc<Self>,
        charger_id: i64,
        snapshot: ChargeSnapshot,
    ) -> DomainResult<Reservation> {
        let lane = self.lane(charger_id);
        let _guard = lane.lock().await;

        let now = Utc::now();
        let reservation = self
            .repos
            .reservations()
            .record_charging(charger_id, &snapshot, now)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidState(format!(
                    "charge update for charger {} with no reservation window covering now",
                    charger_id
                ))
            })?;

        // Read the session owner without holding the map entry across the
        // driver lookup await below.
        let current_driver = self.sessions.get(&charger_id).map(|s| s.driver_id);
        let (driver_id, started) = match current_driver {
            Some(driver) => (driver, false),
            None => {
                let driver = self
                    .repos
                    .reservations()
                    .find_driver_for_charger(charger_id, now)
                    .await?
                    .ok_or_else(|| {
                        DomainError::InvalidState(format!(
                            "active reservation on charger {} has no owning driver",
                            charger_id
                        ))
                    })?;
                (driver, true)
            }
        };

        // Cancel-and-reschedule: the replaced timer is aborted, and its
        // generation is already stale should the abort lose the race.
        let generation = self.generation_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let idle_timer = self.arm_idle_timer(charger_id, generation);
        if let Some(previous) = self.sessions.insert(
            charger_id,
            ChargingSession {
                driver_id,
                generation,
                idle_timer,
            },
        ) {
            previous.idle_timer.abort();
        }

        if started {
            info!(charger_id, driver_id, "Charging session started");
            counter!("charging_sessions_started_total").increment(1);
            self.hub.publish(
                driver_id,
                Event::ChargingStarted(ChargingStartedEvent {
                    charger_id,
                    time: now,
                }),
            );
        }

        counter!("charging_updates_total").increment(1);
        self.hub.publish(
            driver_id,
            Event::ChargingProgress(ChargingProgressEvent {
                reservation: reservation.clone(),
                time: now,
            }),
        );

        Ok(reservation)
    }

    /// Driver explicitly finishes charging: the session ends, the payment
    /// time is stamped on the active reservation, and the driver is told
    /// the charge was paid.
    pub async fn end_charging(&self, charger_id: i64) -> DomainResult<Reservation> {
        let lane = self.lane(charger_id);
        let _guard = lane.lock().await;

        let Some((_, session)) = self.sessions.remove(&charger_id) else {
            return Err(DomainError::InvalidState(format!(
                "no active charging session on charger {}",
                charger_id
            )));
        };
        session.idle_timer.abort();

        let now = Utc::now();
        let reservation = self
            .repos
            .reservations()
            .set_time_of_payment(charger_id, now)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidState(format!(
                    "no reservation window covering now on charger {}",
                    charger_id
                ))
            })?;

        info!(charger_id, driver_id = session.driver_id, "Charging finished by driver");
        counter!("charging_sessions_completed_total", "reason" => "driver_stop").increment(1);
        self.hub.publish(
            session.driver_id,
            Event::ChargingPaid(ChargingPaidEvent {
                charger_id,
                time: now,
            }),
        );

        Ok(reservation)
    }

    fn arm_idle_timer(self: &Arc<Self>, charger_id: i64, generation: u64) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        let timeout = self.idle_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            engine.complete_idle(charger_id, generation).await;
        })
    }

    /// Idle-timer callback. A normal completion, not an error; the timer
    /// is not re-armed.
    async fn complete_idle(&self, charger_id: i64, generation: u64) {
        let lane = self.lane(charger_id);
        let _guard = lane.lock().await;

        let driver_id = match self.sessions.get(&charger_id) {
            Some(session) if session.generation == generation => session.driver_id,
            Some(_) => {
                debug!(charger_id, generation, "Stale idle timer discarded");
                return;
            }
            None => return,
        };

        self.sessions.remove(&charger_id);
        info!(charger_id, driver_id, "Charging session completed after idle window");
        counter!("charging_sessions_completed_total", "reason" => "idle").increment(1);
        self.hub.publish(
            driver_id,
            Event::ChargingStopped(ChargingStoppedEvent {
                charger_id,
                time: Utc::now(),
            }),
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Charger, NewOrder, TimeWindow};
    use crate::infrastructure::storage::MemoryStorage;
    use crate::notifications::NotificationHub;
    use chrono::Duration as ChronoDuration;

    const IDLE: Duration = Duration::from_secs(3);

    struct Fixture {
        storage: Arc<MemoryStorage>,
        hub: SharedNotificationHub,
        engine: Arc<ChargingSessionEngine>,
    }

    /// Charger 7, order for customer 42, reservation covering now.
    async fn fixture() -> Fixture {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(Duration::from_secs(600)));
        let engine = ChargingSessionEngine::new(storage.clone(), hub.clone(), IDLE);

        storage
            .chargers()
            .save(Charger {
                id: 7,
                station_id: 1,
                connector_type: "CCS".to_string(),
                max_power_kw: 150.0,
            })
            .await
            .unwrap();

        let now = Utc::now();
        storage
            .orders()
            .create_with_reservation(
                NewOrder {
                    customer_id: 42,
                    restaurant_id: 1,
                    total_price: 18.0,
                    customer_eta: now,
                },
                7,
                TimeWindow::new(now - ChronoDuration::minutes(5), now + ChronoDuration::minutes(55))
                    .unwrap(),
            )
            .await
            .unwrap();

        Fixture { storage, hub, engine }
    }

    fn snapshot(soc: f64) -> ChargeSnapshot {
        ChargeSnapshot {
            current_soc: soc,
            cumulative_price_of_charge: soc / 10.0,
            cumulative_power: soc * 2.0,
        }
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_update_opens_the_session_and_notifies_once() {
        let fx = fixture().await;
        let mut stream = fx.hub.attach(42);

        let reservation = fx.engine.start_or_update(7, snapshot(35.0)).await.unwrap();
        assert_eq!(reservation.current_soc, Some(35.0));
        assert!(fx.engine.is_charging(7));

        fx.engine.start_or_update(7, snapshot(40.0)).await.unwrap();

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_started");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_progress");
        // Second update: progress only, no second "started".
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_progress");
    }

    #[tokio::test(start_paused = true)]
    async fn updates_persist_the_snapshot_on_the_covering_reservation() {
        let fx = fixture().await;
        fx.engine.start_or_update(7, snapshot(50.0)).await.unwrap();

        let stored = fx
            .storage
            .reservations()
            .find_by_order(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_soc, Some(50.0));
        assert_eq!(stored.cumulative_power, Some(100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn update_without_a_covering_reservation_is_rejected() {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(Duration::from_secs(600)));
        let engine = ChargingSessionEngine::new(storage.clone(), hub, IDLE);

        let err = engine.start_or_update(99, snapshot(10.0)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(!engine.is_charging(99));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gap_completes_the_session() {
        let fx = fixture().await;
        let mut stream = fx.hub.attach(42);

        fx.engine.start_or_update(7, snapshot(35.0)).await.unwrap();

        tokio::time::advance(IDLE + Duration::from_millis(100)).await;
        settle().await;

        assert!(!fx.engine.is_charging(7));
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_started");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_progress");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_stopped");
    }

    #[tokio::test(start_paused = true)]
    async fn each_update_resets_the_idle_timer() {
        let fx = fixture().await;

        fx.engine.start_or_update(7, snapshot(35.0)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;

        fx.engine.start_or_update(7, snapshot(40.0)).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        // 4s since the first update, 2s since the second: still alive.
        assert!(fx.engine.is_charging(7));

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(!fx.engine.is_charging(7));
    }

    #[tokio::test(start_paused = true)]
    async fn driver_stop_stamps_payment_and_notifies() {
        let fx = fixture().await;
        let mut stream = fx.hub.attach(42);

        fx.engine.start_or_update(7, snapshot(80.0)).await.unwrap();
        let reservation = fx.engine.end_charging(7).await.unwrap();

        assert!(reservation.time_of_payment.is_some());
        assert!(!fx.engine.is_charging(7));

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_started");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_progress");
        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "charging_paid");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_without_a_session_is_invalid_state() {
        let fx = fixture().await;
        let err = fx.engine.end_charging(7).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn a_stale_timer_never_kills_the_next_session() {
        let fx = fixture().await;

        // First session, timer armed for t+3s.
        fx.engine.start_or_update(7, snapshot(30.0)).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;

        // Driver stops, then charging restarts; a new session (and
        // generation) now owns the charger.
        fx.engine.end_charging(7).await.unwrap();
        fx.engine.start_or_update(7, snapshot(31.0)).await.unwrap();

        // Past the first session's deadline: the new session survives.
        tokio::time::advance(Duration::from_secs(2) + Duration::from_millis(100)).await;
        settle().await;
        assert!(fx.engine.is_charging(7));

        // And it still times out on its own schedule.
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(!fx.engine.is_charging(7));
    }
}
