//! Simulated charger devices
//!
//! Stands in for the physical charger fleet: each started device ticks on
//! a fixed interval, raising its state of charge by `rate_of_charge` and
//! feeding the session engine through the same update channel a real
//! device would use. The loop exits when the target SoC is reached, the
//! device is removed, or the engine rejects an update (session window
//! gone) - a rejection ends the device, it is not fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::charging::ChargingSessionEngine;
use crate::domain::{ChargeSnapshot, DomainError};

/// Power added per tick, kWh.
const POWER_STEP: f64 = 10.0;
/// Price added per tick.
const PRICE_STEP: f64 = 1.0;

struct SimulatedDevice {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

pub struct ChargeSimulator {
    engine: Arc<ChargingSessionEngine>,
    devices: DashMap<i64, SimulatedDevice>,
    tick: Duration,
}

impl ChargeSimulator {
    pub fn new(engine: Arc<ChargingSessionEngine>, tick: Duration) -> Arc<Self> {
        Arc::new(Self {
            engine,
            devices: DashMap::new(),
            tick,
        })
    }

    /// Whether a simulated device is running on this charger.
    pub fn is_running(&self, charger_id: i64) -> bool {
        self.devices.contains_key(&charger_id)
    }

    /// Start (or restart) a simulated device on a charger.
    pub fn start(
        self: &Arc<Self>,
        charger_id: i64,
        start_soc: f64,
        rate_of_charge: f64,
        target_soc: f64,
    ) {
        let stop = Arc::new(AtomicBool::new(false));
        let simulator = Arc::clone(self);
        let flag = Arc::clone(&stop);

        info!(charger_id, start_soc, rate_of_charge, target_soc, "Simulated charger starting");

        let task = tokio::spawn(async move {
            let mut soc = start_soc;
            let mut power = 0.0;
            let mut price = 0.0;

            while soc < target_soc && !flag.load(Ordering::SeqCst) {
                soc = (soc + rate_of_charge).min(100.0);
                power += POWER_STEP;
                price += PRICE_STEP;

                let snapshot = ChargeSnapshot {
                    current_soc: soc,
                    cumulative_price_of_charge: price,
                    cumulative_power: power,
                };

                match simulator.engine.start_or_update(charger_id, snapshot).await {
                    Ok(_) => {}
                    Err(DomainError::InvalidState(reason)) => {
                        debug!(charger_id, %reason, "Charge update rejected, device exiting");
                        break;
                    }
                    Err(e) => {
                        warn!(charger_id, error = %e, "Charge update failed, device exiting");
                        break;
                    }
                }

                tokio::time::sleep(simulator.tick).await;
            }

            info!(charger_id, soc, "Simulated charger done");
            // Only clean up our own entry; a replacement stays.
            simulator
                .devices
                .remove_if(&charger_id, |_, d| Arc::ptr_eq(&d.stop, &flag));
        });

        if let Some((_, previous)) = self.devices.remove(&charger_id) {
            previous.stop.store(true, Ordering::SeqCst);
            previous.task.abort();
        }
        self.devices.insert(charger_id, SimulatedDevice { stop, task });
    }

    /// Remove a simulated device. Returns `false` when none was running.
    pub fn stop(&self, charger_id: i64) -> bool {
        match self.devices.remove(&charger_id) {
            Some((_, device)) => {
                device.stop.store(true, Ordering::SeqCst);
                device.task.abort();
                info!(charger_id, "Simulated charger removed");
                true
            }
            None => false,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewOrder, RepositoryProvider, TimeWindow};
    use crate::infrastructure::storage::MemoryStorage;
    use crate::notifications::NotificationHub;
    use chrono::{Duration as ChronoDuration, Utc};

    async fn fixture() -> (Arc<MemoryStorage>, Arc<ChargeSimulator>) {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(Duration::from_secs(600)));
        // Idle timeout far beyond the simulated run so it cannot interfere.
        let engine = ChargingSessionEngine::new(storage.clone(), hub, Duration::from_secs(600));
        let simulator = ChargeSimulator::new(engine, Duration::from_secs(1));

        let now = Utc::now();
        storage
            .orders()
            .create_with_reservation(
                NewOrder {
                    customer_id: 42,
                    restaurant_id: 1,
                    total_price: 12.0,
                    customer_eta: now,
                },
                7,
                TimeWindow::new(now - ChronoDuration::minutes(5), now + ChronoDuration::hours(2))
                    .unwrap(),
            )
            .await
            .unwrap();

        (storage, simulator)
    }

    #[tokio::test(start_paused = true)]
    async fn device_charges_to_the_target_and_removes_itself() {
        let (storage, simulator) = fixture().await;

        simulator.start(7, 50.0, 25.0, 100.0);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!simulator.is_running(7));
        let reservation = storage
            .reservations()
            .find_by_order(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reservation.current_soc, Some(100.0));
        // Two ticks: 50 -> 75 -> 100.
        assert_eq!(reservation.cumulative_power, Some(2.0 * POWER_STEP));
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_the_device_halts_updates() {
        let (storage, simulator) = fixture().await;

        simulator.start(7, 0.0, 1.0, 100.0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(simulator.is_running(7));

        assert!(simulator.stop(7));
        let soc_at_stop = storage
            .reservations()
            .find_by_order(1)
            .await
            .unwrap()
            .unwrap()
            .current_soc;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let soc_later = storage
            .reservations()
            .find_by_order(1)
            .await
            .unwrap()
            .unwrap()
            .current_soc;
        assert_eq!(soc_at_stop, soc_later);
        assert!(!simulator.stop(7));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_update_ends_the_device_quietly() {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(Duration::from_secs(600)));
        let engine = ChargingSessionEngine::new(storage.clone(), hub, Duration::from_secs(600));
        let simulator = ChargeSimulator::new(engine, Duration::from_secs(1));

        // No reservation anywhere: the first update is rejected.
        simulator.start(3, 10.0, 5.0, 80.0);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!simulator.is_running(3));
    }
}
