//! In-memory storage implementation for development and testing

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::{
    Charger, ChargerRepository, ChargeSnapshot, DomainError, DomainResult, FoodStatus, NewOrder,
    NewReservation, Order, OrderRepository, RepositoryProvider, Reservation,
    ReservationRepository, TimeWindow,
};

/// DashMap-backed repository provider. State is lost on drop; the SeaORM
/// provider is the production backend.
pub struct MemoryStorage {
    reservations: DashMap<i64, Reservation>,
    orders: DashMap<i64, Order>,
    chargers: DashMap<i64, Charger>,
    reservation_seq: AtomicI64,
    order_seq: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            reservations: DashMap::new(),
            orders: DashMap::new(),
            chargers: DashMap::new(),
            reservation_seq: AtomicI64::new(1),
            order_seq: AtomicI64::new(1),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn next_reservation_id(&self) -> i64 {
        self.reservation_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn next_order_id(&self) -> i64 {
        self.order_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn covering_reservation(&self, charger_id: i64, now: DateTime<Utc>) -> Option<i64> {
        self.reservations
            .iter()
            .find(|r| r.charger_id == charger_id && r.window.covers(now))
            .map(|r| r.id)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for MemoryStorage {
    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn orders(&self) -> &dyn OrderRepository {
        self
    }

    fn chargers(&self) -> &dyn ChargerRepository {
        self
    }
}

#[async_trait]
impl ReservationRepository for MemoryStorage {
    async fn create(&self, new: NewReservation) -> DomainResult<Reservation> {
        let reservation = Reservation {
            id: self.next_reservation_id(),
            order_id: new.order_id,
            charger_id: new.charger_id,
            window: new.window,
            created_at: Utc::now(),
            time_of_payment: None,
            current_soc: None,
            cumulative_price_of_charge: None,
            cumulative_power: None,
        };
        self.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(&id).map(|r| r.clone()))
    }

    async fn find_by_order(&self, order_id: i64) -> DomainResult<Option<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .find(|r| r.order_id == order_id)
            .map(|r| r.clone()))
    }

    async fn find_overlapping(
        &self,
        charger_id: i64,
        window: &TimeWindow,
        exclude: Option<i64>,
    ) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| {
                r.charger_id == charger_id
                    && Some(r.id) != exclude
                    && r.window.overlaps(window)
            })
            .map(|r| r.clone())
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }

    async fn update_end(&self, id: i64, new_end: DateTime<Utc>) -> DomainResult<Reservation> {
        let mut reservation = self
            .reservations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
        reservation.window = TimeWindow::new(reservation.window.start, new_end)?;
        Ok(reservation.clone())
    }

    async fn record_charging(
        &self,
        charger_id: i64,
        snapshot: &ChargeSnapshot,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>> {
        let Some(id) = self.covering_reservation(charger_id, now) else {
            return Ok(None);
        };
        let Some(mut reservation) = self.reservations.get_mut(&id) else {
            return Ok(None);
        };
        reservation.current_soc = Some(snapshot.current_soc);
        reservation.cumulative_price_of_charge = Some(snapshot.cumulative_price_of_charge);
        reservation.cumulative_power = Some(snapshot.cumulative_power);
        Ok(Some(reservation.clone()))
    }

    async fn set_time_of_payment(
        &self,
        charger_id: i64,
        paid_at: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>> {
        let Some(id) = self.covering_reservation(charger_id, paid_at) else {
            return Ok(None);
        };
        let Some(mut reservation) = self.reservations.get_mut(&id) else {
            return Ok(None);
        };
        reservation.time_of_payment = Some(paid_at);
        Ok(Some(reservation.clone()))
    }

    async fn find_driver_for_charger(
        &self,
        charger_id: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<i64>> {
        let Some(id) = self.covering_reservation(charger_id, now) else {
            return Ok(None);
        };
        let Some(order_id) = self.reservations.get(&id).map(|r| r.order_id) else {
            return Ok(None);
        };
        Ok(self.orders.get(&order_id).map(|o| o.customer_id))
    }
}

#[async_trait]
impl OrderRepository for MemoryStorage {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.clone()))
    }

    async fn create_with_reservation(
        &self,
        new_order: NewOrder,
        charger_id: i64,
        window: TimeWindow,
    ) -> DomainResult<(Order, Reservation)> {
        let order = Order {
            id: self.next_order_id(),
            customer_id: new_order.customer_id,
            restaurant_id: new_order.restaurant_id,
            total_price: new_order.total_price,
            created_at: Utc::now(),
            customer_eta: new_order.customer_eta,
            food_status: FoodStatus::Pending,
        };
        self.orders.insert(order.id, order.clone());

        let reservation = ReservationRepository::create(
            self,
            NewReservation {
                order_id: order.id,
                charger_id,
                window,
            },
        )
        .await?;

        Ok((order, reservation))
    }

    async fn update_status(&self, id: i64, status: FoodStatus) -> DomainResult<Order> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Order", "id", id))?;
        order.food_status = status;
        Ok(order.clone())
    }

    async fn update_eta(&self, id: i64, eta: DateTime<Utc>) -> DomainResult<Order> {
        let mut order = self
            .orders
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Order", "id", id))?;
        order.customer_eta = eta;
        Ok(order.clone())
    }
}

#[async_trait]
impl ChargerRepository for MemoryStorage {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Charger>> {
        Ok(self.chargers.get(&id).map(|c| c.clone()))
    }

    async fn find_by_station(&self, station_id: i64) -> DomainResult<Vec<Charger>> {
        let mut found: Vec<Charger> = self
            .chargers
            .iter()
            .filter(|c| c.station_id == station_id)
            .map(|c| c.clone())
            .collect();
        found.sort_by_key(|c| c.id);
        Ok(found)
    }

    async fn save(&self, charger: Charger) -> DomainResult<()> {
        self.chargers.insert(charger.id, charger);
        Ok(())
    }
}
