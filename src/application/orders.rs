//! Order placement and food status tracking
//!
//! An order is always created together with its charger reservation: the
//! service asks the conflict resolver for a free charger at the requested
//! station and books both in one transaction. Food status advances
//! monotonically and every change is pushed to the owning customer.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tracing::info;

use crate::application::scheduling::ConflictResolver;
use crate::domain::{
    DomainError, DomainResult, FoodStatus, NewOrder, Order, RepositoryProvider, Reservation,
    TimeWindow,
};
use crate::notifications::{
    events::{Event, FoodStatusEvent},
    SharedNotificationHub,
};

/// Fallback offsets when the client does not supply explicit times:
/// the driver is assumed ~30 minutes out, and a reservation slot is
/// 30 minutes long.
const DEFAULT_ETA_OFFSET_MIN: i64 = 30;
const DEFAULT_RESERVATION_MIN: i64 = 30;

/// A new order as requested by the client.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub station_id: i64,
    pub total_price: f64,
    pub customer_eta: Option<DateTime<Utc>>,
    pub reservation_start: Option<DateTime<Utc>>,
    pub reservation_end: Option<DateTime<Utc>>,
}

fn food_status_message(status: FoodStatus) -> &'static str {
    match status {
        FoodStatus::Pending => "Your meal is not being cooked yet.",
        FoodStatus::Cooking => "Your meal is now being cooked.",
        FoodStatus::Ready => "Your meal is ready.",
        FoodStatus::PickedUp => "Your meal was successfully picked up.",
    }
}

pub struct OrderService {
    repos: Arc<dyn RepositoryProvider>,
    resolver: Arc<ConflictResolver>,
    hub: SharedNotificationHub,
}

impl OrderService {
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

    /// Place an order with its charger reservation.
    ///
    /// Picks the lowest-numbered free charger at the station for the
    /// requested window; a fully booked station is a `Conflict`.
    pub async fn place_order(&self, request: PlaceOrder) -> DomainResult<(Order, Reservation)> {
        let now = Utc::now();
        let eta = request
            .customer_eta
            .unwrap_or_else(|| now + Duration::minutes(DEFAULT_ETA_OFFSET_MIN));
        let start = request.reservation_start.unwrap_or(eta);
        let end = request
            .reservation_end
            .unwrap_or_else(|| start + Duration::minutes(DEFAULT_RESERVATION_MIN));
        let window = TimeWindow::new(start, end)?;

        let free = self
            .resolver
            .available_chargers(request.station_id, &window)
            .await?;
        let Some(charger) = free.first() else {
            return Err(DomainError::Conflict(format!(
                "no charger free at station {} between {} and {}",
                request.station_id, window.start, window.end
            )));
        };

        let (order, reservation) = self
            .repos
            .orders()
            .create_with_reservation(
                NewOrder {
                    customer_id: request.customer_id,
                    restaurant_id: request.restaurant_id,
                    total_price: request.total_price,
                    customer_eta: eta,
                },
                charger.id,
                window,
            )
            .await?;

        info!(
            order_id = order.id,
            reservation_id = reservation.id,
            charger_id = charger.id,
            "Order placed with reservation"
        );
        counter!("orders_placed_total").increment(1);

        Ok((order, reservation))
    }

    /// Advance the food status and push the change to the customer.
    ///
    /// Regressions (e.g. ready back to cooking) are `InvalidState`;
    /// re-sending the current status is allowed so retries stay cheap.
    pub async fn update_food_status(
        &self,
        order_id: i64,
        status: FoodStatus,
    ) -> DomainResult<Order> {
        let order = self
            .repos
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", "id", order_id))?;

        if !order.food_status.can_advance_to(status) {
            return Err(DomainError::InvalidState(format!(
                "food status cannot go back from {} to {}",
                order.food_status, status
            )));
        }

        let updated = self.repos.orders().update_status(order_id, status).await?;

        self.hub.publish(
            updated.customer_id,
            Event::FoodStatus(FoodStatusEvent {
                order_id,
                status,
                message: food_status_message(status).to_string(),
                time: Utc::now(),
            }),
        );

        Ok(updated)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scheduling::SchedulingPolicy;
    use crate::domain::Charger;
    use crate::infrastructure::storage::MemoryStorage;
    use crate::notifications::NotificationHub;
    use chrono::TimeZone;
    use std::time::Duration as StdDuration;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 10, h, m, 0).unwrap()
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        hub: SharedNotificationHub,
        service: OrderService,
    }

    async fn fixture(charger_ids: &[i64]) -> Fixture {
        let storage = MemoryStorage::shared();
        let hub = Arc::new(NotificationHub::new(StdDuration::from_secs(5)));
        let resolver = Arc::new(ConflictResolver::new(
            storage.clone(),
            SchedulingPolicy::default(),
        ));
        for &id in charger_ids {
            storage
                .chargers()
                .save(Charger {
                    id,
                    station_id: 1,
                    connector_type: "Type2".to_string(),
                    max_power_kw: 22.0,
                })
                .await
                .unwrap();
        }
        let service = OrderService::new(storage.clone(), resolver, hub.clone());
        Fixture {
            storage,
            hub,
            service,
        }
    }

    fn request(window: (DateTime<Utc>, DateTime<Utc>)) -> PlaceOrder {
        PlaceOrder {
            customer_id: 42,
            restaurant_id: 3,
            station_id: 1,
            total_price: 31.90,
            customer_eta: Some(window.0),
            reservation_start: Some(window.0),
            reservation_end: Some(window.1),
        }
    }

    #[tokio::test]
    async fn places_order_on_a_free_charger() {
        let fx = fixture(&[5, 6]).await;

        let (order, reservation) = fx
            .service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();

        assert_eq!(order.food_status, FoodStatus::Pending);
        assert_eq!(reservation.order_id, order.id);
        assert_eq!(reservation.charger_id, 5);

        // Second order in the same window lands on the other charger.
        let (_, second) = fx
            .service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();
        assert_eq!(second.charger_id, 6);
    }

    #[tokio::test]
    async fn fully_booked_station_is_a_conflict() {
        let fx = fixture(&[5]).await;
        fx.service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();

        let err = fx
            .service
            .place_order(request((at(12, 10), at(12, 40))))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn back_to_back_window_reuses_the_charger() {
        let fx = fixture(&[5]).await;
        fx.service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();

        let (_, reservation) = fx
            .service
            .place_order(request((at(12, 30), at(13, 0))))
            .await
            .unwrap();
        assert_eq!(reservation.charger_id, 5);
    }

    #[tokio::test]
    async fn food_status_advances_and_notifies() {
        let fx = fixture(&[5]).await;
        let (order, _) = fx
            .service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();

        let mut stream = fx.hub.attach(42);

        let updated = fx
            .service
            .update_food_status(order.id, FoodStatus::Cooking)
            .await
            .unwrap();
        assert_eq!(updated.food_status, FoodStatus::Cooking);

        assert_eq!(stream.next_event().await.unwrap().event.event_type(), "connected");
        match stream.next_event().await.unwrap().event {
            Event::FoodStatus(e) => {
                assert_eq!(e.status, FoodStatus::Cooking);
                assert_eq!(e.message, "Your meal is now being cooked.");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn food_status_never_regresses() {
        let fx = fixture(&[5]).await;
        let (order, _) = fx
            .service
            .place_order(request((at(12, 0), at(12, 30))))
            .await
            .unwrap();

        fx.service
            .update_food_status(order.id, FoodStatus::Ready)
            .await
            .unwrap();

        let err = fx
            .service
            .update_food_status(order.id, FoodStatus::Cooking)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let stored = fx.storage.orders().find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.food_status, FoodStatus::Ready);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let fx = fixture(&[]).await;
        let err = fx
            .service
            .update_food_status(12345, FoodStatus::Cooking)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
