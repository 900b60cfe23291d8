//! Order repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{FoodStatus, NewOrder, Order};
use crate::domain::reservation::{Reservation, TimeWindow};
use crate::domain::DomainResult;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find order by ID
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Order>>;

    /// Create the order together with its reservation in one transaction.
    /// An order never exists without its reservation.
    async fn create_with_reservation(
        &self,
        new_order: NewOrder,
        charger_id: i64,
        window: TimeWindow,
    ) -> DomainResult<(Order, Reservation)>;

    /// Set the food status. Fails with `NotFound` for an unknown id.
    /// Lifecycle rules are enforced by the order service, not here.
    async fn update_status(&self, id: i64, status: FoodStatus) -> DomainResult<Order>;

    /// Persist a recomputed customer ETA.
    async fn update_eta(&self, id: i64, eta: DateTime<Utc>) -> DomainResult<Order>;
}
