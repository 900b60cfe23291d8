//! SeaORM implementation of OrderRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, NotSet, Set,
    TransactionTrait,
};

use super::db_err;
use super::reservation_repository::{model_to_domain as reservation_to_domain, new_to_active};
use crate::domain::order::{FoodStatus, NewOrder, Order, OrderRepository};
use crate::domain::reservation::{NewReservation, Reservation, TimeWindow};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::order;

pub struct SeaOrmOrderRepository {
    db: DatabaseConnection,
}

impl SeaOrmOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: order::Model) -> DomainResult<Order> {
    let food_status = FoodStatus::from_str(&m.food_status).ok_or_else(|| {
        DomainError::Validation(format!("unknown food status in store: {}", m.food_status))
    })?;
    Ok(Order {
        id: m.id,
        customer_id: m.customer_id,
        restaurant_id: m.restaurant_id,
        total_price: m.total_price,
        created_at: m.created_at,
        customer_eta: m.customer_eta,
        food_status,
    })
}

// ── OrderRepository impl ────────────────────────────────────────

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Order>> {
        let model = order::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn create_with_reservation(
        &self,
        new_order: NewOrder,
        charger_id: i64,
        window: TimeWindow,
    ) -> DomainResult<(Order, Reservation)> {
        debug!(
            "Creating order for customer {} with reservation on charger {}",
            new_order.customer_id, charger_id
        );

        let txn = self.db.begin().await.map_err(db_err)?;

        let order_model = order::ActiveModel {
            id: NotSet,
            customer_id: Set(new_order.customer_id),
            restaurant_id: Set(new_order.restaurant_id),
            total_price: Set(new_order.total_price),
            created_at: Set(Utc::now()),
            customer_eta: Set(new_order.customer_eta),
            food_status: Set(FoodStatus::Pending.as_str().to_string()),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let reservation_model = new_to_active(&NewReservation {
            order_id: order_model.id,
            charger_id,
            window,
        })
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        Ok((
            model_to_domain(order_model)?,
            reservation_to_domain(reservation_model)?,
        ))
    }

    async fn update_status(&self, id: i64, status: FoodStatus) -> DomainResult<Order> {
        let model = order::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Order", "id", id))?;

        let mut active = model.into_active_model();
        active.food_status = Set(status.as_str().to_string());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated)
    }

    async fn update_eta(&self, id: i64, eta: DateTime<Utc>) -> DomainResult<Order> {
        let model = order::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Order", "id", id))?;

        let mut active = model.into_active_model();
        active.customer_eta = Set(eta);
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated)
    }
}
