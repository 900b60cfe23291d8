//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::reservation::{
    ChargeSnapshot, NewReservation, Reservation, ReservationRepository, TimeWindow,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{order, reservation};

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_covering(
        &self,
        charger_id: i64,
        instant: DateTime<Utc>,
    ) -> DomainResult<Option<reservation::Model>> {
        reservation::Entity::find()
            .filter(reservation::Column::ChargerId.eq(charger_id))
            .filter(reservation::Column::ReservationStart.lte(instant))
            .filter(reservation::Column::ReservationEnd.gt(instant))
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        id: m.id,
        order_id: m.order_id,
        charger_id: m.charger_id,
        window: TimeWindow::new(m.reservation_start, m.reservation_end)?,
        created_at: m.created_at,
        time_of_payment: m.time_of_payment,
        current_soc: m.current_soc,
        cumulative_price_of_charge: m.cumulative_price_of_charge,
        cumulative_power: m.cumulative_power,
    })
}

pub(crate) fn new_to_active(new: &NewReservation) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: NotSet,
        order_id: Set(new.order_id),
        charger_id: Set(new.charger_id),
        reservation_start: Set(new.window.start),
        reservation_end: Set(new.window.end),
        created_at: Set(Utc::now()),
        time_of_payment: Set(None),
        current_soc: Set(None),
        cumulative_price_of_charge: Set(None),
        cumulative_power: Set(None),
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn create(&self, new: NewReservation) -> DomainResult<Reservation> {
        debug!("Creating reservation for order {}", new.order_id);
        let model = new_to_active(&new).insert(&self.db).await.map_err(db_err)?;
        model_to_domain(model)
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_order(&self, order_id: i64) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find()
            .filter(reservation::Column::OrderId.eq(order_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_overlapping(
        &self,
        charger_id: i64,
        window: &TimeWindow,
        exclude: Option<i64>,
    ) -> DomainResult<Vec<Reservation>> {
        // Half-open overlap: a.start < b.end AND b.start < a.end.
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::ChargerId.eq(charger_id))
            .filter(reservation::Column::ReservationStart.lt(window.end))
            .filter(reservation::Column::ReservationEnd.gt(window.start));
        if let Some(id) = exclude {
            query = query.filter(reservation::Column::Id.ne(id));
        }
        let models = query
            .order_by_asc(reservation::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn update_end(&self, id: i64, new_end: DateTime<Utc>) -> DomainResult<Reservation> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;

        // Keep the window invariant before touching the row.
        TimeWindow::new(model.reservation_start, new_end)?;

        debug!("Moving reservation {} end to {}", id, new_end);
        let mut active = model.into_active_model();
        active.reservation_end = Set(new_end);
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated)
    }

    async fn record_charging(
        &self,
        charger_id: i64,
        snapshot: &ChargeSnapshot,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>> {
        let Some(model) = self.find_covering(charger_id, now).await? else {
            return Ok(None);
        };

        let mut active = model.into_active_model();
        active.current_soc = Set(Some(snapshot.current_soc));
        active.cumulative_price_of_charge = Set(Some(snapshot.cumulative_price_of_charge));
        active.cumulative_power = Set(Some(snapshot.cumulative_power));
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated).map(Some)
    }

    async fn set_time_of_payment(
        &self,
        charger_id: i64,
        paid_at: DateTime<Utc>,
    ) -> DomainResult<Option<Reservation>> {
        let Some(model) = self.find_covering(charger_id, paid_at).await? else {
            return Ok(None);
        };

        debug!("Stamping payment time on reservation {}", model.id);
        let mut active = model.into_active_model();
        active.time_of_payment = Set(Some(paid_at));
        let updated = active.update(&self.db).await.map_err(db_err)?;
        model_to_domain(updated).map(Some)
    }

    async fn find_driver_for_charger(
        &self,
        charger_id: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<i64>> {
        let Some(model) = self.find_covering(charger_id, now).await? else {
            return Ok(None);
        };
        let owner = order::Entity::find_by_id(model.order_id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(owner.map(|o| o.customer_id))
    }
}
