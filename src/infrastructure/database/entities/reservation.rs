//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub order_id: i64,
    pub charger_id: i64,

    /// Half-open window `[reservation_start, reservation_end)`, UTC.
    pub reservation_start: DateTimeUtc,
    pub reservation_end: DateTimeUtc,

    pub created_at: DateTimeUtc,

    #[sea_orm(nullable)]
    pub time_of_payment: Option<DateTimeUtc>,

    /// Charging telemetry, absent until charging begins.
    #[sea_orm(nullable)]
    pub current_soc: Option<f64>,
    #[sea_orm(nullable)]
    pub cumulative_price_of_charge: Option<f64>,
    #[sea_orm(nullable)]
    pub cumulative_power: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::charger::Entity",
        from = "Column::ChargerId",
        to = "super::charger::Column::Id"
    )]
    Charger,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::charger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Charger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
