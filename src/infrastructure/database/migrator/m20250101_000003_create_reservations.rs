//! Create reservations table
//!
//! One row per order; the half-open `[reservation_start, reservation_end)`
//! window drives all conflict checks, so both bounds are indexed together
//! with the charger.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_chargers::Chargers;
use super::m20250101_000002_create_orders::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::OrderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Reservations::ChargerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::ReservationStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::ReservationEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::TimeOfPayment).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::CurrentSoc).double())
                    .col(ColumnDef::new(Reservations::CumulativePriceOfCharge).double())
                    .col(ColumnDef::new(Reservations::CumulativePower).double())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_order")
                            .from(Reservations::Table, Reservations::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_charger")
                            .from(Reservations::Table, Reservations::ChargerId)
                            .to(Chargers::Table, Chargers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_order")
                    .table(Reservations::Table)
                    .col(Reservations::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_charger_window")
                    .table(Reservations::Table)
                    .col(Reservations::ChargerId)
                    .col(Reservations::ReservationStart)
                    .col(Reservations::ReservationEnd)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    OrderId,
    ChargerId,
    ReservationStart,
    ReservationEnd,
    CreatedAt,
    TimeOfPayment,
    CurrentSoc,
    CumulativePriceOfCharge,
    CumulativePower,
}
