//! Create chargers table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chargers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chargers::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Chargers::StationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chargers::ConnectorType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Chargers::MaxPowerKw)
                            .double()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chargers_station")
                    .table(Chargers::Table)
                    .col(Chargers::StationId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chargers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Chargers {
    Table,
    Id,
    StationId,
    ConnectorType,
    MaxPowerKw,
}
