//! SeaORM implementation of ChargerRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::db_err;
use crate::domain::charger::{Charger, ChargerRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::charger;

pub struct SeaOrmChargerRepository {
    db: DatabaseConnection,
}

impl SeaOrmChargerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: charger::Model) -> Charger {
    Charger {
        id: m.id,
        station_id: m.station_id,
        connector_type: m.connector_type,
        max_power_kw: m.max_power_kw,
    }
}

#[async_trait]
impl ChargerRepository for SeaOrmChargerRepository {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Charger>> {
        let model = charger::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_station(&self, station_id: i64) -> DomainResult<Vec<Charger>> {
        let models = charger::Entity::find()
            .filter(charger::Column::StationId.eq(station_id))
            .order_by_asc(charger::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn save(&self, c: Charger) -> DomainResult<()> {
        let existing = charger::Entity::find_by_id(c.id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let active = charger::ActiveModel {
            id: Set(c.id),
            station_id: Set(c.station_id),
            connector_type: Set(c.connector_type),
            max_power_kw: Set(c.max_power_kw),
        };
        if existing.is_some() {
            active.update(&self.db).await.map_err(db_err)?;
        } else {
            active.insert(&self.db).await.map_err(db_err)?;
        }
        Ok(())
    }
}
