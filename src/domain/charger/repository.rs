//! Charger repository interface

use async_trait::async_trait;

use super::model::Charger;
use crate::domain::DomainResult;

#[async_trait]
pub trait ChargerRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Charger>>;

    /// All chargers installed at a station, ordered by id.
    async fn find_by_station(&self, station_id: i64) -> DomainResult<Vec<Charger>>;

    async fn save(&self, charger: Charger) -> DomainResult<()>;
}
