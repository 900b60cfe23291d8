//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::charger::ChargerRepository;
use crate::domain::order::OrderRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;

use super::charger_repository::SeaOrmChargerRepository;
use super::order_repository::SeaOrmOrderRepository;
use super::reservation_repository::SeaOrmReservationRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository
/// accessors.
pub struct SeaOrmRepositoryProvider {
    reservations: SeaOrmReservationRepository,
    orders: SeaOrmOrderRepository,
    chargers: SeaOrmChargerRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            reservations: SeaOrmReservationRepository::new(db.clone()),
            orders: SeaOrmOrderRepository::new(db.clone()),
            chargers: SeaOrmChargerRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn orders(&self) -> &dyn OrderRepository {
        &self.orders
    }

    fn chargers(&self) -> &dyn ChargerRepository {
        &self.chargers
    }
}
