//! Unified access to per-aggregate repositories

use crate::domain::charger::ChargerRepository;
use crate::domain::order::OrderRepository;
use crate::domain::reservation::ReservationRepository;

/// Provider of all repositories, implemented by the SeaORM-backed storage
/// and by the in-memory storage used for development and tests.
pub trait RepositoryProvider: Send + Sync {
    fn reservations(&self) -> &dyn ReservationRepository;
    fn orders(&self) -> &dyn OrderRepository;
    fn chargers(&self) -> &dyn ChargerRepository;
}
