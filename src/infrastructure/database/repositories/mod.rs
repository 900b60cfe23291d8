//! SeaORM repository implementations

pub mod charger_repository;
pub mod order_repository;
pub mod repository_provider;
pub mod reservation_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use crate::domain::DomainError;

/// Map a database error into the domain taxonomy.
pub(crate) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Validation(format!("Database error: {}", e))
}
