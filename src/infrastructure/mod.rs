//! External concerns: database and alternative storage backends

pub mod database;
pub mod storage;

pub use database::repositories::SeaOrmRepositoryProvider;
pub use database::{init_database, DatabaseConfig};
