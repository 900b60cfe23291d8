//! SeaORM database wiring

pub mod entities;
pub mod migrator;
pub mod repositories;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://voltdine.db?mode=rwc`
    pub url: String,
}

/// Connect to the database.
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.url).await
}
