//! # Voltdine Reservation & Charging Service
//!
//! Backend for combined EV-charging + food-pickup visits: drivers reserve
//! a charger at a station together with a food order, charge while they
//! eat, and get state changes pushed over an open stream.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, types and traits
//! - **application**: Business logic - conflict resolution, ETA
//!   coordination, the charging session engine and order flow
//! - **infrastructure**: External concerns (database, storage backends)
//! - **notifications**: Per-user push event fan-out
//! - **interfaces**: REST API with Swagger documentation
//! - **auth**: JWT verification seam (token issuance is external)

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod notifications;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;

// Re-export notifications
pub use notifications::{create_notification_hub, Event, NotificationHub, SharedNotificationHub};
