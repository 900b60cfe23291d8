//! REST API
//!
//! Thin binding over the application services: per-module handler/DTO
//! pairs, a shared `ApiState`, JWT auth middleware on everything under
//! `/api/v1`, and Swagger documentation at `/docs`.

pub mod common;
pub mod modules;
pub mod router;
pub mod state;

pub use router::create_api_router;
pub use state::ApiState;
