//! API modules, one directory per resource

pub mod charging;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod orders;
pub mod reservations;
