//! SeaORM entities

pub mod charger;
pub mod order;
pub mod reservation;
