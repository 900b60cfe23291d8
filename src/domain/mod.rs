//! Core business entities, types and traits

pub mod charger;
pub mod error;
pub mod order;
pub mod repositories;
pub mod reservation;

pub use charger::{Charger, ChargerRepository};
pub use error::{DomainError, DomainResult};
pub use order::{FoodStatus, NewOrder, Order, OrderRepository};
pub use repositories::RepositoryProvider;
pub use reservation::{
    ChargeSnapshot, NewReservation, Reservation, ReservationRepository, TimeWindow,
};
