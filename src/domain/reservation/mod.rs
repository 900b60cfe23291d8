//! Reservation aggregate

pub mod model;
pub mod repository;

pub use model::{ChargeSnapshot, NewReservation, Reservation, TimeWindow};
pub use repository::ReservationRepository;
