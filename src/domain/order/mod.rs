//! Order aggregate

pub mod model;
pub mod repository;

pub use model::{FoodStatus, NewOrder, Order};
pub use repository::OrderRepository;
