//! Business logic and use cases

pub mod charging;
pub mod eta;
pub mod orders;
pub mod scheduling;

pub use charging::{ChargeSimulator, ChargingSessionEngine};
pub use eta::{EtaCoordinator, LatenessOutcome};
pub use orders::OrderService;
pub use scheduling::{ConflictResolver, SchedulingPolicy};
