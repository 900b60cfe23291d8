//! Conflict-free time-window scheduling for chargers

pub mod resolver;

pub use resolver::{ConflictResolver, SchedulingPolicy};
