//! Charger domain entity

use serde::{Deserialize, Serialize};

/// A physical charging point at a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charger {
    pub id: i64,
    /// Station this charger belongs to; availability queries group by it.
    pub station_id: i64,
    pub connector_type: String,
    pub max_power_kw: f64,
}
