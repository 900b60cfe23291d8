//! Charging DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One charge-update from a charger device
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChargingUpdateRequest {
    pub charger_id: i64,
    /// Current state of charge, percent
    #[validate(range(min = 0.0, max = 100.0))]
    pub current_soc: f64,
    #[validate(range(min = 0.0))]
    pub cumulative_price_of_charge: f64,
    #[validate(range(min = 0.0))]
    pub cumulative_power: f64,
}

/// Driver request to finish charging and pay
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FinishChargingRequest {
    pub charger_id: i64,
}

/// Request to start a simulated charger device
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SimulateChargingRequest {
    pub charger_id: i64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub current_soc: f64,
    /// SoC percent gained per tick
    #[validate(range(min = 0.1, max = 100.0))]
    pub rate_of_charge: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub desired_soc: f64,
}

/// Plain confirmation message
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
