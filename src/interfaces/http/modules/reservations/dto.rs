//! Reservation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Charger, Reservation};

/// Reservation details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub reservation_id: i64,
    pub order_id: i64,
    pub charger_id: i64,
    pub reservation_start: DateTime<Utc>,
    pub reservation_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub time_of_payment: Option<DateTime<Utc>>,
    pub current_soc: Option<f64>,
    pub cumulative_price_of_charge: Option<f64>,
    pub cumulative_power: Option<f64>,
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_id: r.id,
            order_id: r.order_id,
            charger_id: r.charger_id,
            reservation_start: r.window.start,
            reservation_end: r.window.end,
            created_at: r.created_at,
            time_of_payment: r.time_of_payment,
            current_soc: r.current_soc,
            cumulative_price_of_charge: r.cumulative_price_of_charge,
            cumulative_power: r.cumulative_power,
        }
    }
}

/// Response of the extension eligibility check
#[derive(Debug, Serialize, ToSchema)]
pub struct CanExtendResponse {
    pub extension_allowed: bool,
}

/// Driver lateness report
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EtaRequest {
    pub reservation_id: i64,
    pub order_id: i64,
    /// Minutes the driver expects to be late (negative = early)
    #[validate(range(min = -120, max = 720))]
    pub lateness_in_minutes: i64,
}

/// Outcome of a lateness report
#[derive(Debug, Serialize, ToSchema)]
pub struct EtaResponse {
    /// `on_schedule`, `shift_rejected` or `shifted`
    pub status: String,
    pub order: super::super::orders::dto::OrderDto,
    pub reservation: ReservationDto,
}

/// Requested availability window
#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    /// Window start (inclusive), RFC 3339
    pub start: DateTime<Utc>,
    /// Window end (exclusive), RFC 3339
    pub end: DateTime<Utc>,
}

/// Charger details in availability responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ChargerDto {
    pub charger_id: i64,
    pub station_id: i64,
    pub connector_type: String,
    pub max_power_kw: f64,
}

impl From<Charger> for ChargerDto {
    fn from(c: Charger) -> Self {
        Self {
            charger_id: c.id,
            station_id: c.station_id,
            connector_type: c.connector_type,
            max_power_kw: c.max_power_kw,
        }
    }
}
