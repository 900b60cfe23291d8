//! Order DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::Order;
use crate::interfaces::http::modules::reservations::dto::ReservationDto;

/// Order details in API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDto {
    pub order_id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub customer_eta: DateTime<Utc>,
    /// pending, cooking, ready or picked_up
    pub food_status: String,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        Self {
            order_id: o.id,
            customer_id: o.customer_id,
            restaurant_id: o.restaurant_id,
            total_price: o.total_price,
            created_at: o.created_at,
            customer_eta: o.customer_eta,
            food_status: o.food_status.as_str().to_string(),
        }
    }
}

/// Request to place an order with its charger reservation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    pub restaurant_id: i64,
    pub station_id: i64,
    #[validate(range(min = 0.0))]
    pub total_price: f64,
    /// Defaults to now + 30 minutes when omitted
    pub customer_eta: Option<DateTime<Utc>>,
    /// Defaults to the customer ETA when omitted
    pub reservation_start: Option<DateTime<Utc>>,
    /// Defaults to 30 minutes after the start when omitted
    pub reservation_end: Option<DateTime<Utc>>,
}

/// Response from placing an order
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub message: String,
    pub order: OrderDto,
    pub reservation: ReservationDto,
}

/// Request to advance the food status
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFoodStatusRequest {
    pub order_id: i64,
    /// pending, cooking, ready or picked_up
    pub food_status: String,
}
