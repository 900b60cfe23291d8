//! Order HTTP handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::error;

use crate::application::orders::PlaceOrder;
use crate::auth::AuthUser;
use crate::domain::FoodStatus;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult};
use crate::interfaces::http::common::ValidatedJson;
use crate::interfaces::http::state::ApiState;

use super::dto::*;

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order and reservation created", body = ApiResponse<PlaceOrderResponse>),
        (status = 409, description = "No free charger at the station"),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn place_order(
    State(state): State<ApiState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(request): ValidatedJson<PlaceOrderRequest>,
) -> ApiResult<PlaceOrderResponse> {
    let placed = state
        .orders
        .place_order(PlaceOrder {
            customer_id: user.user_id,
            restaurant_id: request.restaurant_id,
            station_id: request.station_id,
            total_price: request.total_price,
            customer_eta: request.customer_eta,
            reservation_start: request.reservation_start,
            reservation_end: request.reservation_end,
        })
        .await;

    match placed {
        Ok((order, reservation)) => Ok(Json(ApiResponse::success(PlaceOrderResponse {
            message: "Order and reservation created successfully".to_string(),
            order: order.into(),
            reservation: reservation.into(),
        }))),
        Err(e) => {
            error!(customer_id = user.user_id, error = %e, "Order placement failed");
            Err(domain_error(e))
        }
    }
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/status",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = UpdateFoodStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderDto>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Status regression")
    )
)]
pub async fn update_food_status(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<UpdateFoodStatusRequest>,
) -> ApiResult<OrderDto> {
    let Some(status) = FoodStatus::from_str(&request.food_status) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Unknown food status: {}",
                request.food_status
            ))),
        ));
    };

    match state.orders.update_food_status(request.order_id, status).await {
        Ok(order) => Ok(Json(ApiResponse::success(order.into()))),
        Err(e) => Err(domain_error(e)),
    }
}
