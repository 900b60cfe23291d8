//! Charging HTTP handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use crate::domain::ChargeSnapshot;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::reservations::dto::ReservationDto;
use crate::interfaces::http::state::ApiState;

use super::dto::*;

#[utoipa::path(
    patch,
    path = "/api/v1/charging",
    tag = "Charging",
    security(("bearer_auth" = [])),
    request_body = ChargingUpdateRequest,
    responses(
        (status = 200, description = "Update applied to the active reservation", body = ApiResponse<ReservationDto>),
        (status = 409, description = "No reservation window covering now")
    )
)]
pub async fn update_charging(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<ChargingUpdateRequest>,
) -> ApiResult<ReservationDto> {
    let snapshot = ChargeSnapshot {
        current_soc: request.current_soc,
        cumulative_price_of_charge: request.cumulative_price_of_charge,
        cumulative_power: request.cumulative_power,
    };

    match state.engine.start_or_update(request.charger_id, snapshot).await {
        Ok(reservation) => Ok(Json(ApiResponse::success(reservation.into()))),
        Err(e) => {
            warn!(charger_id = request.charger_id, error = %e, "Charge update rejected");
            Err(domain_error(e))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/charging/finish",
    tag = "Charging",
    security(("bearer_auth" = [])),
    request_body = FinishChargingRequest,
    responses(
        (status = 200, description = "Charging finished, payment time stamped", body = ApiResponse<ReservationDto>),
        (status = 409, description = "No active charging session")
    )
)]
pub async fn finish_charging(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<FinishChargingRequest>,
) -> ApiResult<ReservationDto> {
    // Tell the (simulated) device first so it stops feeding updates.
    state.simulator.stop(request.charger_id);

    match state.engine.end_charging(request.charger_id).await {
        Ok(reservation) => Ok(Json(ApiResponse::success(reservation.into()))),
        Err(e) => Err(domain_error(e)),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/charging/simulate",
    tag = "Charging",
    security(("bearer_auth" = [])),
    request_body = SimulateChargingRequest,
    responses(
        (status = 200, description = "Simulated device started", body = ApiResponse<MessageResponse>)
    )
)]
pub async fn start_simulation(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<SimulateChargingRequest>,
) -> ApiResult<MessageResponse> {
    state.simulator.start(
        request.charger_id,
        request.current_soc,
        request.rate_of_charge,
        request.desired_soc,
    );

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Simulated charger {} started", request.charger_id),
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/charging/simulate/{charger_id}",
    tag = "Charging",
    security(("bearer_auth" = [])),
    params(("charger_id" = i64, Path, description = "Charger to stop")),
    responses(
        (status = 200, description = "Simulated device removed", body = ApiResponse<MessageResponse>),
        (status = 404, description = "No simulated device on this charger")
    )
)]
pub async fn stop_simulation(
    State(state): State<ApiState>,
    Path(charger_id): Path<i64>,
) -> ApiResult<MessageResponse> {
    if state.simulator.stop(charger_id) {
        Ok(Json(ApiResponse::success(MessageResponse {
            message: format!("Simulated charger {} removed", charger_id),
        })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error(format!(
                "No simulated device on charger {}",
                charger_id
            ))),
        ))
    }
}
