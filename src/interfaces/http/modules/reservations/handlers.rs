//! Reservation HTTP handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::error;

use crate::application::eta::LatenessOutcome;
use crate::domain::TimeWindow;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::state::ApiState;

use super::dto::*;

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{reservation_id}/can-extend",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("reservation_id" = i64, Path, description = "Reservation to check")),
    responses(
        (status = 200, description = "Eligibility result", body = ApiResponse<CanExtendResponse>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn can_extend(
    State(state): State<ApiState>,
    Path(reservation_id): Path<i64>,
) -> ApiResult<CanExtendResponse> {
    match state.resolver.can_extend(reservation_id).await {
        Ok(extension_allowed) => Ok(Json(ApiResponse::success(CanExtendResponse {
            extension_allowed,
        }))),
        Err(e) => Err(domain_error(e)),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/eta",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = EtaRequest,
    responses(
        (status = 200, description = "Lateness handled", body = ApiResponse<EtaResponse>),
        (status = 404, description = "Reservation or order not found"),
        (status = 409, description = "Shift lost a commit race")
    )
)]
pub async fn report_lateness(
    State(state): State<ApiState>,
    ValidatedJson(request): ValidatedJson<EtaRequest>,
) -> ApiResult<EtaResponse> {
    let outcome = state
        .eta
        .report_lateness(
            request.reservation_id,
            request.order_id,
            request.lateness_in_minutes,
        )
        .await
        .map_err(|e| {
            error!(
                reservation_id = request.reservation_id,
                error = %e,
                "Lateness report failed"
            );
            domain_error(e)
        })?;

    let (status, order, reservation) = match outcome {
        LatenessOutcome::OnSchedule { order, reservation } => ("on_schedule", order, reservation),
        LatenessOutcome::ShiftRejected { order, reservation } => {
            ("shift_rejected", order, reservation)
        }
        LatenessOutcome::Shifted { order, reservation } => ("shifted", order, reservation),
    };

    Ok(Json(ApiResponse::success(EtaResponse {
        status: status.to_string(),
        order: order.into(),
        reservation: reservation.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{station_id}/available-chargers",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(
        ("station_id" = i64, Path, description = "Station to query"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Free chargers for the window", body = ApiResponse<Vec<ChargerDto>>),
        (status = 400, description = "Invalid window")
    )
)]
pub async fn available_chargers(
    State(state): State<ApiState>,
    Path(station_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Vec<ChargerDto>> {
    let window = TimeWindow::new(query.start, query.end).map_err(domain_error)?;

    match state.resolver.available_chargers(station_id, &window).await {
        Ok(free) => Ok(Json(ApiResponse::success(
            free.into_iter().map(ChargerDto::from).collect(),
        ))),
        Err(e) => Err(domain_error(e)),
    }
}
