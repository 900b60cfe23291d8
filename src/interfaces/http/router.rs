//! API router with Swagger UI

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{auth_middleware, AuthState};
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::modules::{
    charging, health, metrics, notifications, orders, reservations,
};
use crate::interfaces::http::state::ApiState;

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::handlers::health_check,
        metrics::handlers::render_metrics,
        charging::handlers::update_charging,
        charging::handlers::finish_charging,
        charging::handlers::start_simulation,
        charging::handlers::stop_simulation,
        reservations::handlers::can_extend,
        reservations::handlers::report_lateness,
        reservations::handlers::available_chargers,
        orders::handlers::place_order,
        orders::handlers::update_food_status,
        notifications::handlers::notification_stream,
    ),
    components(schemas(
        ApiResponse<charging::dto::MessageResponse>,
        ApiResponse<reservations::dto::ReservationDto>,
        ApiResponse<reservations::dto::CanExtendResponse>,
        ApiResponse<reservations::dto::EtaResponse>,
        ApiResponse<Vec<reservations::dto::ChargerDto>>,
        ApiResponse<orders::dto::OrderDto>,
        ApiResponse<orders::dto::PlaceOrderResponse>,
        charging::dto::ChargingUpdateRequest,
        charging::dto::FinishChargingRequest,
        charging::dto::SimulateChargingRequest,
        charging::dto::MessageResponse,
        reservations::dto::ReservationDto,
        reservations::dto::CanExtendResponse,
        reservations::dto::EtaRequest,
        reservations::dto::EtaResponse,
        reservations::dto::ChargerDto,
        orders::dto::OrderDto,
        orders::dto::PlaceOrderRequest,
        orders::dto::PlaceOrderResponse,
        orders::dto::UpdateFoodStatusRequest,
        health::handlers::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Charging", description = "Charge updates and session control"),
        (name = "Reservations", description = "Availability, extension and lateness handling"),
        (name = "Orders", description = "Orders with their charger reservations"),
        (name = "Notifications", description = "Per-user push event stream"),
        (name = "Health", description = "Liveness"),
        (name = "Monitoring", description = "Metrics"),
    )
)]
struct ApiDoc;

/// Build the full API router.
///
/// Everything under `/api/v1` requires a bearer token; `/health`,
/// `/metrics` and the Swagger UI are public.
pub fn create_api_router(state: ApiState, auth_state: AuthState) -> Router {
    let protected = Router::new()
        .route("/charging", patch(charging::handlers::update_charging))
        .route("/charging/finish", post(charging::handlers::finish_charging))
        .route("/charging/simulate", post(charging::handlers::start_simulation))
        .route(
            "/charging/simulate/{charger_id}",
            delete(charging::handlers::stop_simulation),
        )
        .route(
            "/reservations/{reservation_id}/can-extend",
            get(reservations::handlers::can_extend),
        )
        .route("/reservations/eta", post(reservations::handlers::report_lateness))
        .route(
            "/stations/{station_id}/available-chargers",
            get(reservations::handlers::available_chargers),
        )
        .route("/orders", post(orders::handlers::place_order))
        .route("/orders/status", patch(orders::handlers::update_food_status))
        .route(
            "/notifications/stream",
            get(notifications::handlers::notification_stream),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
        .with_state(state.clone());

    let public = Router::new()
        .route("/health", get(health::handlers::health_check))
        .route("/metrics", get(metrics::handlers::render_metrics))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .nest("/api/v1", protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
