//! Prometheus metrics endpoint

use axum::extract::State;

use crate::interfaces::http::state::ApiState;

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Monitoring",
    responses((status = 200, description = "Prometheus text exposition", content_type = "text/plain"))
)]
pub async fn render_metrics(State(state): State<ApiState>) -> String {
    state.prometheus.render()
}
