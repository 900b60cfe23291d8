//! Shared state for all API handlers

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::charging::{ChargeSimulator, ChargingSessionEngine};
use crate::application::eta::EtaCoordinator;
use crate::application::orders::OrderService;
use crate::application::scheduling::ConflictResolver;
use crate::domain::RepositoryProvider;
use crate::notifications::SharedNotificationHub;

#[derive(Clone)]
pub struct ApiState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub resolver: Arc<ConflictResolver>,
    pub eta: Arc<EtaCoordinator>,
    pub engine: Arc<ChargingSessionEngine>,
    pub simulator: Arc<ChargeSimulator>,
    pub orders: Arc<OrderService>,
    pub hub: SharedNotificationHub,
    pub prometheus: PrometheusHandle,
}
