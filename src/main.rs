//! Voltdine service entrypoint
//!
//! Reads configuration from a TOML file
//! (`~/.config/voltdine/config.toml` by default, `VOLTDINE_CONFIG` to
//! override), wires the application services and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use voltdine::application::charging::{ChargeSimulator, ChargingSessionEngine};
use voltdine::application::eta::EtaCoordinator;
use voltdine::application::orders::OrderService;
use voltdine::application::scheduling::ConflictResolver;
use voltdine::auth::{AuthState, JwtConfig};
use voltdine::config::AppConfig;
use voltdine::domain::RepositoryProvider;
use voltdine::infrastructure::database::migrator::Migrator;
use voltdine::interfaces::http::ApiState;
use voltdine::notifications::NotificationHub;
use voltdine::shared::shutdown::ShutdownSignal;
use voltdine::{
    create_api_router, default_config_path, init_database, DatabaseConfig, SeaOrmRepositoryProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("VOLTDINE_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting Voltdine reservation & charging service...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    info!("Database: {}", db_config.url);

    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // ── Application services ───────────────────────────────────
    let hub = Arc::new(NotificationHub::new(Duration::from_secs(
        app_cfg.notifications.heartbeat_secs,
    )));
    let resolver = Arc::new(ConflictResolver::new(
        repos.clone(),
        app_cfg.scheduling.policy(),
    ));
    let engine = ChargingSessionEngine::new(
        repos.clone(),
        hub.clone(),
        Duration::from_secs(app_cfg.charging.idle_timeout_secs),
    );
    let simulator = ChargeSimulator::new(
        engine.clone(),
        Duration::from_secs(app_cfg.charging.simulator_tick_secs),
    );
    let eta = Arc::new(EtaCoordinator::new(
        repos.clone(),
        resolver.clone(),
        hub.clone(),
    ));
    let orders = Arc::new(OrderService::new(
        repos.clone(),
        resolver.clone(),
        hub.clone(),
    ));
    info!("Application services initialized");

    // ── HTTP API ───────────────────────────────────────────────
    let state = ApiState {
        repos,
        resolver,
        eta,
        engine,
        simulator,
        orders,
        hub,
        prometheus: prometheus_handle,
    };
    let auth_state = AuthState {
        jwt_config: JwtConfig {
            secret: app_cfg.security.jwt_secret.clone(),
            issuer: app_cfg.security.jwt_issuer.clone(),
            expiration_hours: 24,
        },
    };
    let router = create_api_router(state, auth_state);

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_os_signals();

    let addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API server listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    let graceful = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            graceful.wait().await;
            info!("REST API server received shutdown signal");
        })
        .await?;

    // ── Cleanup ────────────────────────────────────────────────
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("Voltdine service shutdown complete");
    Ok(())
}
