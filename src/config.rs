//! Configuration module
//!
//! Loaded from a TOML file (default `~/.config/voltdine/config.toml`).
//! Every scheduling/charging constant the service applies is configuration
//! with the reference policy as its default; none of them is derived.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::scheduling::SchedulingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub scheduling: SchedulingConfig,
    pub charging: ChargingConfig,
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voltdine")
        .join("config.toml")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite database file path
    pub path: String,
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path)
    }
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "voltdine.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Secret shared with the auth collaborator that signs tokens
    pub jwt_secret: String,
    pub jwt_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "super-secret-key-change-in-production".to_string(),
            jwt_issuer: "voltdine".to_string(),
        }
    }
}

/// Reservation scheduling policy (reference values as defaults)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Look-ahead checked before allowing an extension
    pub extend_lookahead_min: i64,
    /// How far one lateness-triggered shift moves `reservation_end`
    pub shift_step_min: i64,
    /// Nominal travel time added to `reservation_start` when recomputing
    /// an ETA from a lateness report
    pub eta_base_offset_min: i64,
    /// Margin past `reservation_start` within which a driver counts as
    /// on schedule
    pub on_schedule_threshold_min: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            extend_lookahead_min: 10,
            shift_step_min: 5,
            eta_base_offset_min: 19,
            on_schedule_threshold_min: 15,
        }
    }
}

impl SchedulingConfig {
    pub fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy {
            extend_lookahead: chrono::Duration::minutes(self.extend_lookahead_min),
            shift_step: chrono::Duration::minutes(self.shift_step_min),
            eta_base_offset: chrono::Duration::minutes(self.eta_base_offset_min),
            on_schedule_threshold: chrono::Duration::minutes(self.on_schedule_threshold_min),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// A session with no update for this long completes automatically
    pub idle_timeout_secs: u64,
    /// Interval between simulated charge ticks
    pub simulator_tick_secs: u64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 30,
            simulator_tick_secs: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Heartbeat interval on idle notification streams
    pub heartbeat_secs: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { heartbeat_secs: 5 }
    }
}

// ── Tests ──────────────────────────────────────────────────────
