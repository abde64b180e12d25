//! # Configuration
//!
//! Typed process configuration loaded from an optional TOML file overlaid
//! with `DOCROUTE_`-prefixed environment variables. Nothing in the engine
//! reads thresholds or intervals from anywhere else.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::alerts::classify::AlertThresholds;
use crate::error::{DocRouteError, Result};

/// Deadline alert processor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Whether the periodic scheduler runs at all
    pub enabled: bool,
    /// Run one tick immediately at scheduler start
    pub run_on_startup: bool,
    /// Minutes between scheduled ticks
    pub interval_minutes: u64,
    /// A stage is "due soon" within this many hours before its due date
    pub reminder_window_hours: i64,
    /// A stage escalates this many hours after its due date passed
    pub escalation_threshold_hours: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_on_startup: false,
            interval_minutes: 10,
            reminder_window_hours: 24,
            escalation_threshold_hours: 24,
        }
    }
}

impl AlertConfig {
    /// Thresholds in the form the classifier consumes
    pub fn thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            reminder_window: Duration::hours(self.reminder_window_hours),
            escalation_threshold: Duration::hours(self.escalation_threshold_hours),
        }
    }
}

/// Top-level process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocRouteConfig {
    pub database_url: String,
    #[serde(default)]
    pub alerts: AlertConfig,
}

impl Default for DocRouteConfig {
    fn default() -> Self {
        Self {
            database_url: "postgresql://localhost/docroute_development".to_string(),
            alerts: AlertConfig::default(),
        }
    }
}

impl DocRouteConfig {
    /// Load configuration from an optional TOML file plus the environment.
    ///
    /// Environment variables use the `DOCROUTE_` prefix with `__` as the
    /// nesting separator, e.g. `DOCROUTE_ALERTS__INTERVAL_MINUTES=5`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("database_url", DocRouteConfig::default().database_url)
            .map_err(|e| DocRouteError::Configuration(e.to_string()))?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("DOCROUTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DocRouteError::Configuration(e.to_string()))?;

        let config: DocRouteConfig = settings
            .try_deserialize()
            .map_err(|e| DocRouteError::Configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(DocRouteError::Configuration(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.alerts.interval_minutes == 0 {
            return Err(DocRouteError::Configuration(
                "alerts.interval_minutes must be positive".to_string(),
            ));
        }
        if self.alerts.reminder_window_hours < 0 || self.alerts.escalation_threshold_hours < 0 {
            return Err(DocRouteError::Configuration(
                "alert thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
