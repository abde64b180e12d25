//! Standalone deadline-alert daemon: loads configuration, connects the
//! database pool, and runs the alert scheduler until interrupted.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use docroute_core::alerts::{AlertScheduler, DeadlineAlertProcessor};
use docroute_core::config::DocRouteConfig;
use docroute_core::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config_path = std::env::args().nth(1);
    let config = DocRouteConfig::load(config_path.as_deref())
        .context("failed to load configuration")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let processor = DeadlineAlertProcessor::new(pool, config.alerts.clone());
    let scheduler = AlertScheduler::new(processor, config.alerts.clone());
    scheduler.start().context("failed to start alert scheduler")?;

    info!(
        interval_minutes = config.alerts.interval_minutes,
        "Alert daemon running; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    scheduler.stop();
    info!("Alert daemon shut down");

    Ok(())
}
