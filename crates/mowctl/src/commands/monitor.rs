//! `monitor` handler: run the supervisor in the foreground.

use std::time::Duration;

use tracing::info;

use crate::config::{Config, Session};
use crate::error::CliError;

pub async fn handle(session: &Session, cfg: &Config) -> Result<(), CliError> {
    let controller = session.spawn_supervisor(Duration::from_secs(cfg.defaults.poll_interval))?;
    info!(profile = %session.profile_name, "monitoring, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    info!("interrupted, stopping supervisor");
    controller.shutdown().await;
    Ok(())
}
