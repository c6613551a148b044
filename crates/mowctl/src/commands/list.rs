//! `list` handler: mowers paired with the account.

use tabled::Tabled;
use tracing::warn;

use mowctl_core::{DeviceApi, MowerSummary};

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MowerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
}

impl From<&MowerSummary> for MowerRow {
    fn from(m: &MowerSummary) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            model: m.model.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let mut device = session.device()?;
    let mowers = device.mowers(&session.credentials).await?;

    if !session.use_token {
        if let Err(e) = device.logout().await {
            warn!(error = %e, "logout failed");
        }
    }

    let out = output::render_list(&global.output, &mowers, |m| MowerRow::from(m), |m| m.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
