//! `status` handler: print the first status the supervisor publishes.

use std::time::Duration;

use mowctl_core::StatusReport;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::config::{Config, ONE_SHOT_POLL, Session};
use crate::error::CliError;
use crate::output;

/// Key/value view of a report for table output.
pub fn detail(report: &StatusReport) -> String {
    let mut pairs = vec![("Status", report.status.to_string())];
    if let Some(ref snap) = report.snapshot {
        pairs.push(("Code", snap.status_code.clone()));
        if let Some(battery) = snap.battery_percent {
            pairs.push(("Battery", format!("{battery}%")));
        }
        if let Some(pos) = snap.position {
            pairs.push(("Position", format!("{:.6}, {:.6}", pos.latitude, pos.longitude)));
        }
        if let Some(ref fault) = snap.last_error {
            let at = fault.at.map_or_else(
                || "unknown time".into(),
                |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            pairs.push(("Last error", format!("{} at {at}", fault.code)));
        }
        if let Some(at) = snap.reported_at {
            pairs.push(("Reported", at.format("%Y-%m-%d %H:%M:%S UTC").to_string()));
        }
    }
    if let Some(command) = report.pending_command {
        pairs.push(("Pending", command.to_string()));
    }
    output::detail_block(&pairs)
}

pub async fn handle(
    args: StatusArgs,
    session: &Session,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let seconds = args.timeout.unwrap_or(cfg.defaults.timeout);

    let controller = session.spawn_supervisor(ONE_SHOT_POLL)?;
    let report = controller.report(Duration::from_secs(seconds)).await;
    controller.shutdown().await;

    let report = report.ok_or(CliError::StatusUnavailable { seconds })?;
    let out = output::render_single(&global.output, &report, detail, |r| r.status.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}
