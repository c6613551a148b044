//! `control` handler: submit a command and wait for the mower to comply.

use std::time::Duration;

use serde::Serialize;

use mowctl_core::{Command, MowerStatus};

use crate::cli::{Action, ControlArgs, GlobalOpts};
use crate::config::{Config, ONE_SHOT_POLL, Session};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ControlOutcome {
    command: Command,
    satisfied: bool,
    status: Option<MowerStatus>,
}

fn to_command(action: Action) -> Command {
    match action {
        Action::Start => Command::Start,
        Action::Stop => Command::Stop,
        Action::Park => Command::Park,
    }
}

pub async fn handle(
    args: ControlArgs,
    session: &Session,
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(), CliError> {
    let command = to_command(args.action);
    let seconds = args.timeout.unwrap_or(cfg.defaults.timeout);

    let controller = session.spawn_supervisor(ONE_SHOT_POLL)?;
    let satisfied = controller
        .submit_command(command, Duration::from_secs(seconds))
        .await;
    let status = controller.status(Duration::ZERO).await;
    controller.shutdown().await;

    if !satisfied {
        return Err(CliError::CommandTimedOut {
            command: command.to_string(),
            seconds,
        });
    }

    let outcome = ControlOutcome {
        command,
        satisfied,
        status,
    };
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| match o.status {
            Some(status) => format!("{} done, mower is {status}", o.command),
            None => format!("{} done", o.command),
        },
        |o| o.command.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
