//! Command handlers for cloud-backed subcommands.

pub mod config_cmd;
pub mod control;
pub mod list;
pub mod logout;
pub mod monitor;
pub mod server;
pub mod status;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Route a parsed command to its handler.
///
/// `config` and `completions` are handled before this point since they never
/// talk to the cloud.
pub async fn dispatch(cmd: Command, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    // Logout only needs the cached token, not a password.
    if let Command::Logout = cmd {
        return logout::handle(global, cfg).await;
    }

    let session = config::resolve_session(global, cfg)?;
    match cmd {
        Command::Control(args) => control::handle(args, &session, global, cfg).await,
        Command::Status(args) => status::handle(args, &session, global, cfg).await,
        Command::Monitor => monitor::handle(&session, cfg).await,
        Command::List => list::handle(&session, global).await,
        Command::Server(args) => server::handle(args, &session, cfg).await,
        Command::Logout | Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command dispatched to the wrong handler".into(),
        )),
    }
}
