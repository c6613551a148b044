mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let cfg = config::load_config_or_default();

    init_tracing(&cli.global, &cli.command, &cfg);

    if let Err(err) = run(cli, &cfg).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Pick the log level: `-v` count, then `--log-level`, then the config file,
/// then a per-command default. `RUST_LOG` overrides all of them.
fn init_tracing(global: &GlobalOpts, command: &Command, cfg: &Config) {
    let long_running = matches!(command, Command::Monitor | Command::Server(_));
    let filter = match global.verbose {
        0 if global.quiet => "error".to_owned(),
        0 => global
            .log_level
            .map(|level| level.as_filter().to_owned())
            .or_else(|| cfg.defaults.log_level.clone())
            .unwrap_or_else(|| if long_running { "info" } else { "warn" }.to_owned()),
        1 => "info".to_owned(),
        2 => "debug".to_owned(),
        _ => "trace".to_owned(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli, cfg: &Config) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a cloud session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global, cfg),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "mowctl", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &cli.global, cfg).await
        }
    }
}
