//! Clap derive structures for the `mowctl` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::net::{IpAddr, Ipv4Addr};

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mowctl -- supervise a cloud-connected robotic lawn mower
#[derive(Debug, Parser)]
#[command(
    name = "mowctl",
    version,
    about = "Control and monitor a robotic lawn mower through its vendor cloud",
    long_about = "Control and monitor a robotic lawn mower through its vendor cloud.\n\n\
        Commands are reconciled by a background poll loop: mowctl keeps sending\n\
        the command until the mower reports a matching state or the timeout\n\
        expires.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "MOWCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Account login (e-mail)
    #[arg(long, env = "MOWCTL_LOGIN", global = true)]
    pub login: Option<String>,

    /// Account password
    #[arg(long, env = "MOWCTL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Mower name or id (defaults to the first mower on the account)
    #[arg(long, env = "MOWCTL_MOWER", global = true)]
    pub mower: Option<String>,

    /// Do not read or write the cached session token
    #[arg(long, global = true)]
    pub no_token: bool,

    /// Save the login (and password, to the keyring) into the active profile
    #[arg(long, global = true)]
    pub save: bool,

    /// Base URL serving both cloud APIs
    #[arg(long, env = "MOWCTL_API_URL", global = true, hide = true)]
    pub api_url: Option<String>,

    /// Seconds between status polls
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MOWCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Log level (overridden by -v and RUST_LOG)
    #[arg(long, env = "MOWCTL_LOG_LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Mower control action.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Action {
    /// Leave the station and mow
    Start,
    /// Stop where it is
    Stop,
    /// Return to the charging station
    Park,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a command and wait until the mower reports it done
    #[command(alias = "ctl")]
    Control(ControlArgs),

    /// Print the mower's current status
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Run the supervisor in the foreground until Ctrl-C
    Monitor,

    /// List the mowers paired with the account
    #[command(alias = "ls")]
    List,

    /// Revoke the cached session token
    Logout,

    /// Serve the admin HTTP interface
    Server(ServerArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONTROL / STATUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ControlArgs {
    /// Command to send
    #[arg(ignore_case = true)]
    pub action: Action,

    /// Seconds to wait for the mower to comply
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Seconds to wait for the first status
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SERVER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 1234)]
    pub port: u16,

    /// Seconds a `/status` answer stays cached
    #[arg(long)]
    pub expire: Option<u64>,

    /// Seconds a command request waits before answering 500
    #[arg(long, short = 't')]
    pub timeout: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store a password in the system keyring for the active profile
    SetPassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
