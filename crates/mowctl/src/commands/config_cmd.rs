//! Config subcommand handlers.

use std::fmt::Write;

use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "status_expire = {}", cfg.defaults.status_expire);
    let _ = writeln!(out, "http_timeout = {}", cfg.defaults.http_timeout);
    if let Some(ref level) = cfg.defaults.log_level {
        let _ = writeln!(out, "log_level = \"{level}\"");
    }

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref login) = p.login {
            let _ = writeln!(out, "login = \"{login}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref mower) = p.mower {
            let _ = writeln!(out, "mower = \"{mower}\"");
        }
        if let Some(poll) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {poll}");
        }
        if let Some(use_token) = p.use_token {
            let _ = writeln!(out, "use_token = {use_token}");
        }
        if let Some(ref url) = p.api_url {
            let _ = writeln!(out, "api_url = \"{url}\"");
        }
    }

    out
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            output::print_output(format_config_redacted(cfg).trim_end(), global.quiet);
        }

        ConfigCommand::Path => {
            let profile = config::active_profile_name(global, cfg);
            let out = format!(
                "config: {}\ntoken:  {}",
                config::config_path().display(),
                mowctl_config::token_path(&profile).display()
            );
            output::print_output(&out, global.quiet);
        }

        ConfigCommand::SetPassword => {
            let profile = config::active_profile_name(global, cfg);
            let password = match global.password {
                Some(ref pw) => pw.clone(),
                None => rpassword::prompt_password(format!("Password for '{profile}': "))?,
            };
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            mowctl_config::store_password(&profile, &SecretString::from(password))?;
            eprintln!("Password for '{profile}' stored in system keyring");
        }
    }
    Ok(())
}
