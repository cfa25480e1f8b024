//! midsync CLI - Synchronize a local directory with a Midas folder
//!
//! One invocation runs one mode:
//! - `check` compares the local tree with the remote folder tree
//! - `upload` mirrors the local tree onto the remote folder
//! - `download` fills an empty local directory from the remote folder
//!
//! Every parameter except the mode may also come from the configuration
//! file; command line values win.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use midsync_core::config::{Config, RunOverrides};
use midsync_core::domain::DomainError;
use tracing_subscriber::EnvFilter;

mod output;
mod presenter;
mod run;

use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "midsync",
    version,
    about = "Synchronize a local directory with a Midas folder"
)]
pub struct Cli {
    /// Run mode: check, upload or download
    #[arg(short, long, value_name = "MODE")]
    mode: Option<String>,

    /// Local root directory
    #[arg(
        short = 'l',
        long = "local-dir",
        visible_short_alias = 'd',
        alias = "datadir",
        value_name = "DIR"
    )]
    local_dir: Option<PathBuf>,

    /// Midas server URL, e.g. https://midas.example.org/midas
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Account email
    #[arg(short, long)]
    email: Option<String>,

    /// API key of the account
    #[arg(
        short = 'a',
        long = "api-key",
        alias = "apikey",
        env = "MIDSYNC_API_KEY",
        hide_env_values = true
    )]
    api_key: Option<String>,

    /// Remote root folder id
    #[arg(short = 'f', long = "folder-id", alias = "folderid", value_name = "ID")]
    folder_id: Option<String>,

    /// Delete remote-only entries without asking
    #[arg(long, conflicts_with = "no_delete")]
    yes: bool,

    /// Keep remote-only entries without asking
    #[arg(long)]
    no_delete: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> RunOverrides {
        RunOverrides {
            mode: self.mode.clone(),
            local_root: self.local_dir.as_deref().map(expand_tilde),
            url: self.url.clone(),
            email: self.email.clone(),
            api_key: self.api_key.clone(),
            folder_id: self.folder_id.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = OutputFormat::from_flag(cli.json);
    let formatter = get_formatter(format);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };
    config.sync.root = config.sync.root.as_deref().map(expand_tilde);

    init_tracing(cli.verbose, &config.logging.level);

    let overrides = cli.overrides();
    if let Err(e) = check_config(&config, &overrides) {
        formatter.error(&format!("{e:#}"));
        return ExitCode::FAILURE;
    }

    let settings = match config.resolve_settings(overrides) {
        Ok(settings) => settings,
        Err(e) => usage_error(&e).exit(),
    };

    match run::execute(&cli, &config, &settings, format).await {
        Ok(code) => code,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration file
///
/// An explicit `--config` file must exist and parse. The default file is
/// optional.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display())),
        None => {
            let path = Config::default_path();
            if !path.exists() {
                return Ok(Config::default());
            }
            Config::load(&path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        }
    }
}

/// Rejects configuration entries this run would use with invalid values
fn check_config(config: &Config, overrides: &RunOverrides) -> Result<()> {
    let problems = config.validate_for(overrides);
    if problems.is_empty() {
        return Ok(());
    }
    let listed: Vec<String> = problems.iter().map(ToString::to_string).collect();
    anyhow::bail!("Invalid configuration: {}", listed.join("; "))
}

/// Filter level from `-v` flags, then `RUST_LOG`, then the config file
fn init_tracing(verbose: u8, config_level: &str) {
    let env_filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Usage error for run parameters that could not be resolved
fn usage_error(err: &DomainError) -> clap::Error {
    let kind = match err {
        DomainError::MissingParameter(_) => ErrorKind::MissingRequiredArgument,
        DomainError::InvalidMode(_) => ErrorKind::InvalidValue,
        _ => ErrorKind::ValueValidation,
    };
    Cli::command().error(kind, err)
}

/// Expand tilde (~) in a path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
