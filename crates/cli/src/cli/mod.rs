pub mod config;
pub mod service;
pub mod session;
pub mod status;
pub mod urls;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use cu_domain::config::{default_base_dir, Config};
use cu_sessions::{ServiceKind, SessionRegistry};

use crate::launch::{DEFAULT_SESSION, DEFAULT_WALLET_PORT};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CARDANO_UP_CONFIG";

/// cardano-up: track cardano-node and cardano-wallet services per session.
#[derive(Debug, Parser)]
#[command(name = "cardano-up", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and edit session documents.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Register a node or wallet for an environment.
    Up {
        service: ServiceArg,
        /// Network environment, e.g. "preprod".
        env: String,
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
        /// Wallet API port.
        #[arg(long, default_value = DEFAULT_WALLET_PORT)]
        port: String,
    },
    /// Unregister a node or wallet.
    Down {
        service: ServiceArg,
        env: String,
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Check whether a registered node or wallet is reachable.
    Status {
        service: ServiceArg,
        env: String,
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print download URLs.
    #[command(subcommand)]
    Urls(UrlsCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// List sessions with their networks.
    List,
    /// Print a session document as JSON.
    Show { name: String },
    /// Delete a session document, or all of them with --all.
    Destroy {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Register service records given as JSON objects.
    Add {
        name: String,
        #[arg(long)]
        network: String,
        /// Node record, e.g. '{"service":"NODE_preprod_0"}'.
        #[arg(long)]
        node: Option<String>,
        /// Wallet record, e.g. '{"port":8090}'.
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Clear one service slot.
    Remove {
        name: String,
        #[arg(long)]
        network: String,
        #[arg(long)]
        service: ServiceArg,
    },
}

#[derive(Debug, Subcommand)]
pub enum UrlsCommand {
    /// Configuration file URLs for an environment.
    Configs { env: String },
    /// Release archive URL for a wallet release tag.
    Binary { release: String },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceArg {
    Node,
    Wallet,
}

impl From<ServiceArg> for ServiceKind {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Node => ServiceKind::Node,
            ServiceArg::Wallet => ServiceKind::Wallet,
        }
    }
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `CARDANO_UP_CONFIG`, or
/// `<base_dir>/config.toml` by default.  A missing file yields defaults.
pub fn load_config() -> anyhow::Result<(Config, PathBuf)> {
    let config_path = match std::env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => default_base_dir()
            .unwrap_or_default()
            .join("config.toml"),
    };
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(path: &std::path::Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Registry over the configured base directory.
pub fn open_registry(config: &Config) -> anyhow::Result<SessionRegistry> {
    let paths = config.paths.resolve()?;
    Ok(SessionRegistry::open(paths.base_dir).with_advisory_lock(config.sessions.advisory_lock))
}
