use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cu_cli::cli::{self, Cli, Command, ConfigCommand, SessionCommand, UrlsCommand};
use cu_domain::config::{Config, LogFormat, LoggingConfig};
use cu_sessions::ServiceKind;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_path) = match cli::load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_cli_tracing(&config.logging);

    let result = match cli.command {
        Command::Session(cmd) => run_session(&config, cmd),
        Command::Up {
            service,
            env,
            session,
            port,
        } => run_up(&config, service.into(), &env, &session, &port),
        Command::Down {
            service,
            env,
            session,
        } => cli::open_registry(&config)
            .and_then(|registry| cli::service::down(&registry, service.into(), &env, &session)),
        Command::Status {
            service,
            env,
            session,
            json,
        } => run_status(&config, service.into(), &env, &session, json),
        Command::Urls(UrlsCommand::Configs { env }) => cli::urls::configs(&env),
        Command::Urls(UrlsCommand::Binary { release }) => cli::urls::binary(&release),
        Command::Config(ConfigCommand::Validate) => {
            if cli::config::validate(&config, &config_path) {
                Ok(())
            } else {
                return ExitCode::FAILURE;
            }
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(&config),
        Command::Version => {
            println!("cardano-up {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_session(config: &Config, cmd: SessionCommand) -> anyhow::Result<()> {
    let registry = cli::open_registry(config)?;
    match cmd {
        SessionCommand::List => cli::session::list(&registry),
        SessionCommand::Show { name } => cli::session::show(&registry, &name),
        SessionCommand::Destroy { name, all } => {
            cli::session::destroy(&registry, name.as_deref(), all)
        }
        SessionCommand::Add {
            name,
            network,
            node,
            wallet,
        } => cli::session::add(
            &registry,
            &name,
            &network,
            node.as_deref(),
            wallet.as_deref(),
        ),
        SessionCommand::Remove {
            name,
            network,
            service,
        } => cli::session::remove(&registry, &name, &network, service.into()),
    }
}

fn run_up(
    config: &Config,
    kind: ServiceKind,
    env: &str,
    session: &str,
    port: &str,
) -> anyhow::Result<()> {
    let paths = config.paths.resolve()?;
    let registry = cli::open_registry(config)?;
    cli::service::up(&registry, &paths, kind, env, session, port)
}

fn run_status(
    config: &Config,
    kind: ServiceKind,
    env: &str,
    session: &str,
    json: bool,
) -> anyhow::Result<()> {
    let registry = cli::open_registry(config)?;
    let report = cli::status::probe(&registry, session, env, kind)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        cli::status::print(&report);
    }
    if report.up {
        Ok(())
    } else {
        anyhow::bail!("{kind} on '{env}' is not reachable")
    }
}

/// Initialize compact (or JSON) stderr-only tracing.
///
/// `RUST_LOG` wins over `logging.filter`.
fn init_cli_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
