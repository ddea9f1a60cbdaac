//! Launch layout: directories, socket path, service names and the service
//! records registered for a node or wallet of one `(session, env)`.
//!
//! Process supervision itself (screen / nssm) is not handled here; `up`
//! only registers what a launcher would have started.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use cu_domain::catalog::{self, Platform};
use cu_domain::config::ResolvedPaths;
use cu_domain::error::{Error, Result};
use cu_sessions::{ServiceDetails, ServiceRecord};

/// Default wallet API port.
pub const DEFAULT_WALLET_PORT: &str = "8090";
/// Default session name.
pub const DEFAULT_SESSION: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchLayout {
    pub env: String,
    pub session: String,
    pub wallet_port: u16,
    pub platform: Platform,
    pub token_metadata_server: &'static str,
    pub bin_dir: PathBuf,
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
    pub wallet_db_dir: PathBuf,
    pub node_db_dir: PathBuf,
    /// Unix socket, or a named pipe on Windows.
    pub node_socket: String,
}

impl LaunchLayout {
    /// Layout for the host platform.  Creates every directory it names.
    pub fn setup(paths: &ResolvedPaths, env: &str, wallet_port: &str, session: &str) -> Result<Self> {
        Self::setup_for(Platform::current(), paths, env, wallet_port, session)
    }

    pub fn setup_for(
        platform: Platform,
        paths: &ResolvedPaths,
        env: &str,
        wallet_port: &str,
        session: &str,
    ) -> Result<Self> {
        catalog::ensure_supported(env)?;
        let wallet_port = wallet_port
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::WalletPortNotSet)?;
        let session = if session.is_empty() {
            DEFAULT_SESSION
        } else {
            session
        };
        cu_sessions::store::validate_session_name(session)?;

        let config_dir = paths.config_dir.join(env);
        let log_dir = paths.log_dir.join(session).join(env);
        let state_dir = paths.state_dir.join(session).join(env);
        let node_socket = match platform {
            Platform::Windows => format!(r"\\.\pipe\cardano-node-{env}-{session}"),
            _ => state_dir.join("node.socket").display().to_string(),
        };

        let layout = Self {
            env: env.to_owned(),
            session: session.to_owned(),
            wallet_port,
            platform,
            token_metadata_server: catalog::token_metadata_server(env),
            bin_dir: paths.bin_dir.clone(),
            wallet_db_dir: state_dir.join("wallet-db"),
            node_db_dir: state_dir.join("node-db"),
            config_dir,
            log_dir,
            state_dir,
            node_socket,
        };
        layout.create_dirs()?;
        Ok(layout)
    }

    fn create_dirs(&self) -> Result<()> {
        for dir in [
            &self.bin_dir,
            &self.config_dir,
            &self.log_dir,
            &self.state_dir,
            &self.wallet_db_dir,
            &self.node_db_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| Error::storage(dir, e))?;
        }
        Ok(())
    }

    pub fn node_service_name(&self) -> String {
        match self.platform {
            Platform::Windows => format!("cardano-node-{}-{}", self.env, self.session),
            _ => format!("NODE_{}_{}", self.env, self.session),
        }
    }

    pub fn wallet_service_name(&self) -> String {
        match self.platform {
            Platform::Windows => format!("cardano-wallet-{}-{}", self.env, self.session),
            _ => format!("WALLET_{}_{}", self.env, self.session),
        }
    }

    pub fn node_bin(&self) -> PathBuf {
        self.binary("cardano-node")
    }

    pub fn wallet_bin(&self) -> PathBuf {
        self.binary("cardano-wallet")
    }

    fn binary(&self, name: &str) -> PathBuf {
        self.bin_dir
            .join(format!("{name}{}", self.platform.exe_suffix()))
    }

    /// `--mainnet`, or `--testnet <byron-genesis.json>` elsewhere.
    fn network_flag(&self) -> String {
        if self.env == "mainnet" {
            "--mainnet".to_owned()
        } else {
            format!(
                "--testnet {}",
                self.config_dir.join("byron-genesis.json").display()
            )
        }
    }

    pub fn node_cmd(&self) -> String {
        [
            format!("{} run", self.node_bin().display()),
            format!("--config {}", self.config_dir.join("config.json").display()),
            format!("--topology {}", self.config_dir.join("topology.json").display()),
            format!("--database-path {}", self.node_db_dir.display()),
            format!("--socket-path {}", self.node_socket),
        ]
        .join(" ")
    }

    pub fn wallet_cmd(&self) -> String {
        [
            format!("{} serve", self.wallet_bin().display()),
            format!("--port {}", self.wallet_port),
            format!("--node-socket {}", self.node_socket),
            self.network_flag(),
            format!("--database {}", self.wallet_db_dir.display()),
            format!("--token-metadata-server {}", self.token_metadata_server),
        ]
        .join(" ")
    }

    pub fn wallet_url(&self) -> String {
        format!("http://localhost:{}/v2", self.wallet_port)
    }

    /// Registration for the node of this layout.
    pub fn node_details(&self, version: &str) -> ServiceDetails {
        let mut record = ServiceRecord::new()
            .with("service", self.node_service_name())
            .with("version", version)
            .with("log", self.log_dir.join("node.log").display().to_string())
            .with("db_dir", self.node_db_dir.display().to_string())
            .with("socket_path", self.node_socket.clone());
        if let Some(magic) = protocol_magic(&self.config_dir) {
            record = record.with("protocol_magic", magic);
        }
        let record = record
            .with("bin", self.node_bin().display().to_string())
            .with("cmd", self.node_cmd());
        ServiceDetails::node(self.env.clone(), record)
    }

    /// Registration for the wallet of this layout.
    pub fn wallet_details(&self, version: &str) -> ServiceDetails {
        let record = ServiceRecord::new()
            .with("service", self.wallet_service_name())
            .with("version", version)
            .with("log", self.log_dir.join("wallet.log").display().to_string())
            .with("db_dir", self.wallet_db_dir.display().to_string())
            .with("port", self.wallet_port)
            .with("url", self.wallet_url())
            .with("bin", self.wallet_bin().display().to_string())
            .with("cmd", self.wallet_cmd());
        ServiceDetails::wallet(self.env.clone(), record)
    }
}

/// `protocolConsts.protocolMagic` from `<config_dir>/byron-genesis.json`.
///
/// `None` when the file is absent or does not carry the field.
pub fn protocol_magic(config_dir: &Path) -> Option<u64> {
    let path = config_dir.join("byron-genesis.json");
    let raw = fs::read_to_string(&path).ok()?;
    let genesis: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unparseable byron genesis");
            return None;
        }
    };
    let magic = &genesis["protocolConsts"]["protocolMagic"];
    magic
        .as_u64()
        .or_else(|| magic.as_str().and_then(|s| s.parse().ok()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use cu_domain::config::PathsConfig;

    fn paths(dir: &Path) -> ResolvedPaths {
        PathsConfig::default()
            .resolve_from(Some(dir.to_path_buf()))
            .unwrap()
    }

    #[test]
    fn layout_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        let layout = LaunchLayout::setup_for(Platform::Linux, &p, "preprod", "8090", "1").unwrap();

        assert_eq!(layout.config_dir, p.config_dir.join("preprod"));
        assert_eq!(layout.log_dir, p.log_dir.join("1").join("preprod"));
        assert_eq!(layout.node_db_dir, p.state_dir.join("1/preprod/node-db"));
        for d in [&layout.bin_dir, &layout.wallet_db_dir, &layout.node_db_dir] {
            assert!(d.is_dir(), "{}", d.display());
        }
        assert!(layout.node_socket.ends_with("node.socket"));
        assert_eq!(layout.node_service_name(), "NODE_preprod_1");
        assert_eq!(layout.wallet_service_name(), "WALLET_preprod_1");
    }

    #[test]
    fn rejects_bad_env_and_port() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        assert!(matches!(
            LaunchLayout::setup(&p, "moonnet", "8090", "0"),
            Err(Error::EnvNotSupported(_))
        ));
        assert!(matches!(
            LaunchLayout::setup(&p, "preprod", "", "0"),
            Err(Error::WalletPortNotSet)
        ));
        assert!(matches!(
            LaunchLayout::setup(&p, "preprod", "eighty", "0"),
            Err(Error::WalletPortNotSet)
        ));
    }

    #[test]
    fn empty_session_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let layout = LaunchLayout::setup(&paths(dir.path()), "preview", "8090", "").unwrap();
        assert_eq!(layout.session, "0");
    }

    #[test]
    fn windows_names_and_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let layout =
            LaunchLayout::setup_for(Platform::Windows, &paths(dir.path()), "mainnet", "8090", "0")
                .unwrap();
        assert_eq!(layout.node_socket, r"\\.\pipe\cardano-node-mainnet-0");
        assert_eq!(layout.node_service_name(), "cardano-node-mainnet-0");
        assert_eq!(layout.wallet_service_name(), "cardano-wallet-mainnet-0");
        assert!(layout.node_bin().to_string_lossy().ends_with("cardano-node.exe"));
    }

    #[test]
    fn wallet_cmd_uses_network_flag() {
        let dir = tempfile::tempdir().unwrap();
        let p = paths(dir.path());
        let mainnet = LaunchLayout::setup_for(Platform::Linux, &p, "mainnet", "8091", "0").unwrap();
        let cmd = mainnet.wallet_cmd();
        assert!(cmd.contains("--mainnet"));
        assert!(cmd.contains("--port 8091"));
        assert!(cmd.contains("https://tokens.cardano.org"));

        let preprod = LaunchLayout::setup_for(Platform::Linux, &p, "preprod", "8090", "0").unwrap();
        assert!(preprod.wallet_cmd().contains("--testnet"));
        assert!(preprod.wallet_cmd().contains("byron-genesis.json"));
    }

    #[test]
    fn node_details_read_protocol_magic() {
        let dir = tempfile::tempdir().unwrap();
        let layout =
            LaunchLayout::setup_for(Platform::Linux, &paths(dir.path()), "preprod", "8090", "0")
                .unwrap();

        let details = layout.node_details("8.1.2");
        let node = details.node.as_ref().unwrap();
        assert!(node.get("protocol_magic").is_none());

        fs::write(
            layout.config_dir.join("byron-genesis.json"),
            r#"{"protocolConsts": {"protocolMagic": 1}}"#,
        )
        .unwrap();
        let details = layout.node_details("8.1.2");
        let node = details.node.unwrap();
        assert_eq!(details.network, "preprod");
        assert_eq!(node.get_u64("protocol_magic"), Some(1));
        assert_eq!(node.get_str("service"), Some("NODE_preprod_0"));
        assert_eq!(node.get_str("version"), Some("8.1.2"));
        assert!(node.get_str("cmd").unwrap().contains(" run --config "));
    }

    #[test]
    fn wallet_details_fields() {
        let dir = tempfile::tempdir().unwrap();
        let layout =
            LaunchLayout::setup_for(Platform::Linux, &paths(dir.path()), "preview", "8095", "2")
                .unwrap();
        let details = layout.wallet_details("v2023-04-14");
        assert!(details.node.is_none());
        let wallet = details.wallet.unwrap();
        assert_eq!(wallet.get_u64("port"), Some(8095));
        assert_eq!(wallet.get_str("url"), Some("http://localhost:8095/v2"));
        assert_eq!(wallet.get_str("service"), Some("WALLET_preview_2"));
        assert!(wallet.get_str("log").unwrap().ends_with("wallet.log"));
    }
}
