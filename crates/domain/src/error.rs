use std::path::PathBuf;

/// Shared error type used across all cardano-up crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("session '{session}' already has node running on '{network}'")]
    SessionHasNode { session: String, network: String },

    #[error("session '{session}' already has wallet running on '{network}'")]
    SessionHasWallet { session: String, network: String },

    #[error("session '{session}' does not exist")]
    SessionNotExists { session: String },

    #[error("session '{session}' has no services up on '{network}'")]
    SessionEnvNotUp { session: String, network: String },

    #[error("session '{session}' has no {service} up on '{network}'")]
    SessionServiceNotUp {
        session: String,
        network: String,
        service: String,
    },

    #[error("storage {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session document {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode session document {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("environment '{0}' not supported; supported are: {}", crate::catalog::ENVS.join(", "))]
    EnvNotSupported(String),

    #[error(
        "not supported version: {0}; supported are: 'latest', 'master', \
         tag (e.g. 'v2022-08-16') or pr number ('3045')"
    )]
    VersionNotSupported(String),

    #[error("wallet port is not set")]
    WalletPortNotSet,

    #[error("config: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] so callers can branch on the failure
/// family without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Conflict,
    NotFound,
    Storage,
    Unsupported,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::SessionHasNode { .. } | Self::SessionHasWallet { .. } => ErrorKind::Conflict,
            Self::SessionNotExists { .. }
            | Self::SessionEnvNotUp { .. }
            | Self::SessionServiceNotUp { .. } => ErrorKind::NotFound,
            Self::Storage { .. } | Self::Corrupt { .. } | Self::Encode { .. } => {
                ErrorKind::Storage
            }
            Self::EnvNotSupported(_) | Self::VersionNotSupported(_) | Self::WalletPortNotSet => {
                ErrorKind::Unsupported
            }
        }
    }

    /// Wrap an I/O failure with the path it happened on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
