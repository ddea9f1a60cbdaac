//! Catalogue of supported network environments and wallet releases.
//!
//! Only URL construction lives here; downloading and unpacking the
//! artifacts is left to external tooling.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

pub const CONFIGS_BASE_URL: &str = "https://book.world.dev.cardano.org/environments";
pub const BINS_BASE_URL: &str = "https://github.com/input-output-hk/cardano-wallet";

pub const MAINNET_TOKEN_SERVER: &str = "https://tokens.cardano.org";
pub const TESTNET_TOKEN_SERVER: &str = "https://metadata.cardano-testnet.iohkdev.io";

/// Network environments with published configuration bundles.
pub const ENVS: &[&str] = &[
    "mainnet",
    "preview",
    "preprod",
    "shelley-qa",
    "staging",
    "vasil-qa",
    "vasil-dev",
    "mixed",
    "testnet",
];

/// Files making up one environment's configuration bundle.
pub const CONFIG_FILES: &[&str] = &[
    "alonzo-genesis.json",
    "byron-genesis.json",
    "shelley-genesis.json",
    "config.json",
    "topology.json",
];

/// Fail with [`Error::EnvNotSupported`] unless `env` is a known environment.
pub fn ensure_supported(env: &str) -> Result<()> {
    if ENVS.contains(&env) {
        Ok(())
    } else {
        Err(Error::EnvNotSupported(env.to_owned()))
    }
}

/// Base URL of the configuration bundle for `env` (trailing slash included).
pub fn configs_base_url(env: &str) -> Result<String> {
    ensure_supported(env)?;
    Ok(format!("{CONFIGS_BASE_URL}/{env}/"))
}

/// Download URLs of every file in the configuration bundle for `env`.
pub fn config_urls(env: &str) -> Result<Vec<String>> {
    let base = configs_base_url(env)?;
    Ok(CONFIG_FILES.iter().map(|f| format!("{base}{f}")).collect())
}

pub fn token_metadata_server(env: &str) -> &'static str {
    if env == "mainnet" {
        MAINNET_TOKEN_SERVER
    } else {
        TESTNET_TOKEN_SERVER
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Releases
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A wallet release selector as accepted on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSpec {
    Latest,
    Master,
    /// Dated release tag, e.g. `v2022-08-16`.
    Tag(String),
    /// Pull request number.
    Pr(u32),
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v20.{2}-.{2}-.{2}").expect("valid tag regex"))
}

impl ReleaseSpec {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "latest" => Ok(Self::Latest),
            "master" => Ok(Self::Master),
            _ if tag_re().is_match(s) => Ok(Self::Tag(s.to_owned())),
            _ => s
                .parse::<u32>()
                .map(Self::Pr)
                .map_err(|_| Error::VersionNotSupported(s.to_owned())),
        }
    }
}

impl fmt::Display for ReleaseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Master => write!(f, "master"),
            Self::Tag(tag) => write!(f, "{tag}"),
            Self::Pr(n) => write!(f, "pr-{n}"),
        }
    }
}

/// Host platform, used to select the release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }

    fn archive_suffix(self) -> &'static str {
        match self {
            Self::Linux => "linux64.tar.gz",
            Self::MacOs => "macos-intel.tar.gz",
            Self::Windows => "win64.zip",
        }
    }
}

/// Download URL of the release archive for a concrete tag.
///
/// Only dated tags map onto GitHub release assets; `latest` must first be
/// resolved to a tag by the caller, and master/PR builds are not published
/// as release assets.
pub fn binary_url(release: &ReleaseSpec, platform: Platform) -> Result<String> {
    let ReleaseSpec::Tag(tag) = release else {
        return Err(Error::VersionNotSupported(release.to_string()));
    };
    let file = format!("cardano-wallet-{tag}-{}", platform.archive_suffix());
    Ok(format!("{BINS_BASE_URL}/releases/download/{tag}/{file}"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_env_is_supported() {
        for env in ENVS {
            assert!(ensure_supported(env).is_ok(), "{env}");
        }
        assert!(matches!(
            ensure_supported("moonnet"),
            Err(Error::EnvNotSupported(e)) if e == "moonnet"
        ));
    }

    #[test]
    fn config_urls_cover_bundle() {
        let urls = config_urls("preprod").unwrap();
        assert_eq!(urls.len(), CONFIG_FILES.len());
        assert_eq!(
            urls[0],
            "https://book.world.dev.cardano.org/environments/preprod/alonzo-genesis.json"
        );
        assert!(urls.iter().all(|u| u.contains("/preprod/")));
    }

    #[test]
    fn config_urls_reject_unknown_env() {
        assert!(config_urls("nope").is_err());
    }

    #[test]
    fn token_server_per_env() {
        assert_eq!(token_metadata_server("mainnet"), MAINNET_TOKEN_SERVER);
        assert_eq!(token_metadata_server("preview"), TESTNET_TOKEN_SERVER);
    }

    #[test]
    fn release_spec_parsing() {
        assert_eq!(ReleaseSpec::parse("latest").unwrap(), ReleaseSpec::Latest);
        assert_eq!(ReleaseSpec::parse("master").unwrap(), ReleaseSpec::Master);
        assert_eq!(
            ReleaseSpec::parse("v2022-08-16").unwrap(),
            ReleaseSpec::Tag("v2022-08-16".into())
        );
        assert_eq!(ReleaseSpec::parse("3045").unwrap(), ReleaseSpec::Pr(3045));
        assert!(matches!(
            ReleaseSpec::parse("v1.0"),
            Err(Error::VersionNotSupported(_))
        ));
    }

    #[test]
    fn binary_url_per_platform() {
        let tag = ReleaseSpec::Tag("v2022-08-16".into());
        assert_eq!(
            binary_url(&tag, Platform::Linux).unwrap(),
            "https://github.com/input-output-hk/cardano-wallet/releases/download/\
             v2022-08-16/cardano-wallet-v2022-08-16-linux64.tar.gz"
        );
        assert!(binary_url(&tag, Platform::Windows)
            .unwrap()
            .ends_with("win64.zip"));
        assert!(binary_url(&ReleaseSpec::Master, Platform::Linux).is_err());
    }
}
