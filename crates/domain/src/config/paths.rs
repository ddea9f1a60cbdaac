use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the installation base directory.
pub const HOME_ENV: &str = "CARDANO_UP_HOME";

/// Name of the base directory under the user's home.
pub const BASE_DIR_NAME: &str = ".cardano-up";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Paths
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Installation directories.  Every field is optional; unset directories
/// resolve under `base_dir` (see [`PathsConfig::resolve_from`]).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// Root of the installation.  Session documents live directly in here.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

/// Fully resolved installation directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPaths {
    pub base_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub config_dir: PathBuf,
}

/// Default base directory: `$CARDANO_UP_HOME`, else `~/.cardano-up`.
pub fn default_base_dir() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|h| h.join(BASE_DIR_NAME)),
    }
}

impl PathsConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedPaths> {
        self.resolve_from(default_base_dir())
    }

    /// Resolve using `fallback_base` when no `base_dir` is configured.
    pub fn resolve_from(&self, fallback_base: Option<PathBuf>) -> Result<ResolvedPaths> {
        let base_dir = self
            .base_dir
            .clone()
            .or(fallback_base)
            .ok_or_else(|| Error::Config("could not determine home directory".into()))?;

        let sub = |explicit: &Option<PathBuf>, name: &str| {
            explicit.clone().unwrap_or_else(|| base_dir.join(name))
        };

        Ok(ResolvedPaths {
            bin_dir: sub(&self.bin_dir, "bins"),
            state_dir: sub(&self.state_dir, "state"),
            log_dir: sub(&self.log_dir, "logs"),
            config_dir: sub(&self.config_dir, "configs"),
            base_dir,
        })
    }

    /// Configured paths that are not absolute.
    pub(crate) fn relative_entries(&self) -> Vec<(&'static str, &Path)> {
        [
            ("paths.base_dir", &self.base_dir),
            ("paths.bin_dir", &self.bin_dir),
            ("paths.state_dir", &self.state_dir),
            ("paths.log_dir", &self.log_dir),
            ("paths.config_dir", &self.config_dir),
        ]
        .into_iter()
        .filter_map(|(field, p)| p.as_deref().map(|p| (field, p)))
        .filter(|(_, p)| p.is_relative())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_dirs_resolve_under_base() {
        let paths = PathsConfig::default()
            .resolve_from(Some(PathBuf::from("/opt/cu")))
            .unwrap();
        assert_eq!(paths.base_dir, PathBuf::from("/opt/cu"));
        assert_eq!(paths.bin_dir, PathBuf::from("/opt/cu/bins"));
        assert_eq!(paths.state_dir, PathBuf::from("/opt/cu/state"));
        assert_eq!(paths.log_dir, PathBuf::from("/opt/cu/logs"));
        assert_eq!(paths.config_dir, PathBuf::from("/opt/cu/configs"));
    }

    #[test]
    fn explicit_dirs_win() {
        let cfg = PathsConfig {
            base_dir: Some("/a".into()),
            bin_dir: Some("/usr/local/bin".into()),
            ..Default::default()
        };
        let paths = cfg.resolve_from(Some("/ignored".into())).unwrap();
        assert_eq!(paths.base_dir, PathBuf::from("/a"));
        assert_eq!(paths.bin_dir, PathBuf::from("/usr/local/bin"));
        assert_eq!(paths.log_dir, PathBuf::from("/a/logs"));
    }

    #[test]
    fn no_base_is_config_error() {
        let err = PathsConfig::default().resolve_from(None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
