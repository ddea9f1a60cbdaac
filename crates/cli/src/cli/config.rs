use std::path::Path;

use cu_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns false when errors (not just warnings) were found.
pub fn validate(config: &Config, config_path: &Path) -> bool {
    let issues = config.validate();
    let config_path = config_path.display();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_fails_validation() {
        let mut cfg = Config::default();
        assert!(validate(&cfg, Path::new("config.toml")));
        cfg.logging.filter = " ".into();
        assert!(!validate(&cfg, Path::new("config.toml")));
    }

    #[test]
    fn warnings_alone_pass() {
        let mut cfg = Config::default();
        cfg.paths.log_dir = Some("logs".into());
        assert!(validate(&cfg, Path::new("config.toml")));
    }
}
