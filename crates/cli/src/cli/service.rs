//! `up` / `down`: register and unregister services for an environment.

use std::path::Path;
use std::process::Command;

use cu_domain::catalog;
use cu_domain::config::ResolvedPaths;
use cu_sessions::{RemoveRequest, ServiceKind, SessionRegistry};

use crate::launch::LaunchLayout;

const UNKNOWN_VERSION: &str = "unknown";

pub fn up(
    registry: &SessionRegistry,
    paths: &ResolvedPaths,
    kind: ServiceKind,
    env: &str,
    session: &str,
    port: &str,
) -> anyhow::Result<()> {
    let layout = LaunchLayout::setup(paths, env, port, session)?;
    let details = match kind {
        ServiceKind::Node => layout.node_details(&binary_version(&layout.node_bin())),
        ServiceKind::Wallet => layout.wallet_details(&binary_version(&layout.wallet_bin())),
    };
    registry.create_or_update(&layout.session, details)?;

    let name = match kind {
        ServiceKind::Node => layout.node_service_name(),
        ServiceKind::Wallet => layout.wallet_service_name(),
    };
    println!("Registered {kind} '{name}' in session '{}'.", layout.session);
    Ok(())
}

pub fn down(
    registry: &SessionRegistry,
    kind: ServiceKind,
    env: &str,
    session: &str,
) -> anyhow::Result<()> {
    catalog::ensure_supported(env)?;
    registry.remove(session, &RemoveRequest::new(env, kind))?;
    println!("Unregistered {kind} on '{env}' in session '{session}'.");
    Ok(())
}

/// First line of `<bin> version`, or "unknown" when the binary is missing
/// or fails.
fn binary_version(bin: &Path) -> String {
    if !bin.exists() {
        return UNKNOWN_VERSION.into();
    }
    match Command::new(bin).arg("version").output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .next()
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_VERSION.into()),
        Ok(out) => {
            tracing::warn!(bin = %bin.display(), status = %out.status, "version probe failed");
            UNKNOWN_VERSION.into()
        }
        Err(e) => {
            tracing::warn!(bin = %bin.display(), error = %e, "version probe failed");
            UNKNOWN_VERSION.into()
        }
    }
}
