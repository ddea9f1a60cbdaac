use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use cu_domain::catalog;
use cu_sessions::{ServiceKind, ServiceRecord, SessionRegistry};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Result of probing one registered service.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub session: String,
    pub network: String,
    pub service: ServiceKind,
    pub name: Option<String>,
    pub up: bool,
    pub detail: String,
}

/// Resolve the registered service and probe it.
pub fn probe(
    registry: &SessionRegistry,
    session: &str,
    env: &str,
    kind: ServiceKind,
) -> anyhow::Result<StatusReport> {
    catalog::ensure_supported(env)?;
    let record = registry.service_record(session, env, kind)?;

    let (up, detail) = match kind {
        ServiceKind::Wallet => probe_wallet(&record),
        ServiceKind::Node => probe_node(&record),
    };
    tracing::debug!(session, network = env, service = %kind, up, "status probed");

    Ok(StatusReport {
        session: session.to_owned(),
        network: env.to_owned(),
        service: kind,
        name: record.get_str("service").map(str::to_owned),
        up,
        detail,
    })
}

fn probe_wallet(record: &ServiceRecord) -> (bool, String) {
    let Some(port) = record.get_u64("port").and_then(|p| u16::try_from(p).ok()) else {
        return (false, "wallet record has no port".into());
    };
    if port_accepts(port) {
        (true, format!("listening on localhost:{port}"))
    } else {
        (false, format!("nothing listening on localhost:{port}"))
    }
}

fn probe_node(record: &ServiceRecord) -> (bool, String) {
    let Some(socket) = record.get_str("socket_path") else {
        return (false, "node record has no socket_path".into());
    };
    if Path::new(socket).exists() {
        (true, format!("socket {socket} present"))
    } else {
        (false, format!("socket {socket} missing"))
    }
}

/// True when something accepts TCP connections on `localhost:port`.
pub fn port_accepts(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok()
}

pub fn print(report: &StatusReport) {
    let name = report.name.as_deref().unwrap_or("-");
    let state = if report.up { "up" } else { "down" };
    println!(
        "{} {name} ({}, session {}): {state}, {}",
        report.service, report.network, report.session, report.detail
    );
}
