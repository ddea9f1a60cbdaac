use anyhow::Context;
use serde_json::{Map, Value};

use cu_sessions::{RemoveRequest, ServiceKind, SessionRegistry};

pub fn list(registry: &SessionRegistry) -> anyhow::Result<()> {
    let sessions = registry.list()?;
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    for s in sessions {
        let modified = s
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!("{}\t{}\t{modified}", s.name, s.networks.join(","));
    }
    Ok(())
}

pub fn show(registry: &SessionRegistry, name: &str) -> anyhow::Result<()> {
    let doc = registry.get(name)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

pub fn destroy(registry: &SessionRegistry, name: Option<&str>, all: bool) -> anyhow::Result<()> {
    if all {
        let n = registry.destroy_all()?;
        println!("Destroyed {n} session(s).");
        return Ok(());
    }
    let name = name.context("session name required")?;
    registry.destroy(name)?;
    println!("Destroyed session '{name}'.");
    Ok(())
}

pub fn add(
    registry: &SessionRegistry,
    name: &str,
    network: &str,
    node: Option<&str>,
    wallet: Option<&str>,
) -> anyhow::Result<()> {
    let details = details_value(network, node, wallet)?;
    let doc = registry.create_or_update_value(name, details)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

pub fn remove(
    registry: &SessionRegistry,
    name: &str,
    network: &str,
    service: ServiceKind,
) -> anyhow::Result<()> {
    registry.remove(name, &RemoveRequest::new(network, service))?;
    println!("{}", serde_json::to_string_pretty(&registry.get(name)?)?);
    Ok(())
}

/// `{"network": .., "node": .., "wallet": ..}` from command-line JSON.
fn details_value(network: &str, node: Option<&str>, wallet: Option<&str>) -> anyhow::Result<Value> {
    let mut map = Map::new();
    map.insert("network".into(), Value::String(network.to_owned()));
    for (key, raw) in [("node", node), ("wallet", wallet)] {
        if let Some(raw) = raw {
            let value: Value =
                serde_json::from_str(raw).with_context(|| format!("--{key} is not valid JSON"))?;
            map.insert(key.into(), value);
        }
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn details_from_flags() {
        let v = details_value("preprod", Some(r#"{"service":"NODE_preprod_0"}"#), None).unwrap();
        assert_eq!(
            v,
            json!({"network": "preprod", "node": {"service": "NODE_preprod_0"}})
        );
        assert!(details_value("preprod", None, Some("{oops")).is_err());
    }

    #[test]
    fn add_then_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let reg = SessionRegistry::open(dir.path());
        add(&reg, "s", "preprod", Some("{}"), Some(r#"{"port":8090}"#)).unwrap();
        assert!(reg.exists("s").unwrap());

        // Non-object slot is rejected by the registry.
        assert!(add(&reg, "s", "preview", Some("5"), None).is_err());

        remove(&reg, "s", "preprod", ServiceKind::Node).unwrap();
        remove(&reg, "s", "preprod", ServiceKind::Wallet).unwrap();
        assert!(!reg.exists("s").unwrap());
    }
}
