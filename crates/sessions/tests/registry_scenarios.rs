//! End-to-end registry behaviour against a real base directory.

use cu_domain::error::{Error, ErrorKind};
use cu_sessions::{RemoveRequest, ServiceKind, SessionDocument, SessionRegistry};
use serde_json::{json, Value};

fn registry() -> (tempfile::TempDir, SessionRegistry) {
    let dir = tempfile::tempdir().unwrap();
    let reg = SessionRegistry::open(dir.path());
    (dir, reg)
}

fn doc(v: Value) -> SessionDocument {
    serde_json::from_value(v).unwrap()
}

fn remove(network: &str, service: &str) -> RemoveRequest {
    RemoveRequest::from_value(json!({"network": network, "service": service})).unwrap()
}

#[test]
fn unused_names_are_absent() {
    let (_dir, reg) = registry();
    for name in ["0", "test", "never-used"] {
        assert!(!reg.exists(name).unwrap());
        assert!(reg.get(name).unwrap().is_empty());
    }
}

#[test]
fn mainnet_lifecycle() {
    let (_dir, reg) = registry();
    let node = json!({"service": "NODE_mainnet_0", "socket_path": "/tmp/node.socket"});
    let wallet = json!({"service": "WALLET_mainnet_0", "port": 8090});

    reg.create_or_update_value("s", json!({"network": "mainnet", "node": node}))
        .unwrap();
    assert_eq!(
        reg.get("s").unwrap(),
        doc(json!({"mainnet": {"network": "mainnet", "node": node}}))
    );

    reg.create_or_update_value("s", json!({"network": "mainnet", "wallet": wallet}))
        .unwrap();
    assert_eq!(
        reg.get("s").unwrap(),
        doc(json!({"mainnet": {"network": "mainnet", "node": node, "wallet": wallet}}))
    );

    reg.remove("s", &remove("mainnet", "node")).unwrap();
    assert_eq!(
        reg.get("s").unwrap(),
        doc(json!({"mainnet": {"network": "mainnet", "wallet": wallet}}))
    );

    reg.remove("s", &remove("mainnet", "wallet")).unwrap();
    assert!(!reg.exists("s").unwrap());
}

#[test]
fn failed_registration_does_not_touch_disk() {
    let (_dir, reg) = registry();
    reg.create_or_update_value("s", json!({"network": "preprod", "node": {"pid": 1}}))
        .unwrap();
    let path = reg.store().path_for("s").unwrap();
    let raw_before = std::fs::read_to_string(&path).unwrap();

    let err = reg
        .create_or_update_value("s", json!({"network": "preprod", "node": {"pid": 2}}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), raw_before);
}

#[test]
fn removing_one_network_keeps_the_other() {
    let (_dir, reg) = registry();
    reg.create_or_update_value("s", json!({"network": "preprod", "node": {}}))
        .unwrap();
    reg.create_or_update_value("s", json!({"network": "preview", "wallet": {}}))
        .unwrap();

    reg.remove("s", &remove("preprod", "node")).unwrap();
    assert!(reg.exists("s").unwrap());
    assert_eq!(
        reg.get("s").unwrap(),
        doc(json!({"preview": {"network": "preview", "wallet": {}}}))
    );
}

#[test]
fn unregistered_removal_is_noop() {
    let (_dir, reg) = registry();
    reg.create_or_update_value("s", json!({"network": "preprod", "node": {}}))
        .unwrap();
    let before = reg.get("s").unwrap();

    reg.remove("s", &remove("preprod", "wallet")).unwrap();
    reg.remove("s", &remove("mainnet", "node")).unwrap();
    reg.remove("other", &remove("preprod", "node")).unwrap();

    assert_eq!(reg.get("s").unwrap(), before);
    assert!(!reg.exists("other").unwrap());
}

#[test]
fn guard_checks_by_level() {
    let (_dir, reg) = registry();
    assert!(matches!(
        reg.network_or_raise("s", "preprod").unwrap_err(),
        Error::SessionNotExists { .. }
    ));

    reg.create_or_update_value("s", json!({"network": "preprod", "node": {}}))
        .unwrap();
    assert!(matches!(
        reg.network_or_raise("s", "mainnet").unwrap_err(),
        Error::SessionEnvNotUp { .. }
    ));
    assert!(matches!(
        reg.wallet_or_raise("s", "preprod").unwrap_err(),
        Error::SessionServiceNotUp { .. }
    ));
    reg.node_or_raise("s", "preprod").unwrap();
    assert_eq!(
        reg.service_record("s", "preprod", ServiceKind::Node)
            .unwrap()
            .0
            .len(),
        0
    );
}

#[test]
fn sessions_are_isolated() {
    let (_dir, reg) = registry();
    reg.create_or_update_value("a", json!({"network": "preprod", "node": {}}))
        .unwrap();
    reg.create_or_update_value("b", json!({"network": "preprod", "node": {}}))
        .unwrap();

    reg.destroy("a").unwrap();
    assert!(!reg.exists("a").unwrap());
    assert!(reg.exists("b").unwrap());
}

#[test]
fn documents_survive_a_new_registry_instance() {
    let dir = tempfile::tempdir().unwrap();
    SessionRegistry::open(dir.path())
        .create_or_update_value("s", json!({"network": "preprod", "wallet": {"port": 8091}}))
        .unwrap();

    let reopened = SessionRegistry::open(dir.path());
    let rec = reopened
        .service_record("s", "preprod", ServiceKind::Wallet)
        .unwrap();
    assert_eq!(rec.get_u64("port"), Some(8091));
}
