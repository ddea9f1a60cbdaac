//! Typed session document.
//!
//! On disk a session is a JSON object keyed by network name:
//!
//! ```json
//! {
//!   "preprod": {
//!     "network": "preprod",
//!     "node":   { "service": "NODE_preprod_0", "socket_path": "..." },
//!     "wallet": { "service": "WALLET_preprod_0", "port": 8090 }
//!   }
//! }
//! ```
//!
//! Service records are opaque to the registry; only slot occupancy matters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cu_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Service kind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The two service slots of a network entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Node,
    Wallet,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Wallet => "wallet",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "node" => Ok(Self::Node),
            "wallet" => Ok(Self::Wallet),
            other => Err(Error::InvalidArgument(format!(
                "service should be 'node' or 'wallet', got '{other}'"
            ))),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Service record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Caller-supplied description of a running service (process handle,
/// log path, socket, port, version, launch command...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRecord(pub Map<String, Value>);

impl ServiceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }
}

impl From<Map<String, Value>> for ServiceRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Network entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Services registered for one network environment within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<ServiceRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<ServiceRecord>,
    /// Non-slot fields supplied alongside a registration.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkEntry {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            node: None,
            wallet: None,
            extra: Map::new(),
        }
    }

    pub fn slot(&self, kind: ServiceKind) -> Option<&ServiceRecord> {
        match kind {
            ServiceKind::Node => self.node.as_ref(),
            ServiceKind::Wallet => self.wallet.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: ServiceKind) -> &mut Option<ServiceRecord> {
        match kind {
            ServiceKind::Node => &mut self.node,
            ServiceKind::Wallet => &mut self.wallet,
        }
    }

    /// True when neither slot is occupied.
    pub fn is_vacant(&self) -> bool {
        self.node.is_none() && self.wallet.is_none()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session document
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whole persisted state of one session: network name -> entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionDocument(BTreeMap<String, NetworkEntry>);

impl SessionDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, network: &str) -> Option<&NetworkEntry> {
        self.0.get(network)
    }

    pub(crate) fn get_mut(&mut self, network: &str) -> Option<&mut NetworkEntry> {
        self.0.get_mut(network)
    }

    pub(crate) fn insert(&mut self, entry: NetworkEntry) {
        self.0.insert(entry.network.clone(), entry);
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NetworkEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Clear one slot, dropping the network entry once both slots are empty.
    ///
    /// Returns `None` when nothing changed, otherwise `Some(network_dropped)`.
    pub(crate) fn remove_service(&mut self, network: &str, kind: ServiceKind) -> Option<bool> {
        let entry = self.0.get_mut(network)?;
        let removed = entry.slot_mut(kind).take().is_some();
        if entry.is_vacant() {
            self.0.remove(network);
            return Some(true);
        }
        removed.then_some(false)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry inputs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Field names of a [`NetworkEntry`] that `extra` must not carry.
const RESERVED_KEYS: [&str; 3] = ["network", "node", "wallet"];

/// Input to [`SessionRegistry::create_or_update`](crate::SessionRegistry::create_or_update).
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDetails {
    pub network: String,
    pub node: Option<ServiceRecord>,
    pub wallet: Option<ServiceRecord>,
    pub extra: Map<String, Value>,
}

impl ServiceDetails {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            node: None,
            wallet: None,
            extra: Map::new(),
        }
    }

    pub fn node(network: impl Into<String>, record: ServiceRecord) -> Self {
        Self::new(network).with_node(record)
    }

    pub fn wallet(network: impl Into<String>, record: ServiceRecord) -> Self {
        Self::new(network).with_wallet(record)
    }

    pub fn with_node(mut self, record: ServiceRecord) -> Self {
        self.node = Some(record);
        self
    }

    pub fn with_wallet(mut self, record: ServiceRecord) -> Self {
        self.wallet = Some(record);
        self
    }

    /// Slots this call tries to occupy, node first.
    pub fn kinds(&self) -> Vec<ServiceKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.node.is_some() {
            kinds.push(ServiceKind::Node);
        }
        if self.wallet.is_some() {
            kinds.push(ServiceKind::Wallet);
        }
        kinds
    }

    /// Validate an untyped mapping such as `{"network": "preprod", "node": {...}}`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidArgument(
                "service_details should be an object".into(),
            ));
        };
        let network = take_network(&mut map, "service_details")?;
        let node = take_slot(&mut map, ServiceKind::Node)?;
        let wallet = take_slot(&mut map, ServiceKind::Wallet)?;
        Ok(Self {
            network,
            node,
            wallet,
            extra: map,
        })
    }

    /// Reject `extra` keys that would collide with the entry's own fields.
    pub fn check_reserved_keys(&self) -> Result<()> {
        match RESERVED_KEYS.iter().find(|k| self.extra.contains_key(**k)) {
            Some(key) => Err(Error::InvalidArgument(format!(
                "service_details extra field '{key}' is reserved"
            ))),
            None => Ok(()),
        }
    }

    pub(crate) fn into_entry(self) -> NetworkEntry {
        NetworkEntry {
            network: self.network,
            node: self.node,
            wallet: self.wallet,
            extra: self.extra,
        }
    }
}

/// Input to [`SessionRegistry::remove`](crate::SessionRegistry::remove).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRequest {
    pub network: String,
    pub service: ServiceKind,
}

impl RemoveRequest {
    pub fn new(network: impl Into<String>, service: ServiceKind) -> Self {
        Self {
            network: network.into(),
            service,
        }
    }

    /// Validate an untyped mapping such as `{"network": "preprod", "service": "node"}`.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidArgument(
                "remove request should be an object".into(),
            ));
        };
        let network = take_network(&mut map, "remove request")?;
        let service = match map.remove("service") {
            Some(Value::String(s)) => s.parse()?,
            _ => {
                return Err(Error::InvalidArgument(
                    "remove request should have service".into(),
                ))
            }
        };
        Ok(Self { network, service })
    }
}

fn take_network(map: &mut Map<String, Value>, what: &str) -> Result<String> {
    match map.remove("network") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        None | Some(Value::Null) => Err(Error::InvalidArgument(format!(
            "{what} should have network"
        ))),
        Some(other) => Err(Error::InvalidArgument(format!(
            "{what} network should be a non-empty string, got {other}"
        ))),
    }
}

fn take_slot(map: &mut Map<String, Value>, kind: ServiceKind) -> Result<Option<ServiceRecord>> {
    match map.remove(kind.as_str()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(record)) => Ok(Some(ServiceRecord(record))),
        Some(other) => Err(Error::InvalidArgument(format!(
            "{kind} should be an object, got {other}"
        ))),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
