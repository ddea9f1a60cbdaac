//! Guard checks used before acting on a running service.

use cu_domain::error::{Error, Result};

use crate::model::{NetworkEntry, ServiceKind, ServiceRecord};
use crate::registry::SessionRegistry;

impl SessionRegistry {
    /// Fail unless the session has an entry for `network`.
    pub fn network_or_raise(&self, session: &str, network: &str) -> Result<()> {
        self.network_entry(session, network).map(drop)
    }

    /// Fail unless a node is registered for `(session, network)`.
    pub fn node_or_raise(&self, session: &str, network: &str) -> Result<()> {
        self.service_record(session, network, ServiceKind::Node)
            .map(drop)
    }

    /// Fail unless a wallet is registered for `(session, network)`.
    pub fn wallet_or_raise(&self, session: &str, network: &str) -> Result<()> {
        self.service_record(session, network, ServiceKind::Wallet)
            .map(drop)
    }

    /// The record occupying `kind` for `(session, network)`.
    pub fn service_record(
        &self,
        session: &str,
        network: &str,
        kind: ServiceKind,
    ) -> Result<ServiceRecord> {
        let entry = self.network_entry(session, network)?;
        entry
            .slot(kind)
            .cloned()
            .ok_or_else(|| Error::SessionServiceNotUp {
                session: session.to_owned(),
                network: network.to_owned(),
                service: kind.to_string(),
            })
    }

    fn network_entry(&self, session: &str, network: &str) -> Result<NetworkEntry> {
        let doc = self.get(session)?;
        if doc.is_empty() {
            return Err(Error::SessionNotExists {
                session: session.to_owned(),
            });
        }
        doc.get(network)
            .cloned()
            .ok_or_else(|| Error::SessionEnvNotUp {
                session: session.to_owned(),
                network: network.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceDetails;
    use cu_domain::error::ErrorKind;

    #[test]
    fn guards_report_the_missing_level() {
        let dir = tempfile::tempdir().unwrap();
        let reg = SessionRegistry::open(dir.path());

        assert!(matches!(
            reg.network_or_raise("s", "mainnet"),
            Err(Error::SessionNotExists { .. })
        ));

        let wallet = ServiceRecord::new()
            .with("service", "WALLET_preprod_0")
            .with("port", 8090);
        reg.create_or_update("s", ServiceDetails::wallet("preprod", wallet))
            .unwrap();

        assert!(matches!(
            reg.network_or_raise("s", "mainnet"),
            Err(Error::SessionEnvNotUp { .. })
        ));
        reg.network_or_raise("s", "preprod").unwrap();
        reg.wallet_or_raise("s", "preprod").unwrap();

        let err = reg.node_or_raise("s", "preprod").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("no node up"));

        let rec = reg
            .service_record("s", "preprod", ServiceKind::Wallet)
            .unwrap();
        assert_eq!(rec.get_u64("port"), Some(8090));
    }
}
