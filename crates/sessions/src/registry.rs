//! Session registry: validates and applies changes to a session document.
//!
//! Every operation loads the document, mutates an in-memory copy and only
//! persists once the whole call has been validated, so a rejected call
//! leaves the stored document untouched.
//!
//! Without the advisory lock, two invocations against the same session can
//! interleave between read and write and the last writer wins.  Enabling
//! [`SessionRegistry::with_advisory_lock`] serialises them through an
//! exclusive `fs2` lock on `.session-<name>.lock`.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::Serialize;
use serde_json::Value;

use cu_domain::error::{Error, Result};
use cu_domain::trace::TraceEvent;

use crate::model::{RemoveRequest, ServiceDetails, SessionDocument};
use crate::store::{validate_session_name, SessionStore};

/// Listing entry returned by [`SessionRegistry::list`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub name: String,
    pub networks: Vec<String>,
    pub modified: Option<DateTime<Utc>>,
}

/// How a registration changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Created,
    NetworkAdded,
    Merged,
    /// Nothing to store: the call named no slot for a new network entry.
    Pruned,
}

#[derive(Debug, Clone)]
pub struct SessionRegistry {
    store: SessionStore,
    advisory_lock: bool,
}

impl SessionRegistry {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            advisory_lock: false,
        }
    }

    /// Registry over `<base_dir>/.session-*.json`.
    pub fn open(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(SessionStore::new(base_dir))
    }

    pub fn with_advisory_lock(mut self, enabled: bool) -> Self {
        self.advisory_lock = enabled;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// True when the session has a non-empty document.
    pub fn exists(&self, session: &str) -> Result<bool> {
        Ok(self
            .store
            .read(session)?
            .is_some_and(|doc| !doc.is_empty()))
    }

    /// The session document, empty when the session has no record.
    pub fn get(&self, session: &str) -> Result<SessionDocument> {
        Ok(self.store.read(session)?.unwrap_or_default())
    }

    /// Register a service for `(session, details.network)`.
    ///
    /// Fails with [`Error::SessionHasNode`] / [`Error::SessionHasWallet`]
    /// when the call would occupy a slot that is already taken; the node
    /// slot is checked first.  Returns the document as persisted.
    pub fn create_or_update(
        &self,
        session: &str,
        details: ServiceDetails,
    ) -> Result<SessionDocument> {
        validate_session_name(session)?;
        details.check_reserved_keys()?;
        let _lock = self.lock(session)?;

        let mut doc = self.get(session)?;
        let network = details.network.clone();
        let kinds = details.kinds();

        let applied = apply(&mut doc, session, details)?;

        match applied {
            Applied::Pruned if !doc.is_empty() => {
                tracing::debug!(session, network = %network, "no service named; nothing stored");
                return Ok(doc);
            }
            Applied::Pruned => {
                tracing::debug!(session, network = %network, "no service named; nothing stored");
            }
            Applied::Created => TraceEvent::SessionCreated {
                session: session.to_owned(),
                network: network.clone(),
            }
            .emit(),
            Applied::NetworkAdded => TraceEvent::NetworkAdded {
                session: session.to_owned(),
                network: network.clone(),
            }
            .emit(),
            Applied::Merged => {}
        }

        self.persist(session, &doc)?;

        for kind in kinds {
            TraceEvent::ServiceRegistered {
                session: session.to_owned(),
                network: network.clone(),
                service: kind.to_string(),
            }
            .emit();
        }
        Ok(doc)
    }

    /// Like [`create_or_update`](Self::create_or_update) for an untyped
    /// mapping, validated with [`ServiceDetails::from_value`].
    pub fn create_or_update_value(&self, session: &str, details: Value) -> Result<SessionDocument> {
        self.create_or_update(session, ServiceDetails::from_value(details)?)
    }

    /// Clear one service slot.  Missing sessions, networks and slots are
    /// silent no-ops.  The document is deleted once it becomes empty.
    pub fn remove(&self, session: &str, request: &RemoveRequest) -> Result<()> {
        if !self.store.path_for(session)?.exists() {
            tracing::debug!(session, "remove on unknown session ignored");
            return Ok(());
        }
        let _lock = self.lock(session)?;

        let Some(mut doc) = self.store.read(session)? else {
            tracing::debug!(session, "remove on unknown session ignored");
            return Ok(());
        };

        match doc.remove_service(&request.network, request.service) {
            Some(network_dropped) => {
                self.persist(session, &doc)?;
                TraceEvent::ServiceRemoved {
                    session: session.to_owned(),
                    network: request.network.clone(),
                    service: request.service.to_string(),
                    network_dropped,
                }
                .emit();
            }
            None => {
                tracing::debug!(
                    session,
                    network = %request.network,
                    service = %request.service,
                    "nothing registered; remove ignored"
                );
                if doc.is_empty() {
                    self.persist(session, &doc)?;
                }
            }
        }
        Ok(())
    }

    /// Delete the session's document unconditionally.
    pub fn destroy(&self, session: &str) -> Result<()> {
        if self.store.delete(session)? {
            TraceEvent::SessionDestroyed {
                session: session.to_owned(),
            }
            .emit();
        }
        Ok(())
    }

    /// Delete every session document under the base directory.  Returns
    /// the number of sessions removed.
    pub fn destroy_all(&self) -> Result<usize> {
        let mut removed = 0;
        for stored in self.store.list()? {
            if self.store.delete(&stored.name)? {
                TraceEvent::SessionDestroyed {
                    session: stored.name,
                }
                .emit();
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Summaries of every session on disk.  Unreadable documents are
    /// skipped with a warning.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let mut summaries = Vec::new();
        for stored in self.store.list()? {
            match self.store.read(&stored.name) {
                Ok(Some(doc)) if doc.is_empty() => {}
                Ok(Some(doc)) => summaries.push(SessionSummary {
                    networks: doc.networks().map(str::to_owned).collect(),
                    name: stored.name,
                    modified: stored.modified,
                }),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(session = %stored.name, error = %e, "skipping unreadable session");
                }
            }
        }
        Ok(summaries)
    }

    // ── internals ─────────────────────────────────────────────────────

    /// Write `doc`, or delete the record outright when it is empty.
    fn persist(&self, session: &str, doc: &SessionDocument) -> Result<()> {
        if doc.is_empty() {
            if self.store.delete(session)? {
                TraceEvent::SessionDestroyed {
                    session: session.to_owned(),
                }
                .emit();
            }
        } else {
            self.store.write(session, doc)?;
        }
        Ok(())
    }

    /// Take the advisory lock when enabled.  Released when the handle drops.
    fn lock(&self, session: &str) -> Result<Option<File>> {
        if !self.advisory_lock {
            return Ok(None);
        }
        let path = self.store.lock_path_for(session)?;
        let base = self.store.base_dir();
        std::fs::create_dir_all(base).map_err(|e| Error::storage(base, e))?;

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| Error::storage(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| Error::storage(&path, e))?;
        tracing::trace!(session, path = %path.display(), "session lock acquired");
        Ok(Some(file))
    }
}

/// Apply a registration to the in-memory document.
///
/// On error `doc` is left exactly as it was.
fn apply(doc: &mut SessionDocument, session: &str, details: ServiceDetails) -> Result<Applied> {
    let has_slots = details.node.is_some() || details.wallet.is_some();

    if doc.is_empty() {
        if !has_slots {
            return Ok(Applied::Pruned);
        }
        doc.insert(details.into_entry());
        return Ok(Applied::Created);
    }

    let Some(entry) = doc.get_mut(&details.network) else {
        if !has_slots {
            return Ok(Applied::Pruned);
        }
        doc.insert(details.into_entry());
        return Ok(Applied::NetworkAdded);
    };

    if details.node.is_some() && entry.node.is_some() {
        return Err(Error::SessionHasNode {
            session: session.to_owned(),
            network: details.network,
        });
    }
    if details.wallet.is_some() && entry.wallet.is_some() {
        return Err(Error::SessionHasWallet {
            session: session.to_owned(),
            network: details.network,
        });
    }

    entry.extra.extend(details.extra);
    if details.node.is_some() {
        entry.node = details.node;
    }
    if details.wallet.is_some() {
        entry.wallet = details.wallet;
    }
    Ok(Applied::Merged)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
