use serde::Serialize;

/// Structured trace events emitted by the session registry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session: String,
        network: String,
    },
    NetworkAdded {
        session: String,
        network: String,
    },
    ServiceRegistered {
        session: String,
        network: String,
        service: String,
    },
    ServiceRemoved {
        session: String,
        network: String,
        service: String,
        network_dropped: bool,
    },
    SessionDestroyed {
        session: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cu_event");
    }
}
