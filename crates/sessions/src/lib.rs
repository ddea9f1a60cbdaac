//! Session registry for cardano-up.
//!
//! Tracks which node and wallet services are running, keyed by a session
//! name and a network environment.  Each session is one JSON document on
//! disk; every registry call is an independent read-modify-write cycle
//! with no state kept between calls.

pub mod model;
pub mod query;
pub mod registry;
pub mod store;

pub use model::{
    NetworkEntry, RemoveRequest, ServiceDetails, ServiceKind, ServiceRecord, SessionDocument,
};
pub use registry::{SessionRegistry, SessionSummary};
pub use store::SessionStore;
