use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session registry behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionsConfig {
    /// Hold an exclusive advisory lock on `.session-<name>.lock` for the
    /// whole read-modify-write cycle of every registry mutation.
    ///
    /// Off by default: concurrent invocations against the same session can
    /// then race between read and write, and the last writer wins.
    #[serde(default)]
    pub advisory_lock: bool,
}
