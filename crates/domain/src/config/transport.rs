use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Transport timeouts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// TCP/TLS connect timeout for every request.
    #[serde(default = "d_10000")]
    pub connect_timeout_ms: u64,
    /// Total timeout of the `events/latest` request.  The event stream
    /// itself never times out.
    #[serde(default = "d_10000")]
    pub preflight_timeout_ms: u64,
    /// How long to wait for the `:ok` frame after the stream opens.
    #[serde(default = "d_10000")]
    pub handshake_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            preflight_timeout_ms: 10_000,
            handshake_timeout_ms: 10_000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_10000() -> u64 {
    10_000
}
