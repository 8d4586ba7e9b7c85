use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reconnect back-off
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "d_1000")]
    pub initial_delay_ms: u64,
    #[serde(default = "d_120000")]
    pub max_delay_ms: u64,
    /// Delay growth per consecutive failure:
    /// `next = current * (1 + growth_factor * failures)`.
    #[serde(default = "d_half")]
    pub growth_factor: f64,
    /// Consecutive retries before giving up.  `0` means never give up.
    #[serde(default)]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 120_000,
            growth_factor: 0.5,
            max_attempts: 0,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_1000() -> u64 {
    1_000
}
fn d_120000() -> u64 {
    120_000
}
fn d_half() -> f64 {
    0.5
}
