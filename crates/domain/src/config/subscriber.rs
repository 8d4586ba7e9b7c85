use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Subscription
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What to subscribe to and how.  Every field can be overridden from the
/// command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberConfig {
    /// Base URL of the event server (e.g. `http://localhost:3000`).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Cursor to resume from.  `None` starts from whatever the server sends
    /// to a fresh subscriber.
    #[serde(default)]
    pub last_event_id: Option<String>,
    /// Forwarded as the `burst-count` header.
    #[serde(default)]
    pub burst_count: Option<u32>,
    /// Forwarded as the `burst-time` header (milliseconds).
    #[serde(default)]
    pub burst_time: Option<u64>,
    /// Write progress and errors to stderr.
    #[serde(default)]
    pub debug: bool,
    /// Reconnect after the server ends the stream.
    #[serde(default)]
    pub retry: bool,
}
