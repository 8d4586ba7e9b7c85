//! `ev-subscriber` — resilient client for long-lived server-sent event
//! streams.
//!
//! The subscriber connects to an event server, hands every event to a sink
//! in order, remembers the id of the last one, and keeps reconnecting across
//! network failures and server restarts without losing its place.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  Driver (CLI, service, test)                              │
//! │                                                           │
//! │   SubscriberBuilder::new()                                │
//! │       .endpoint("http://events:3000")                     │
//! │       .last_event_id("1042")                              │
//! │       .retry(true)                                        │
//! │       .build(transport)?                                  │
//! │       .run(&mut sink, shutdown)                           │
//! │       .await                                              │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Connection flow
//!
//! 1. Pre-flight: `GET <endpoint>/events/latest` for the server's latest id
//! 2. Open `<endpoint>/subscribe` with `Last-Event-ID`, `burst-count`, `burst-time`
//! 3. Handshake: the first frame must start with `:ok`, otherwise stop for good
//! 4. Stream: deliver events, advance the cursor, report catch-up once
//! 5. On end or error: wait per [`ReconnectBackoff`] and resume from the cursor
//!
//! Cancelling the shutdown token aborts the open connection and ends the
//! run cleanly, whatever state the subscriber is in.

pub mod builder;
pub mod debug;
pub mod reconnect;
pub mod sink;
pub mod subscriber;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::SubscriberBuilder;
pub use debug::{DebugLog, Silent, Stderr};
pub use reconnect::{next_delay, BackoffState, ReconnectBackoff};
pub use sink::EventSink;
pub use subscriber::{Subscriber, HANDSHAKE_PREFIX};
pub use types::{SubscriberError, SubscriptionConfig};

// Re-export the types drivers need so they never import lower crates directly.
pub use ev_domain::{Event, EventId};
pub use tokio_util::sync::CancellationToken;
