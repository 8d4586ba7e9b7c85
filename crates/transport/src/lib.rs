//! `ev-transport` — the event-stream transport used by the subscriber.
//!
//! A [`Transport`] answers two questions for the subscriber: what is the
//! server's latest event id (`GET <endpoint>/events/latest`), and what does
//! the stream at `<endpoint>/subscribe` deliver.  The stream is exposed as a
//! [`Connection`]: one ordered sequence of [`StreamItem`]s carrying raw
//! frames, parsed events and errors, plus an abort handle.
//!
//! [`HttpTransport`] is the production implementation on top of `reqwest`;
//! tests plug in scripted transports through the same trait.

pub mod http;
pub mod sse;
pub mod traits;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use http::{from_reqwest, HttpTransport};
pub use traits::{
    Connection, StreamItem, SubscribeHeaders, Transport, TransportError, BURST_COUNT_HEADER,
    BURST_TIME_HEADER, LAST_EVENT_ID_HEADER,
};
