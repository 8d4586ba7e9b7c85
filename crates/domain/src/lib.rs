//! `ev-domain` — types shared by every crate of the event subscriber.
//!
//! - [`event`]: event identifiers and parsed events
//! - [`config`]: the TOML configuration file with serde defaults
//! - [`error`]: the shared error type
//! - [`stream`]: boxed stream alias used by transports and datasources

pub mod config;
pub mod error;
pub mod event;
pub mod stream;

pub use error::{Error, Result};
pub use event::{Event, EventId, LatestEvent};
