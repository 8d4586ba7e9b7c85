//! Debug output channel.
//!
//! Progress lines ("verifying endpoint", "retrying after ...") are written
//! through an injected [`DebugLog`] so the state machine never branches on a
//! debug flag.  [`Silent`] discards them, [`Stderr`] prints them.

/// Sink for human-readable progress lines.
pub trait DebugLog: Send + Sync {
    fn write(&self, line: &str);
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl DebugLog for Silent {
    fn write(&self, _line: &str) {}
}

/// Prints every line to stderr with a `[SUBSCRIBER]` prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stderr;

impl DebugLog for Stderr {
    fn write(&self, line: &str) {
        eprintln!("[SUBSCRIBER] {line}");
    }
}
