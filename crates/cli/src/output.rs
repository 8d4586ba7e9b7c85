use std::io::Write;

use ev_subscriber::{Event, EventSink};

/// Writes each event as one compact JSON line.
pub struct JsonLines<W> {
    out: W,
}

impl<W: Write + Send> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> EventSink for JsonLines<W> {
    fn deliver(&mut self, event: &Event) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, event.payload())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
