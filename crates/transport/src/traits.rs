//! The transport seam between the subscriber and the event server.

use async_trait::async_trait;
use ev_domain::stream::BoxStream;
use ev_domain::{Event, EventId};
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

/// Header carrying the subscriber's cursor.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";
/// Burst-tuning headers, forwarded untouched to the server.
pub const BURST_COUNT_HEADER: &str = "burst-count";
pub const BURST_TIME_HEADER: &str = "burst-time";

/// Trait for event-stream transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask the server for the id of its most recent event.
    ///
    /// `Ok(None)` means the server answered but has no events yet.
    async fn latest_event_id(&self, endpoint: &str) -> Result<Option<EventId>, TransportError>;

    /// Open one streaming connection to `url`.
    async fn open(&self, url: &str, headers: &SubscribeHeaders)
        -> Result<Connection, TransportError>;
}

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP: {0}")]
    Http(String),

    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("decode: {0}")]
    Decode(String),

    #[error("timeout: {0}")]
    Timeout(String),
}

/// Headers sent when opening the stream.  Unset values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeHeaders {
    pub last_event_id: Option<EventId>,
    pub burst_count: Option<u32>,
    pub burst_time: Option<u64>,
}

impl SubscribeHeaders {
    /// Header name/value pairs in wire form.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(ref id) = self.last_event_id {
            pairs.push((LAST_EVENT_ID_HEADER, id.to_string()));
        }
        if let Some(count) = self.burst_count {
            pairs.push((BURST_COUNT_HEADER, count.to_string()));
        }
        if let Some(time) = self.burst_time {
            pairs.push((BURST_TIME_HEADER, time.to_string()));
        }
        pairs
    }
}

/// One notification from an open stream.
///
/// Items arrive in the order the server produced them.  Events parsed out
/// of a frame are yielded after that frame.  `Error` is the last item of a
/// connection; the end of the sequence is the end-of-stream notification.
#[derive(Debug)]
pub enum StreamItem {
    /// A raw text chunk exactly as received.
    Frame(String),
    /// A complete event parsed from the frames.
    Event(Event),
    /// The connection failed.
    Error(TransportError),
}

/// An open stream: the item sequence plus its abort handle.
pub struct Connection {
    items: BoxStream<'static, StreamItem>,
    abort: CancellationToken,
}

impl Connection {
    /// Wrap an item stream.  Cancelling `abort` ends the stream at the next
    /// poll, which is what [`abort`](Self::abort) does.
    pub fn new(items: BoxStream<'static, StreamItem>, abort: CancellationToken) -> Self {
        let items = Box::pin(items.take_until(abort.clone().cancelled_owned()));
        Self { items, abort }
    }

    /// Next item, or `None` once the stream has ended or been aborted.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.items.next().await
    }

    /// Close the connection.  Safe to call more than once.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn unset_headers_are_not_sent() {
        let headers = SubscribeHeaders::default();
        assert!(headers.pairs().is_empty());
    }

    #[test]
    fn all_headers_in_wire_form() {
        let headers = SubscribeHeaders {
            last_event_id: Some(EventId::from("41")),
            burst_count: Some(100),
            burst_time: Some(250),
        };
        assert_eq!(
            headers.pairs(),
            vec![
                ("Last-Event-ID", "41".to_string()),
                ("burst-count", "100".to_string()),
                ("burst-time", "250".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn abort_ends_an_open_stream() {
        let items = stream::iter(vec![StreamItem::Frame(":ok\n\n".into())])
            .chain(stream::pending());
        let mut conn = Connection::new(Box::pin(items), CancellationToken::new());

        assert!(matches!(conn.next().await, Some(StreamItem::Frame(_))));
        conn.abort();
        conn.abort();
        assert!(conn.is_aborted());
        assert!(conn.next().await.is_none());
    }
}
