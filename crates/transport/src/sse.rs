//! Server-sent-events framing.
//!
//! The body of `<endpoint>/subscribe` is an SSE stream: blocks delimited by
//! a blank line, each made of `field: value` lines.  The server opens with a
//! `:ok` comment and then sends one `data:` JSON object per event.
//!
//! - [`drain_data_blocks`] -- pull complete `data:` payloads from a buffer
//! - [`sse_item_stream`] -- turn a body chunk stream into [`StreamItem`]s

use ev_domain::stream::BoxStream;
use ev_domain::Event;
use futures_util::{Stream, StreamExt};

use crate::traits::{StreamItem, TransportError};

/// Extract complete `data:` payloads from an SSE buffer.
///
/// Blocks are delimited by `\n\n`.  Within a block, `data:` lines are joined
/// with `\n`; `event:`, `id:`, `retry:` and comment lines (`:ok`, heartbeats)
/// are ignored.  A block without data yields nothing.
///
/// The buffer is drained in-place: consumed bytes are removed and any
/// trailing partial block remains for the next call.
pub fn drain_data_blocks(buffer: &mut String) -> Vec<String> {
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }

    let mut payloads = Vec::new();

    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos).collect();
        buffer.drain(..2); // remove the \n\n delimiter

        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.strip_prefix(' ').unwrap_or(data))
            .collect();

        if data.is_empty() {
            continue;
        }
        let payload = data.join("\n");
        if !payload.trim().is_empty() {
            payloads.push(payload);
        }
    }

    payloads
}

/// Decode the complete UTF-8 prefix of `pending`, leaving a trailing
/// partial character in place for the next chunk.  Invalid bytes are
/// replaced with U+FFFD.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending.as_slice()) {
        Ok(text) => {
            let text = text.to_owned();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let complete: Vec<u8> = pending.drain(..e.valid_up_to()).collect();
            String::from_utf8_lossy(&complete).into_owned()
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending.as_slice()).into_owned();
            pending.clear();
            text
        }
    }
}

/// Build the item stream of one connection from its body chunks.
///
/// Every chunk is yielded as a [`StreamItem::Frame`] first, followed by the
/// events it completed.  A character split across chunks is held back until
/// its last byte arrives.  A chunk error is yielded as [`StreamItem::Error`]
/// and ends the stream.  When the body closes cleanly any remaining partial
/// block is flushed before the stream ends.
pub fn sse_item_stream<S, B>(chunks: S) -> BoxStream<'static, StreamItem>
where
    S: Stream<Item = Result<B, TransportError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut buffer = String::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut failed = false;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    pending.extend_from_slice(bytes.as_ref());
                    let text = take_utf8(&mut pending);
                    if text.is_empty() {
                        continue;
                    }
                    buffer.push_str(&text);
                    yield StreamItem::Frame(text);

                    for data in drain_data_blocks(&mut buffer) {
                        if let Some(event) = parse_event(&data) {
                            yield StreamItem::Event(event);
                        }
                    }
                }
                Err(e) => {
                    yield StreamItem::Error(e);
                    failed = true;
                    break;
                }
            }
        }

        if !failed && !pending.is_empty() {
            let text = String::from_utf8_lossy(&pending).into_owned();
            buffer.push_str(&text);
            yield StreamItem::Frame(text);
        }

        if !failed && !buffer.trim().is_empty() {
            buffer.push_str("\n\n");
            for data in drain_data_blocks(&mut buffer) {
                if let Some(event) = parse_event(&data) {
                    yield StreamItem::Event(event);
                }
            }
        }
    };

    Box::pin(stream)
}

fn parse_event(data: &str) -> Option<Event> {
    match Event::parse(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, data = %data, "skipping malformed event payload");
            None
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use ev_domain::EventId;
    use futures_util::stream;

    #[test]
    fn drain_single_complete_block() {
        let mut buf = String::from("event: message\ndata: {\"id\":1}\n\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["{\"id\":1}"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_skips_handshake_comment() {
        let mut buf = String::from(":ok\n\ndata: {\"id\":1}\n\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["{\"id\":1}"]);
    }

    #[test]
    fn drain_partial_block_stays_in_buffer() {
        let mut buf = String::from("data: complete\n\ndata: partial");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["complete"]);
        assert_eq!(buf, "data: partial");
    }

    #[test]
    fn drain_joins_multiline_data() {
        let mut buf = String::from("data: {\"id\":1,\ndata: \"k\":\"v\"}\n\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["{\"id\":1,\n\"k\":\"v\"}"]);
    }

    #[test]
    fn drain_normalizes_crlf() {
        let mut buf = String::from(":ok\r\n\r\ndata: one\r\n\r\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["one"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_ignores_non_data_lines() {
        let mut buf = String::from("event: ping\nid: 42\nretry: 5000\ndata: payload\n\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["payload"]);
    }

    #[test]
    fn drain_skips_empty_data() {
        let mut buf = String::from("data: \n\n");
        assert!(drain_data_blocks(&mut buf).is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn drain_incremental_buffering() {
        let mut buf = String::from("data: chunk1");
        assert!(drain_data_blocks(&mut buf).is_empty());

        buf.push_str("\n\ndata: chunk2\n\n");
        let payloads = drain_data_blocks(&mut buf);
        assert_eq!(payloads, vec!["chunk1", "chunk2"]);
        assert!(buf.is_empty());
    }

    fn ids(items: &[StreamItem]) -> Vec<EventId> {
        items
            .iter()
            .filter_map(|item| match item {
                StreamItem::Event(e) => Some(e.id().clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn frames_precede_their_events() {
        let chunks = stream::iter(vec![
            Ok::<_, TransportError>(":ok\n\ndata: {\"id\":1}\n\n"),
            Ok("data: {\"id\":2}\n"),
            Ok("\ndata: {\"id\":3}\n\n"),
        ]);
        let items: Vec<StreamItem> = sse_item_stream(chunks).collect().await;

        assert_eq!(items.len(), 6);
        assert!(matches!(&items[0], StreamItem::Frame(f) if f.starts_with(":ok")));
        assert!(matches!(&items[1], StreamItem::Event(e) if e.id().as_str() == "1"));
        assert!(matches!(&items[2], StreamItem::Frame(_)));
        assert!(matches!(&items[3], StreamItem::Frame(_)));
        assert_eq!(
            ids(&items),
            vec![EventId::from("1"), EventId::from("2"), EventId::from("3")]
        );
    }

    #[tokio::test]
    async fn malformed_payloads_are_skipped() {
        let chunks = stream::iter(vec![Ok::<_, TransportError>(
            ":ok\n\ndata: not-json\n\ndata: {\"no_id\":true}\n\ndata: {\"id\":\"a\"}\n\n",
        )]);
        let items: Vec<StreamItem> = sse_item_stream(chunks).collect().await;
        assert_eq!(ids(&items), vec![EventId::from("a")]);
    }

    #[tokio::test]
    async fn error_ends_the_stream() {
        let chunks = stream::iter(vec![
            Ok(":ok\n\n"),
            Err(TransportError::Http("connection reset".into())),
            Ok("data: {\"id\":9}\n\n"),
        ]);
        let items: Vec<StreamItem> = sse_item_stream(chunks).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], StreamItem::Error(TransportError::Http(_))));
    }

    #[tokio::test]
    async fn character_split_across_chunks_is_kept_whole() {
        let body = ":ok\n\ndata: {\"id\":1,\"name\":\"café\"}\n\n".as_bytes();
        let cut = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let chunks = stream::iter(vec![
            Ok::<_, TransportError>(body[..cut].to_vec()),
            Ok(body[cut..].to_vec()),
        ]);
        let items: Vec<StreamItem> = sse_item_stream(chunks).collect().await;

        let frames: String = items
            .iter()
            .filter_map(|item| match item {
                StreamItem::Frame(f) => Some(f.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(frames.as_bytes(), body);

        let event = items
            .iter()
            .find_map(|item| match item {
                StreamItem::Event(e) => Some(e),
                _ => None,
            })
            .expect("event delivered");
        assert_eq!(event.payload()["name"], "café");
    }

    #[test]
    fn utf8_tail_is_held_back() {
        let mut pending = "ab".as_bytes().to_vec();
        pending.push(0xC3);
        assert_eq!(take_utf8(&mut pending), "ab");
        assert_eq!(pending, vec![0xC3]);

        pending.push(0xA9);
        assert_eq!(take_utf8(&mut pending), "é");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn trailing_block_flushed_on_close() {
        let chunks = stream::iter(vec![Ok::<_, TransportError>(":ok\n\ndata: {\"id\":5}")]);
        let items: Vec<StreamItem> = sse_item_stream(chunks).collect().await;
        assert_eq!(ids(&items), vec![EventId::from(5u64)]);
    }
}
