//! Where delivered events go.

use ev_domain::Event;

/// Receives every event of the subscription, in stream order.
///
/// Returning an error stops the subscription: the connection is aborted and
/// [`SubscriberError::Sink`](crate::SubscriberError::Sink) is returned.
pub trait EventSink: Send {
    fn deliver(&mut self, event: &Event) -> anyhow::Result<()>;
}

impl<F> EventSink for F
where
    F: FnMut(&Event) -> anyhow::Result<()> + Send,
{
    fn deliver(&mut self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}
