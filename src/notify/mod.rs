//! Connectivity handles and fire-and-forget notification delivery
//!
//! A [`ClientHandle`] is an opaque reference to one connected party: the
//! transport layer creates one per connection and the core pushes outbound
//! notifications through it. Delivery is fire-and-forget; there is no
//! acknowledgment and no backpressure. If the party is gone the notification
//! is dropped, matching the fire-and-forget nature of signaling.
//!
//! Notifications pushed through one handle are delivered in order, which is
//! what gives per-session signaling its ordering guarantee.

use tokio::sync::mpsc;

use crate::protocol::event::OutboundEvent;

/// Unique identifier for one connection
///
/// Allocated by the transport listener. Used as the back-reference for
/// cleanup-on-disconnect: the registry and user directory scan for entries
/// holding a matching id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for pushing asynchronous notifications to one connected party
///
/// Cheap to clone; all clones feed the same connection's writer task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: HandleId,
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl ClientHandle {
    /// Create a handle backed by an existing sender
    pub fn new(id: HandleId, tx: mpsc::UnboundedSender<OutboundEvent>) -> Self {
        Self { id, tx }
    }

    /// Create a handle together with the receiving end of its channel
    ///
    /// The transport's writer task (or a test) drains the receiver.
    pub fn channel(id: HandleId) -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    /// The connection id this handle delivers to
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Push a notification to the party behind this handle
    ///
    /// No delivery guarantee: if the connection is already gone the event is
    /// dropped.
    pub fn notify(&self, event: OutboundEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!(handle_id = %self.id, "Notification target gone, dropping");
        }
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_delivers_in_order() {
        let (handle, mut rx) = ClientHandle::channel(HandleId(1));

        handle.notify(OutboundEvent::CallEnded { session_id: 1.into() });
        handle.notify(OutboundEvent::CallEnded { session_id: 2.into() });

        assert!(matches!(
            rx.recv().await,
            Some(OutboundEvent::CallEnded { session_id }) if session_id == 1.into()
        ));
        assert!(matches!(
            rx.recv().await,
            Some(OutboundEvent::CallEnded { session_id }) if session_id == 2.into()
        ));
    }

    #[tokio::test]
    async fn test_notify_after_receiver_dropped_is_silent() {
        let (handle, rx) = ClientHandle::channel(HandleId(1));
        drop(rx);

        // Must not panic or error
        handle.notify(OutboundEvent::CallEnded { session_id: 1.into() });
    }

    #[test]
    fn test_handle_equality_by_id() {
        let (a, _rx_a) = ClientHandle::channel(HandleId(7));
        let (b, _rx_b) = ClientHandle::channel(HandleId(7));
        let (c, _rx_c) = ClientHandle::channel(HandleId(8));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
