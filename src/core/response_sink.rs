//! # Response sink
//!
//! Callers receive results of every operation as JSON encoded envelopes
//! pushed into a [`ResponseSink`].

use async_channel::{Receiver, Sender, TrySendError};
use log::{debug, warn};

/// Destination for operation results.
///
/// Thin wrapper around [`async_channel::Sender`]. Delivery never blocks: if
/// the receiving side is gone or the channel is full, the envelope is
/// dropped and logged.
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::ResponseSink;
///
/// let (sink, receiver) = ResponseSink::unbounded();
/// # drop(sink);
/// # drop(receiver);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseSink {
    sender: Sender<Vec<u8>>,
}

impl ResponseSink {
    /// Create sink which pushes envelopes into provided channel.
    pub fn new(sender: Sender<Vec<u8>>) -> Self {
        Self { sender }
    }

    /// Create sink backed by unbounded channel.
    ///
    /// Returns sink and receiver which should be used to read envelopes.
    pub fn unbounded() -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = async_channel::unbounded();
        (Self::new(sender), receiver)
    }

    /// Create sink backed by bounded channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (sender, receiver) = async_channel::bounded(capacity);
        (Self::new(sender), receiver)
    }

    /// Whether there is anyone who listens for envelopes.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Push envelope into sink.
    ///
    /// Returns `false` if envelope has been dropped.
    pub(crate) fn deliver(&self, envelope: Vec<u8>) -> bool {
        match self.sender.try_send(envelope) {
            Ok(_) => true,
            Err(TrySendError::Full(envelope)) => {
                warn!(
                    "Response sink is full, dropping envelope: {}",
                    String::from_utf8_lossy(&envelope)
                );
                false
            }
            Err(TrySendError::Closed(envelope)) => {
                debug!(
                    "Response sink is closed, dropping envelope: {}",
                    String::from_utf8_lossy(&envelope)
                );
                false
            }
        }
    }
}

impl From<Sender<Vec<u8>>> for ResponseSink {
    fn from(sender: Sender<Vec<u8>>) -> Self {
        Self::new(sender)
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn deliver_envelope() {
        let (sink, receiver) = ResponseSink::unbounded();

        assert!(sink.deliver(b"[1]".to_vec()));
        assert_eq!(receiver.try_recv().unwrap(), b"[1]".to_vec());
    }

    #[test]
    fn drop_envelope_when_full() {
        let (sink, receiver) = ResponseSink::bounded(1);

        assert!(sink.deliver(b"[1]".to_vec()));
        assert!(!sink.deliver(b"[2]".to_vec()));
        assert_eq!(receiver.len(), 1);
    }

    #[test]
    fn drop_envelope_when_closed() {
        let (sink, receiver) = ResponseSink::unbounded();
        drop(receiver);

        assert!(sink.is_closed());
        assert!(!sink.deliver(b"[1]".to_vec()));
    }
}
