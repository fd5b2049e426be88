use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::domain::ProgressMessage;

/// Producer half handed to a worker thread
#[derive(Debug, Clone)]
pub struct ProgressSender {
    inner: UnboundedSender<ProgressMessage>,
}

impl ProgressSender {
    /// Returns false once the UI side is gone
    pub fn send(&self, message: ProgressMessage) -> bool {
        self.inner.send(message).is_ok()
    }
}

/// Unbounded FIFO from the worker thread to the UI. The UI drains it
/// without blocking on every timer tick.
#[derive(Debug)]
pub struct ProgressRelay {
    sender: UnboundedSender<ProgressMessage>,
    receiver: UnboundedReceiver<ProgressMessage>,
}

impl Default for ProgressRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRelay {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> ProgressSender {
        ProgressSender {
            inner: self.sender.clone(),
        }
    }

    /// Everything queued so far, in emission order
    pub fn drain(&mut self) -> Vec<ProgressMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn numbered(i: usize) -> ProgressMessage {
        ProgressMessage::Downloading {
            percent: 0.0,
            label: i.to_string(),
        }
    }

    #[test]
    fn test_drain_empty_does_not_block() {
        let mut relay = ProgressRelay::new();
        assert!(relay.drain().is_empty());
        assert!(relay.drain().is_empty());
    }

    #[test]
    fn test_drain_returns_messages_in_order() {
        let mut relay = ProgressRelay::new();
        let sender = relay.sender();
        sender.send(numbered(1));
        sender.send(ProgressMessage::Postprocessing {
            label: "converting".to_string(),
        });
        sender.send(ProgressMessage::Error {
            message: "boom".to_string(),
        });

        let drained = relay.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[0], numbered(1));
        assert!(drained[2].is_terminal());
        assert!(relay.drain().is_empty());
    }

    #[test]
    fn test_rapid_emission_is_lossless_and_ordered() {
        const COUNT: usize = 20_000;
        let mut relay = ProgressRelay::new();
        let sender = relay.sender();

        let producer = thread::spawn(move || {
            for i in 0..COUNT {
                assert!(sender.send(numbered(i)));
            }
        });

        // Drain concurrently with the producer, like the UI timer does
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut received = Vec::with_capacity(COUNT);
        while received.len() < COUNT {
            assert!(Instant::now() < deadline, "relay lost messages");
            received.extend(relay.drain());
            thread::yield_now();
        }
        producer.join().unwrap();

        assert!(relay.drain().is_empty());
        for (i, message) in received.iter().enumerate() {
            assert_eq!(message, &numbered(i));
        }
    }

    #[test]
    fn test_send_after_relay_dropped_reports_failure() {
        let relay = ProgressRelay::new();
        let sender = relay.sender();
        drop(relay);
        assert!(!sender.send(numbered(0)));
    }
}
