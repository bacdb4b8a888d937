use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::{watch, Notify};

use crate::types::Frame;

pub(crate) enum Wake {
    Item,
    Closed,
}

/// FIFO of frames waiting to be pulled by the transport, plus the signals a
/// waiting consumer wakes on.
pub(crate) struct OutboundQueue {
    items: Mutex<VecDeque<Frame>>,
    item_signal: Notify,
    close_signal: watch::Sender<bool>,
}

impl OutboundQueue {
    pub(crate) fn new() -> Self {
        let (close_signal, _) = watch::channel(false);
        Self {
            items: Mutex::new(VecDeque::new()),
            item_signal: Notify::new(),
            close_signal,
        }
    }

    pub(crate) fn push(&self, frame: Frame) {
        self.lock().push_back(frame);
        // A stored permit covers a consumer that has not started waiting yet.
        self.item_signal.notify_one();
    }

    pub(crate) fn pop(&self) -> Option<Frame> {
        self.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn close(&self) {
        self.close_signal.send_replace(true);
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.close_signal.borrow()
    }

    /// Resolves once the queue is closed. Returns immediately if it already is.
    pub(crate) async fn closed(&self) {
        let mut rx = self.close_signal.subscribe();
        // The sender lives as long as the queue, so this cannot fail while borrowed.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Waits for either a new item or the close signal, whichever fires first.
    pub(crate) async fn wait(&self) -> Wake {
        tokio::select! {
            _ = self.item_signal.notified() => Wake::Item,
            _ = self.closed() => Wake::Closed,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Frame>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::events::client::{ClientEvent, PromptEnd};
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(name: &str) -> Frame {
        Frame::from(ClientEvent::PromptEnd(PromptEnd::new(name)))
    }

    #[test]
    fn pops_in_push_order() {
        let queue = OutboundQueue::new();
        queue.push(frame("a"));
        queue.push(frame("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(frame("a")));
        assert_eq!(queue.pop(), Some(frame("b")));
        assert_eq!(queue.pop(), None);
    }

    #[tokio::test]
    async fn push_before_wait_is_not_lost() {
        let queue = OutboundQueue::new();
        queue.push(frame("a"));
        let wake = tokio::time::timeout(Duration::from_secs(1), queue.wait()).await.unwrap();
        assert!(matches!(wake, Wake::Item));
    }

    #[tokio::test]
    async fn close_wakes_a_waiting_consumer() {
        let queue = Arc::new(OutboundQueue::new());
        let waiter = {
            let queue = queue.clone();
            tokio::spawn(async move { matches!(queue.wait().await, Wake::Closed) })
        };
        tokio::task::yield_now().await;
        queue.close();
        assert!(tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap());
        assert!(queue.is_closed());

        // Closing before anyone waits is observed too.
        let late = OutboundQueue::new();
        late.close();
        assert!(matches!(late.wait().await, Wake::Closed));
    }
}
