use crate::domain::message::{Message, MessageId};
use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

/// A thread-safe in-memory message queue.
///
/// Messages are kept in arrival order and can be taken either from the head
/// or by correlation identifier. Consumers may ask to wait: a waiting call
/// stays pending until a matching message is enqueued and has no timeout of
/// its own. Wrap it in `tokio::time::timeout` (or race it in `select!`) to
/// bound the wait; dropping a pending call never loses a message because a
/// message is only removed in the poll that returns it.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Mutex<VecDeque<Message>>,
    arrivals: Notify,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and wakes every waiting consumer.
    pub async fn enqueue(&self, message: Message) {
        let mut messages = self.messages.lock().await;
        messages.push_back(message);
        self.arrivals.notify_waiters();
    }

    /// Removes the earliest message whose correlation identifier matches.
    pub async fn dequeue_by_correlation(
        &self,
        correlation_id: &MessageId,
        wait: bool,
    ) -> Option<Message> {
        self.dequeue_first(wait, |message| message.correlation_id() == correlation_id)
            .await
    }

    /// Removes the message at the head of the queue.
    pub async fn dequeue_head(&self, wait: bool) -> Option<Message> {
        self.dequeue_first(wait, |_| true).await
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }

    async fn dequeue_first<P>(&self, wait: bool, matches: P) -> Option<Message>
    where
        P: Fn(&Message) -> bool,
    {
        loop {
            // Register for the next enqueue before scanning so that one
            // landing between the scan and the await still wakes us.
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            {
                let mut messages = self.messages.lock().await;
                if let Some(index) = messages.iter().position(&matches) {
                    return messages.remove(index);
                }
            }

            if !wait {
                return None;
            }
            arrival.await;
        }
    }
}
