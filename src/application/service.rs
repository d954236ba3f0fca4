use super::engine::Engine;
use crate::domain::message::{Message, MessageId};
use crate::infrastructure::user_context::{UserContext, UserRegistry};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// The operations a transport exposes to clients.
///
/// Each call names the user it acts for; the user's context is found (or
/// created) in the shared [`UserRegistry`]. Submission runs the engine
/// straight away and queues its reply, retrieval drains the user's queues.
#[derive(Clone)]
pub struct MessagingService {
    engine: Arc<dyn Engine>,
    users: Arc<UserRegistry>,
    wait_timeout: Option<Duration>,
}

impl MessagingService {
    pub fn new(engine: Arc<dyn Engine>, users: Arc<UserRegistry>) -> Self {
        Self {
            engine,
            users,
            wait_timeout: None,
        }
    }

    /// Bounds how long a waiting retrieval may stay pending. `None` (the
    /// default) waits until a message arrives.
    pub fn with_wait_timeout(mut self, wait_timeout: Option<Duration>) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }

    pub fn users(&self) -> &Arc<UserRegistry> {
        &self.users
    }

    pub async fn start_session(&self, username: &str) -> Arc<UserContext> {
        let context = self.users.for_user(username).await;
        debug!(user = username, "session started");
        self.engine.start_session(&context).await;
        context
    }

    pub async fn end_session(&self, username: &str) {
        let context = self.users.for_user(username).await;
        debug!(user = username, "session ended");
        self.engine.end_session(&context).await;
    }

    /// Submits a document and returns the correlation id its reply will
    /// carry.
    pub async fn submit_message(&self, username: &str, document: impl Into<String>) -> String {
        let context = self.users.for_user(username).await;
        let message = Message::new(document);
        let correlation_id = message.id().to_string();

        match self.engine.process(&context, &message).await {
            Some(reply) => {
                debug!(user = username, %correlation_id, "reply queued");
                context.responses().enqueue(reply).await;
            }
            None => debug!(user = username, %correlation_id, "engine produced no reply"),
        }
        correlation_id
    }

    /// Returns the next message for the user: pending notifications first,
    /// then responses in arrival order.
    pub async fn retrieve_message(&self, username: &str, wait: bool) -> Option<String> {
        let context = self.users.for_user(username).await;
        if let Some(notification) = context.notifications().dequeue_head(false).await {
            return Some(notification.into_payload());
        }
        if !wait {
            return context
                .responses()
                .dequeue_head(false)
                .await
                .map(Message::into_payload);
        }

        let next = async {
            tokio::select! {
                biased;
                message = context.notifications().dequeue_head(true) => message,
                message = context.responses().dequeue_head(true) => message,
            }
        };
        self.bounded(next).await.map(Message::into_payload)
    }

    /// Returns the reply to a specific submission.
    pub async fn retrieve_response_message(
        &self,
        username: &str,
        correlation_id: &str,
        wait: bool,
    ) -> Option<String> {
        let Ok(correlation_id) = correlation_id.parse::<MessageId>() else {
            // Never issued by submit_message, so nothing can ever match.
            debug!(user = username, correlation_id, "malformed correlation id");
            return None;
        };
        let context = self.users.for_user(username).await;
        self.bounded(context.responses().dequeue_by_correlation(&correlation_id, wait))
            .await
            .map(Message::into_payload)
    }

    /// Returns the next unsolicited notification for the user.
    pub async fn retrieve_notification(&self, username: &str, wait: bool) -> Option<String> {
        let context = self.users.for_user(username).await;
        self.bounded(context.notifications().dequeue_head(wait))
            .await
            .map(Message::into_payload)
    }

    async fn bounded<F>(&self, retrieval: F) -> Option<Message>
    where
        F: Future<Output = Option<Message>>,
    {
        match self.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, retrieval).await.ok().flatten(),
            None => retrieval.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Replies with the payload reversed, or not at all for "silent".
    struct MirrorEngine;

    #[async_trait]
    impl Engine for MirrorEngine {
        async fn process(&self, _context: &UserContext, message: &Message) -> Option<Message> {
            if message.payload() == "silent" {
                return None;
            }
            Some(message.reply(message.payload().chars().rev().collect::<String>()))
        }
    }

    fn service() -> MessagingService {
        MessagingService::new(Arc::new(MirrorEngine), Arc::new(UserRegistry::new()))
    }

    #[tokio::test]
    async fn test_submit_then_retrieve_by_correlation() {
        let service = service();
        let first = service.submit_message("alice", "abc").await;
        let second = service.submit_message("alice", "xyz").await;

        assert_eq!(
            service.retrieve_response_message("alice", &second, false).await,
            Some("zyx".to_string())
        );
        assert_eq!(
            service.retrieve_response_message("alice", &first, false).await,
            Some("cba".to_string())
        );
        assert!(service.retrieve_response_message("alice", &first, false).await.is_none());
    }

    #[tokio::test]
    async fn test_no_reply_means_nothing_to_retrieve() {
        let service = service();
        let id = service.submit_message("alice", "silent").await;

        assert!(service.retrieve_response_message("alice", &id, false).await.is_none());
        assert!(service.retrieve_message("alice", false).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_correlation_id_never_matches() {
        let service = service().with_wait_timeout(None);
        service.submit_message("alice", "abc").await;

        // Returns immediately even when asked to wait.
        assert!(service.retrieve_response_message("alice", "bogus", true).await.is_none());
        assert_eq!(service.retrieve_message("alice", false).await, Some("cba".to_string()));
    }

    #[tokio::test]
    async fn test_replies_are_per_user() {
        let service = service();
        let id = service.submit_message("alice", "abc").await;

        assert!(service.retrieve_response_message("bob", &id, false).await.is_none());
        assert!(service.retrieve_message("bob", false).await.is_none());
        assert!(service.retrieve_response_message("alice", &id, false).await.is_some());
    }

    #[tokio::test]
    async fn test_wait_timeout_bounds_retrieval() {
        let service = service().with_wait_timeout(Some(Duration::from_millis(20)));

        assert!(service.retrieve_message("alice", true).await.is_none());
        assert!(service.retrieve_notification("alice", true).await.is_none());
        let unknown = MessageId::new().to_string();
        assert!(service.retrieve_response_message("alice", &unknown, true).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiting_retrieve_message_wakes_on_response() {
        let service = service();
        let waiter = {
            let service = service.clone();
            tokio::spawn(async move { service.retrieve_message("alice", true).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        service.submit_message("alice", "abc").await;

        let received = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, Some("cba".to_string()));
    }
}
