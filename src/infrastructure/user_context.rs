use super::message_queue::MessageQueue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-user state: the queues a user's replies and notifications wait in.
///
/// Only a [`UserRegistry`] creates these, so there is at most one per
/// username for the lifetime of the registry.
#[derive(Debug)]
pub struct UserContext {
    username: String,
    responses: MessageQueue,
    notifications: MessageQueue,
}

impl UserContext {
    fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            responses: MessageQueue::new(),
            notifications: MessageQueue::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Replies to submitted messages, waiting to be retrieved.
    pub fn responses(&self) -> &MessageQueue {
        &self.responses
    }

    /// Unsolicited notifications, waiting to be retrieved.
    pub fn notifications(&self) -> &MessageQueue {
        &self.notifications
    }
}

/// Finds or creates the [`UserContext`] for a username.
///
/// Uses `RwLock<HashMap<String, Arc<UserContext>>>`: lookups of known users
/// share the read lock, the first access for a user takes the write lock and
/// checks again before inserting. Entries are never removed.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<HashMap<String, Arc<UserContext>>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context for `username`, creating it on first use.
    pub async fn for_user(&self, username: &str) -> Arc<UserContext> {
        if let Some(context) = self.users.read().await.get(username) {
            return Arc::clone(context);
        }

        let mut users = self.users.write().await;
        let context = users
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(UserContext::new(username)));
        Arc::clone(context)
    }

    /// Returns the context for `username` only if it already exists.
    pub async fn get(&self, username: &str) -> Option<Arc<UserContext>> {
        self.users.read().await.get(username).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}
