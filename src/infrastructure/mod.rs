//! Concrete, thread-safe implementations behind the domain types and ports.

pub mod message_queue;
pub mod user_context;
pub mod xml;
