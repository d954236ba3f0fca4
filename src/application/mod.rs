//! Application layer: the engine contract and the API surface built on it.
//!
//! [`engine::Engine`] turns session events and inbound messages into
//! replies; [`service::MessagingService`] resolves the caller's context,
//! drives the engine and routes replies into the caller's queues.

pub mod engine;
pub mod service;
