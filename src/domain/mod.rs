//! Domain types and ports.
//!
//! Nothing in here knows about locking, runtimes or a concrete XML library:
//! the infrastructure layer supplies those behind the traits in [`ports`].

pub mod document;
pub mod message;
pub mod ports;
pub mod release;
pub mod validation;
