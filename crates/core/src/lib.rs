//! Domain types and client-side resilience primitives shared by every
//! menuforge crate.
//!
//! Nothing in here performs network I/O: the backend and gateway crates
//! build on these types, and the API server wires them together.

pub mod connection;
pub mod error;
pub mod media;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod trash;
pub mod types;
