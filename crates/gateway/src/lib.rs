//! Client for the OpenAI-compatible AI gateway.
//!
//! Provides typed chat messages, streaming chat completions with an
//! incremental SSE parser, and image generation/editing through the
//! chat completions endpoint with image output enabled.

pub mod api;
pub mod config;
pub mod messages;
pub mod sse;

pub use api::{GatewayApi, GatewayError};
pub use config::GatewayConfig;
