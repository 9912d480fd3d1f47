//! chatstream - streaming client for chat backends that speak SSE
//!
//! Call [`StreamClient::stream`] with an endpoint, an optional JSON payload
//! and a message callback. With a payload the call is a POST whose body is
//! read as an event stream; without one it is a native GET subscription.
//! Either way the caller gets the same [`ConnectionHandle`].
//!
//! Credentials are exchanged for a short-lived stream token first, so the
//! durable credential never appears in a URL.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod sse;
pub mod stream;
pub mod traits;

pub use config::StreamClientConfig;
pub use error::{StreamError, StreamResult};
pub use stream::{ConnectionHandle, ReadyState, StreamClient, StreamOptions, TransportKind};
