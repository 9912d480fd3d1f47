//! Streaming calls: transport selection, read loops and the lifecycle.
//!
//! # Module structure
//! - `client` - [`StreamClient`] and [`StreamOptions`]
//! - `handle` - [`ConnectionHandle`] returned to callers
//! - `lifecycle` - the shared close routine and callback gating
//! - `fetch` - POST transport read loop
//! - `native` - GET transport over the native event-stream primitive

mod client;
mod fetch;
mod handle;
mod lifecycle;
mod native;

pub use client::{StreamClient, StreamOptions};
pub use handle::{ConnectionHandle, ReadyState, TransportKind};
pub use lifecycle::{CloseReason, OnClose, OnError, OnMessage};
