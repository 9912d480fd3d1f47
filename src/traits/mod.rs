//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - POST requests, buffered or streaming
//! - [`EventSourceConnector`] - native event-stream subscriptions
//! - [`CredentialsProvider`] - durable session credential lookup

pub mod credentials;
pub mod event_source;
pub mod http;

pub use credentials::{CredentialsError, CredentialsProvider};
pub use event_source::{EventSourceConnector, NativeEvent, NativeEventStream, NativeMessage};
pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
