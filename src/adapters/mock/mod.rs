//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted responses and live streams
//! - [`MockEventSource`] - native event source with scripted or live events
//!
//! [`StaticCredentials`](crate::adapters::StaticCredentials) doubles as the
//! in-memory credentials mock.

pub mod event_source;
pub mod http;

pub use event_source::{MockEventSource, NativeEventSender, RecordedOpen};
pub use http::{ChunkSender, MockHttpClient, MockResponse, RecordedRequest};
