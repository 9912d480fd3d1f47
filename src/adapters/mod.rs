//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`EsEventSource`] - native event stream using eventsource-client
//! - [`FileCredentialsProvider`] - session token read from disk
//! - [`StaticCredentials`] - fixed or environment-provided session token
//!
//! The [`mock`] submodule provides test doubles for the HTTP and native
//! stream seams.

pub mod es_event_source;
pub mod file_credentials;
pub mod mock;
pub mod reqwest_http;
pub mod static_credentials;

pub use es_event_source::EsEventSource;
pub use file_credentials::FileCredentialsProvider;
pub use mock::{MockEventSource, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
pub use static_credentials::StaticCredentials;
