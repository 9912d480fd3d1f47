//! Authentication for streaming calls.
//!
//! Only the stream token exchange lives here. The durable credential comes
//! from a [`CredentialsProvider`](crate::traits::CredentialsProvider).

pub mod stream_token;

pub use stream_token::{StreamToken, TokenBroker};
