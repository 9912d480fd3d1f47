//! Error handling for the streaming client.
//!
//! - [`StreamError`] covers every failure the client can report
//! - [`ErrorCategory`] groups errors for handling decisions
//! - [`StreamResult<T>`] is the crate-wide result alias
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection dropped or refused | Yes |
//! | Auth | 401/403, missing credentials | No |
//! | Server | Backend 5xx | Yes |
//! | Protocol | Malformed frames, unexpected status | No |
//! | Cancelled | Caller closed the stream | No |
//! | Configuration | Bad URL or config | No |

mod category;
mod result;
mod stream;

pub use category::ErrorCategory;
pub use result::StreamResult;
pub use stream::StreamError;
