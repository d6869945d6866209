//! Network layer: fetcher trait, HTTP client, sessions, backoff policy.

pub mod backoff;
pub mod client;
pub mod session;

pub use backoff::{BackoffPolicy, FixedBackoff};
pub use client::{decode_text, Fetcher, HttpFetcher};
pub use session::Session;
