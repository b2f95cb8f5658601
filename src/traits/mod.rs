//! Trait abstractions for dependency injection and testability.
//!
//! The streaming engine talks to the agent API exclusively through the
//! [`HttpClient`] trait, so tests can script byte streams (including awkward
//! chunk boundaries) without a network.

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
