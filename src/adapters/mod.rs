//! Concrete implementations of trait abstractions.
//!
//! Production adapters that implement the traits defined in `crate::traits`.

pub mod reqwest_http;

pub use reqwest_http::ReqwestHttpClient;
