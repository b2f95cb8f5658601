//! Takeoff - streaming client for AI-generated construction estimates
//!
//! The backend agent turns a natural-language project description into a
//! construction estimate, emitting incremental line-item suggestions over a
//! newline-delimited JSON (NDJSON) stream. This crate owns the client side of
//! that protocol: opening the streaming request, framing bytes into records,
//! classifying events, extracting `<action>` directives from generated text,
//! and fanning events out to subscribers.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod models;
pub mod stream;
pub mod traits;
