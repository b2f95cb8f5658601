//! Streaming estimate ingestion engine.
//!
//! Consumes the agent's NDJSON stream over HTTP. Each non-blank line is one
//! JSON object with a `type` discriminant; blank lines are heartbeats. Events
//! are fanned out to subscribers via a typed bus, and `<action>` directives
//! embedded in generated text are extracted by a quote-aware parser.
//!
//! # Module structure
//! - `events` - StreamEvent and the EventKind enumeration
//! - `bus` - subscriber registry with per-callback isolation
//! - `framing` - incremental UTF-8 decode and newline framing
//! - `directive` - `<action>field=value, ...</action>` extraction
//! - `service` - session lifecycle, dispatch, cancellation

mod bus;
mod directive;
mod events;
mod framing;
mod service;

pub use bus::{EventBus, SubscriptionHandle};
pub use directive::{parse_action_items, ActionDirective};
pub use events::{EventKind, StreamEvent};
pub use framing::LineFramer;
pub use service::StreamingEstimateService;
