//! The render boundary: typed view events and a synchronous emitter.
//!
//! The client emits an event after every state change, before any network
//! round trip is awaited. Renderers subscribe and re-read the cache; this
//! layer knows nothing about DOM or templates.

mod emitter;
mod event;

pub use emitter::{EventEmitter, Subscription};
pub use event::{MessageLevel, StatusMessage, ViewEvent, MESSAGE_TTL};
