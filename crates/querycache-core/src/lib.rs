//! Core infrastructure shared by every querycache component.
//!
//! - [`events`] — the observability seam: a typed event per component, delivered
//!   through panic-isolated listeners.
//! - [`error`] — the crate-wide error taxonomy ([`QueryCacheError`]).

pub mod error;
pub mod events;

pub use error::QueryCacheError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
