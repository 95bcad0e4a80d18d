//! Pattern-driven cache pre-population and sub-threshold content padding
//! (§4.8).
//!
//! - [`padder`] — [`ContentType`], [`Padder`].
//! - [`warmer`] — [`Warmer`], [`SeedQuery`], the [`WarmSource`] seam, [`WarmerReport`].
//! - [`config`] — [`WarmerConfig`] / [`WarmerConfigBuilder`].
//! - [`events`] — [`WarmerEvent`].

mod config;
mod events;
mod padder;
mod warmer;

pub use config::{WarmerConfig, WarmerConfigBuilder};
pub use events::WarmerEvent;
pub use padder::{ContentType, Padder};
pub use warmer::{SeedQuery, WarmSource, Warmer, WarmerReport};
