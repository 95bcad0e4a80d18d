//! Schema-validated, rate-limited, authorized, deadline-bounded tool
//! dispatch (§4.4, §4.7).
//!
//! - [`schema`] — structural parameter schemas ([`ToolSchema`]).
//! - [`registry`] — [`ToolRegistry`], [`ToolRecord`], the [`ToolHandler`] seam.
//! - [`validator`] — [`validator::validate`], collecting every offending field.
//! - [`executor`] — [`ToolExecutor`], the full per-call pipeline.
//! - [`config`] — [`ExecutorConfig`] / [`ExecutorConfigBuilder`].
//! - [`events`] — [`ExecutorEvent`].

mod config;
mod error;
mod events;
mod executor;
mod registry;
mod schema;
mod validator;

pub use config::{ExecutorConfig, ExecutorConfigBuilder};
pub use error::ExecutorError;
pub use events::ExecutorEvent;
pub use executor::{ToolCall, ToolExecutor, ToolResult, ToolResultError};
pub use registry::{ToolHandler, ToolRecord, ToolRegistry};
pub use schema::{ParamSchema, ParamType, ToolSchema};
pub use validator::validate;
