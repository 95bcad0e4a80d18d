//! Idempotent-by-name tool registration (§4.4).

use crate::error::ExecutorError;
use crate::schema::ToolSchema;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// A tool's async handler, invoked with already-validated arguments.
///
/// An explicit trait per tool, never runtime introspection (§9 "Dynamic
/// dispatch of tools ... represented here by an explicit Registry ...").
pub trait ToolHandler: Send + Sync {
    fn invoke(&self, args: Value) -> BoxFuture<'static, Result<Value, String>>;
}

impl<F> ToolHandler for F
where
    F: Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync,
{
    fn invoke(&self, args: Value) -> BoxFuture<'static, Result<Value, String>> {
        (self)(args)
    }
}

/// A registered tool: its schema, auth requirements, timeout, and handler (§3).
///
/// `timeout` is `None` unless the registrant calls [`ToolRecord::timeout`]
/// explicitly; a tool left at `None` uses the executor's configured
/// `default_timeout` (§6 `executor.defaultTimeoutMs`) at call time, not a
/// value baked in at registration.
pub struct ToolRecord {
    pub name: String,
    pub schema: ToolSchema,
    pub requires_auth: bool,
    pub required_scopes: HashSet<String>,
    pub timeout: Option<Duration>,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolRecord {
    pub fn new(name: impl Into<String>, schema: ToolSchema, handler: impl ToolHandler + 'static) -> Self {
        Self {
            name: name.into(),
            schema,
            requires_auth: false,
            required_scopes: HashSet::new(),
            timeout: None,
            handler: Arc::new(handler),
        }
    }

    pub fn requires_auth(mut self, scopes: impl IntoIterator<Item = String>) -> Self {
        self.requires_auth = true;
        self.required_scopes = scopes.into_iter().collect();
        self
    }

    /// Overrides the executor's default timeout for this tool specifically.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Tool registry keyed by name. Re-registration with an identical schema is a
/// no-op; re-registration with a different schema fails (§4.4).
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolRecord>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, record: ToolRecord) -> Result<(), ExecutorError> {
        let name = record.name.clone();
        if let Some(existing) = self.tools.get(&name) {
            if existing.schema != record.schema {
                return Err(ExecutorError::SchemaConflict(name));
            }
            return Ok(());
        }
        self.tools.insert(name, Arc::new(record));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<ToolRecord>, ExecutorError> {
        self.tools
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ExecutorError::ToolNotFound(name.to_string()))
    }

    pub fn list(&self) -> Vec<String> {
        self.tools.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn schemas(&self) -> Vec<(String, ToolSchema)> {
        self.tools
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().schema.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamSchema, ParamType};

    fn echo_handler() -> impl ToolHandler {
        |args: Value| -> BoxFuture<'static, Result<Value, String>> { Box::pin(async move { Ok(args) }) }
    }

    #[test]
    fn registers_and_looks_up_by_name() {
        let registry = ToolRegistry::new();
        registry.register(ToolRecord::new("echo", ToolSchema::new(), echo_handler())).unwrap();
        assert!(registry.get("echo").is_ok());
        assert_eq!(registry.list(), vec!["echo".to_string()]);
    }

    #[test]
    fn missing_tool_is_not_found() {
        let registry = ToolRegistry::new();
        assert!(matches!(registry.get("nope"), Err(ExecutorError::ToolNotFound(_))));
    }

    #[test]
    fn re_registration_with_identical_schema_is_idempotent() {
        let registry = ToolRegistry::new();
        let schema = ToolSchema::new().param("q", ParamSchema::new(ParamType::String).required());
        registry.register(ToolRecord::new("search", schema.clone(), echo_handler())).unwrap();
        registry.register(ToolRecord::new("search", schema, echo_handler())).unwrap();
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn re_registration_with_incompatible_schema_conflicts() {
        let registry = ToolRegistry::new();
        registry
            .register(ToolRecord::new(
                "search",
                ToolSchema::new().param("q", ParamSchema::new(ParamType::String)),
                echo_handler(),
            ))
            .unwrap();
        let result = registry.register(ToolRecord::new(
            "search",
            ToolSchema::new().param("q", ParamSchema::new(ParamType::Integer)),
            echo_handler(),
        ));
        assert!(matches!(result, Err(ExecutorError::SchemaConflict(_))));
    }
}
