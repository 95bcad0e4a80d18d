//! Tool parameter schemas: structural type descriptions, not runtime
//! introspection (§4.4, §9 "explicit Registry ... parameter schemas as data").

use serde_json::Value;
use std::collections::BTreeMap;

/// One of the structural parameter types a tool schema can describe.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<ParamSchema>),
    Object(BTreeMap<String, ParamSchema>),
}

/// Constraints on a single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    pub param_type: ParamType,
    pub required: bool,
    pub enum_values: Option<Vec<Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl ParamSchema {
    pub fn new(param_type: ParamType) -> Self {
        Self {
            param_type,
            required: false,
            enum_values: None,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    pub fn length(mut self, min_length: usize, max_length: usize) -> Self {
        self.min_length = Some(min_length);
        self.max_length = Some(max_length);
        self
    }
}

/// A tool's full parameter schema, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    pub parameters: BTreeMap<String, ParamSchema>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        self.parameters.insert(name.into(), schema);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_composes_constraints() {
        let schema = ToolSchema::new().param(
            "limit",
            ParamSchema::new(ParamType::Integer).required().range(1.0, 100.0),
        );
        let field = &schema.parameters["limit"];
        assert!(field.required);
        assert_eq!(field.minimum, Some(1.0));
        assert_eq!(field.maximum, Some(100.0));
    }
}
