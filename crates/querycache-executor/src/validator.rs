//! Argument validation: collects every offending field, never short-circuits
//! (§4.4 "to aid model self-correction").

use crate::error::ExecutorError;
use crate::schema::{ParamSchema, ParamType, ToolSchema};
use serde_json::Value;

pub fn validate(schema: &ToolSchema, args: &Value) -> Result<(), ExecutorError> {
    let mut offending = Vec::new();
    let object = args.as_object();

    for (name, field) in &schema.parameters {
        let value = object.and_then(|o| o.get(name));
        match value {
            None => {
                if field.required {
                    offending.push(name.clone());
                }
            }
            Some(value) => {
                if !field_is_valid(field, value) {
                    offending.push(name.clone());
                }
            }
        }
    }

    if offending.is_empty() {
        Ok(())
    } else {
        offending.sort();
        Err(ExecutorError::Validation { fields: offending })
    }
}

fn field_is_valid(field: &ParamSchema, value: &Value) -> bool {
    if !type_matches(&field.param_type, value) {
        return false;
    }

    if let Some(allowed) = &field.enum_values {
        if !allowed.contains(value) {
            return false;
        }
    }

    if let Some(n) = value.as_f64() {
        if below_min(field.minimum, n) || above_max(field.maximum, n) {
            return false;
        }
    }

    if let Some(s) = value.as_str() {
        let len = s.chars().count() as f64;
        if below_min(field.min_length.map(|n| n as f64), len) || above_max(field.max_length.map(|n| n as f64), len) {
            return false;
        }
    }

    if let Value::Array(items) = value {
        let len = items.len() as f64;
        if below_min(field.min_length.map(|n| n as f64), len) || above_max(field.max_length.map(|n| n as f64), len) {
            return false;
        }
    }

    true
}

fn below_min(bound: Option<f64>, value: f64) -> bool {
    match bound {
        Some(min) => value < min,
        None => false,
    }
}

fn above_max(bound: Option<f64>, value: f64) -> bool {
    match bound {
        Some(max) => value > max,
        None => false,
    }
}

fn type_matches(param_type: &ParamType, value: &Value) -> bool {
    match param_type {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Integer => value.as_i64().is_some() || value.as_u64().is_some(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Array(item_schema) => match value.as_array() {
            Some(items) => items.iter().all(|item| field_is_valid(item_schema, item)),
            None => false,
        },
        ParamType::Object(nested) => match value.as_object() {
            Some(object) => nested.iter().all(|(name, field)| match object.get(name) {
                Some(v) => field_is_valid(field, v),
                None => !field.required,
            }),
            None => false,
        },
    }
}
