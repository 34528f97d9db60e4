//! Parameter validation and type coercion ahead of formula evaluation.
//!
//! Validation is advisory-blocking: errors exclude the owning metric from
//! scoring (it contributes zero, flagged) rather than aborting the request.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::formula::Scalar;
use crate::models::{InputValue, Metric, MetricFailure, ParamType, Parameter, PlayerInputSet};

/// Outcome of validating one metric's declared parameters against one input
/// set. `supplied` holds coerced values for declared parameters the caller
/// provided; `defaults` holds coerced fallbacks for declared-but-unsupplied
/// parameters.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub supplied: BTreeMap<String, Scalar>,
    pub defaults: BTreeMap<String, Scalar>,
    pub errors: Vec<MetricFailure>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a metric's declared parameters against the submitted inputs.
///
/// A required parameter that is neither supplied nor defaulted is a
/// `MissingRequiredParameter`; a value that fails coercion to its declared
/// type is a `TypeMismatch`.
pub fn validate(metric: &Metric, inputs: &PlayerInputSet) -> ValidationResult {
    let mut result = ValidationResult::default();

    for param in &metric.parameters {
        match inputs.get(&param.param_key) {
            Some(raw) => match coerce(raw, param.param_type) {
                Ok(value) => {
                    result.supplied.insert(param.param_key.clone(), value);
                }
                Err(found) => result.errors.push(MetricFailure::TypeMismatch {
                    param_key: param.param_key.clone(),
                    expected: param.param_type,
                    found,
                }),
            },
            None => match default_for(param) {
                Some(Ok(value)) => {
                    result.defaults.insert(param.param_key.clone(), value);
                }
                Some(Err(found)) => result.errors.push(MetricFailure::TypeMismatch {
                    param_key: param.param_key.clone(),
                    expected: param.param_type,
                    found,
                }),
                None if param.is_required => {
                    result.errors.push(MetricFailure::MissingRequiredParameter {
                        param_key: param.param_key.clone(),
                    });
                }
                None => {}
            },
        }
    }

    result
}

fn default_for(param: &Parameter) -> Option<std::result::Result<Scalar, String>> {
    let raw = match param.default_value.as_ref()? {
        serde_json::Value::Number(n) => InputValue::Number(n.as_f64()?),
        serde_json::Value::String(s) => InputValue::Text(s.clone()),
        serde_json::Value::Bool(b) => InputValue::Bool(*b),
        other => return Some(Err(json_type_name(other).to_string())),
    };
    Some(coerce(&raw, param.param_type))
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Coerce one raw value to its declared parameter type.
///
/// - NUMBER accepts numbers and numeric strings.
/// - STRING passes strings through.
/// - BOOLEAN accepts native booleans and the strings "true"/"false".
/// - DATE accepts ISO-8601 strings, normalized to epoch seconds, and numbers
///   already expressed as epoch seconds.
///
/// On failure, returns a description of the offending value for the
/// `TypeMismatch` diagnostic.
pub fn coerce(raw: &InputValue, ty: ParamType) -> std::result::Result<Scalar, String> {
    match (ty, raw) {
        (ParamType::Number, InputValue::Number(n)) => Ok(Scalar::Number(*n)),
        (ParamType::Number, InputValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Scalar::Number)
            .map_err(|_| format!("string `{}`", s)),

        (ParamType::String, InputValue::Text(s)) => Ok(Scalar::Text(s.clone())),

        (ParamType::Boolean, InputValue::Bool(b)) => Ok(Scalar::Bool(*b)),
        (ParamType::Boolean, InputValue::Text(s)) => match s.as_str() {
            "true" => Ok(Scalar::Bool(true)),
            "false" => Ok(Scalar::Bool(false)),
            _ => Err(format!("string `{}`", s)),
        },

        (ParamType::Date, InputValue::Text(s)) => {
            parse_iso8601(s).map(Scalar::Number).ok_or_else(|| format!("string `{}`", s))
        }
        (ParamType::Date, InputValue::Number(n)) => Ok(Scalar::Number(*n)),

        (_, other) => Err(describe(other)),
    }
}

/// Parse an ISO-8601 date or datetime to epoch seconds (UTC).
fn parse_iso8601(s: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp() as f64);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc().timestamp() as f64);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(midnight.and_utc().timestamp() as f64);
    }
    None
}

fn describe(raw: &InputValue) -> String {
    match raw {
        InputValue::Number(n) => format!("number `{}`", n),
        InputValue::Bool(b) => format!("boolean `{}`", b),
        InputValue::Text(s) => format!("string `{}`", s),
    }
}
