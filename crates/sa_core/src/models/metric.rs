//! Metric and Parameter configuration records.
//!
//! A metric is a named, weighted, formula-driven measurement. Its formula is
//! evaluated against the player's raw inputs, the metric's declared parameter
//! defaults, and the game's constants (in that priority order).

use serde::{Deserialize, Serialize};

/// Declared type of a metric parameter. Drives input coercion before
/// formula evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    Number,
    String,
    Boolean,
    /// ISO-8601 date/datetime, normalized to epoch seconds for formulas.
    Date,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Number => "NUMBER",
            ParamType::String => "STRING",
            ParamType::Boolean => "BOOLEAN",
            ParamType::Date => "DATE",
        }
    }
}

fn default_number() -> ParamType {
    ParamType::Number
}

/// A declared input of a metric formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub param_key: String,
    pub param_name: String,
    #[serde(default)]
    pub param_description: Option<String>,
    #[serde(default = "default_number")]
    pub param_type: ParamType,
    #[serde(default)]
    pub is_required: bool,
    /// Fallback used when the caller does not supply this parameter.
    /// Coerced through the same rules as a supplied value.
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
}

fn default_weight() -> f64 {
    1.0
}

/// A weighted, formula-driven measurement.
///
/// Metrics live in the game's shared pool and are attached by key to any
/// number of stages and competencies (or to none, as standalone game
/// metrics).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub metric_key: String,
    pub metric_name: String,
    #[serde(default)]
    pub metric_description: Option<String>,
    /// Restricted arithmetic expression, see `formula` module grammar.
    pub formula: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Target value used for benchmark-relative standing. Optional.
    #[serde(default)]
    pub benchmark: Option<f64>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}
