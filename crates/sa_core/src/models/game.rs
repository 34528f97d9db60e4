//! Game configuration tree: stages, competencies, constants, metric pool.
//!
//! These records are owned by the external administrative system and are
//! treated as immutable for the lifetime of one calculation. Field names on
//! the wire follow the administrative GraphQL contract (`gameId`,
//! `stageKey`, `constValue`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metric::Metric;

/// Value of a game-scoped constant. The administrative system stores both
/// numeric and text constants; only numeric ones are usable in formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Number(f64),
    Text(String),
}

impl ConstantValue {
    /// Numeric view, parsing numeric text ("42.5") where possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ConstantValue::Number(n) => Some(*n),
            ConstantValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Game-scoped named value usable inside any formula of that game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constant {
    pub const_key: String,
    pub const_name: String,
    pub const_value: ConstantValue,
    #[serde(default)]
    pub const_description: Option<String>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

/// Ordered phase of a game. Groups metrics independently of competencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub stage_id: String,
    pub stage_key: String,
    pub stage_name: String,
    /// Unique positive ordering key within the game.
    pub stage_order: u32,
    /// Target completion time in seconds, feeds the `speed` global metric.
    #[serde(default)]
    pub optimal_time: Option<f64>,
    #[serde(default)]
    pub benchmark: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Keys into the game's metric pool.
    #[serde(default)]
    pub metric_keys: Vec<String>,
}

/// Weighted grouping of metrics representing one assessed skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competence {
    pub competence_key: String,
    pub competence_name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Optional formula override. When present, the competence score is this
    /// expression evaluated over `{metricKey: rawValue}` bindings instead of
    /// the weighted average of attached metrics.
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub benchmark: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    /// Keys into the game's metric pool.
    #[serde(default)]
    pub metric_keys: Vec<String>,
}

/// Full configuration tree for one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub game_id: String,
    pub game_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub competencies: Vec<Competence>,
    /// Shared metric pool. Stages and competencies attach by key; a metric
    /// referenced by neither is a standalone game metric.
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub constants: Vec<Constant>,
    /// Implicit configuration version from the administrative system.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Game {
    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.metric_key == key)
    }

    pub fn constant(&self, key: &str) -> Option<&Constant> {
        self.constants.iter().find(|c| c.const_key == key)
    }

    /// Numeric constants as formula bindings. Text constants that do not
    /// parse as numbers are omitted (they cannot appear in arithmetic).
    pub fn numeric_constants(&self) -> BTreeMap<String, f64> {
        self.constants
            .iter()
            .filter_map(|c| c.const_value.as_number().map(|n| (c.const_key.clone(), n)))
            .collect()
    }

}
