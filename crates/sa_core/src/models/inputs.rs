//! Raw gameplay inputs for one calculation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw value supplied by the caller for one parameter key.
///
/// Untagged on the wire: `{"score": 90, "mode": "hard", "cleared": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl From<f64> for InputValue {
    fn from(v: f64) -> Self {
        InputValue::Number(v)
    }
}

impl From<bool> for InputValue {
    fn from(v: bool) -> Self {
        InputValue::Bool(v)
    }
}

impl From<&str> for InputValue {
    fn from(v: &str) -> Self {
        InputValue::Text(v.to_string())
    }
}

/// Flat bag of raw parameter values for one player/game calculation run.
///
/// Created per request, never persisted by the engine. Iteration order is
/// deterministic (BTreeMap) so diagnostics come out stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInputSet {
    pub player_id: String,
    pub game_id: String,
    #[serde(default)]
    pub values: BTreeMap<String, InputValue>,
}

impl PlayerInputSet {
    pub fn new(player_id: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self { player_id: player_id.into(), game_id: game_id.into(), values: BTreeMap::new() }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<InputValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.values.get(key)
    }
}
