//! JSON string-in / string-out boundary for the scoring engine.
//!
//! Transport-agnostic: whatever RPC mechanism the collaborator chooses can
//! pass these payloads through unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Game, InputValue, PerformanceResult, PlayerInputSet};
use crate::scoring::calculate_player_performance;

/// One performance calculation request with the game configuration embedded
/// (as fetched from the administrative system).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRequest {
    pub schema_version: u8,
    pub game: Game,
    pub player_id: String,
    /// Flat bag of raw values keyed by parameter key.
    #[serde(default)]
    pub raw_inputs: BTreeMap<String, InputValue>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResponse {
    pub schema_version: u8,
    pub result: PerformanceResult,
}

/// Run one performance calculation from a JSON request.
///
/// Fatal calculation errors come back as the `Err` string with enough
/// context to identify the offending entity; per-metric failures are inside
/// the result's diagnostic fields, not here.
pub fn calculate_performance_json(request_json: &str) -> Result<String, String> {
    let request: PerformanceRequest = serde_json::from_str(request_json)
        .map_err(|e| format!("Invalid JSON request: {}", e))?;

    if request.schema_version != 1 {
        return Err(format!("Unsupported schema version: {}", request.schema_version));
    }

    let inputs = PlayerInputSet {
        player_id: request.player_id,
        game_id: request.game.game_id.clone(),
        values: request.raw_inputs,
    };

    let result = calculate_player_performance(&request.game, &inputs)
        .map_err(|e| e.to_string())?;

    let response = PerformanceResponse { schema_version: 1, result };
    serde_json::to_string(&response).map_err(|e| format!("Serialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_json() -> String {
        json!({
            "schemaVersion": 1,
            "playerId": "p1",
            "rawInputs": {"score": 90},
            "game": {
                "gameId": "g1",
                "gameName": "Target Practice",
                "metrics": [
                    {"metricKey": "m1", "metricName": "M1", "formula": "score"}
                ],
                "competencies": [
                    {"competenceKey": "comp1", "competenceName": "Aim", "weight": 2.0,
                     "metricKeys": ["m1"]}
                ],
                "stages": [
                    {"stageId": "stage1", "stageKey": "range", "stageName": "Range",
                     "stageOrder": 1, "metricKeys": ["m1"]}
                ]
            }
        })
        .to_string()
    }

    #[test]
    fn test_calculate_performance_json_roundtrip() {
        let response_json = calculate_performance_json(&request_json()).unwrap();
        let response: serde_json::Value = serde_json::from_str(&response_json).unwrap();

        assert_eq!(response["schemaVersion"], 1);
        let result = &response["result"];
        assert_eq!(result["playerId"], "p1");
        assert_eq!(result["totalScore"], 90.0);
        assert_eq!(result["competenceDetails"][0]["competenceKey"], "comp1");
        assert_eq!(result["stagePerformance"][0]["stageId"], "stage1");
        assert!(result["globalMetrics"]["efficiency"].is_number());
        assert!(result["benchmarkComparison"]["overall"].is_null());
    }

    #[test]
    fn test_rejects_unknown_schema_version() {
        let mut request: serde_json::Value = serde_json::from_str(&request_json()).unwrap();
        request["schemaVersion"] = json!(9);
        let err = calculate_performance_json(&request.to_string()).unwrap_err();
        assert!(err.contains("Unsupported schema version"));
    }

    #[test]
    fn test_rejects_malformed_request() {
        let err = calculate_performance_json("{not json").unwrap_err();
        assert!(err.contains("Invalid JSON request"));
    }

    #[test]
    fn test_fatal_configuration_error_surfaces() {
        let mut request: serde_json::Value = serde_json::from_str(&request_json()).unwrap();
        request["game"]["metrics"][0]["weight"] = json!(-1.0);
        let err = calculate_performance_json(&request.to_string()).unwrap_err();
        assert!(err.contains("non-positive weight"));
    }
}
