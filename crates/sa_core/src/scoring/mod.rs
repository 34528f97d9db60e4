//! The scoring pipeline: validate → score → aggregate → compare → report.
//!
//! One pass, stateless, side-effect-free. The same configuration and input
//! set always produce the same `PerformanceResult`; requests can run in
//! parallel without coordination. A calculation either completes or fails
//! atomically with a `CalculationError`; partial results are never
//! returned.

pub mod aggregate;
pub mod benchmark;
pub mod report;
pub mod scorer;
pub mod validator;

use std::collections::BTreeMap;

use crate::config::{validate_game, ConfigurationSource};
use crate::error::{CalculationError, Result};
use crate::models::{Game, InputValue, PerformanceResult, PlayerInputSet};

pub use aggregate::{weighted_average, Aggregates};
pub use benchmark::{compare, BenchmarkStanding};
pub use report::COMPLETION_TIME_KEY;
pub use scorer::{score_all, score_metric};
pub use validator::{validate, ValidationResult};

/// Run one full performance calculation against an already-loaded game
/// configuration.
pub fn calculate_player_performance(
    game: &Game,
    inputs: &PlayerInputSet,
) -> Result<PerformanceResult> {
    validate_game(game)?;
    if inputs.game_id != game.game_id {
        return Err(CalculationError::GameMismatch {
            expected: game.game_id.clone(),
            found: inputs.game_id.clone(),
        });
    }

    tracing::debug!(
        game_id = %game.game_id,
        player_id = %inputs.player_id,
        metrics = game.metrics.len(),
        inputs = inputs.values.len(),
        "calculating player performance"
    );

    let constants = scorer::constant_bindings(game);
    let metric_scores = scorer::score_all(game, inputs, &constants);
    let aggregates = aggregate::aggregate(game, &metric_scores, &constants);
    let result = report::build(game, inputs, &metric_scores, &aggregates);

    tracing::info!(
        game_id = %game.game_id,
        player_id = %inputs.player_id,
        total_score = result.total_score,
        failed_metrics = result.failed_metrics.len(),
        "performance calculated"
    );
    Ok(result)
}

/// Caller-facing boundary: fetch the configuration for `game_id` and run one
/// calculation for `player_id` over the raw input bag.
pub fn calculate(
    source: &dyn ConfigurationSource,
    game_id: &str,
    player_id: &str,
    raw_inputs: BTreeMap<String, InputValue>,
) -> Result<PerformanceResult> {
    let game = source.game_configuration(game_id)?;
    let inputs = PlayerInputSet {
        player_id: player_id.to_string(),
        game_id: game_id.to_string(),
        values: raw_inputs,
    };
    calculate_player_performance(&game, &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemoryConfigStore;
    use crate::models::{Competence, Constant, ConstantValue, Metric, Stage};

    fn metric(key: &str, formula: &str, weight: f64) -> Metric {
        Metric {
            metric_key: key.into(),
            metric_name: key.to_uppercase(),
            metric_description: None,
            formula: formula.into(),
            weight,
            benchmark: None,
            parameters: vec![],
        }
    }

    fn single_competence_game() -> Game {
        Game {
            game_id: "g1".into(),
            game_name: "Target Practice".into(),
            description: None,
            active: true,
            stages: vec![Stage {
                stage_id: "stage1".into(),
                stage_key: "range".into(),
                stage_name: "Range".into(),
                stage_order: 1,
                optimal_time: None,
                benchmark: None,
                description: None,
                metric_keys: vec!["m1".into()],
            }],
            competencies: vec![Competence {
                competence_key: "comp1".into(),
                competence_name: "Aim".into(),
                weight: 2.0,
                formula: None,
                benchmark: None,
                description: None,
                metric_keys: vec!["m1".into()],
            }],
            metrics: vec![metric("m1", "score", 1.0)],
            constants: vec![],
            updated_at: None,
        }
    }

    #[test]
    fn test_end_to_end_single_metric() {
        // One competence (weight 2, metric m1 with formula "score") and one
        // stage with the same metric attached. Input {score: 90}.
        let game = single_competence_game();
        let inputs = PlayerInputSet::new("p1", "g1").with_value("score", 90.0);
        let result = calculate_player_performance(&game, &inputs).unwrap();

        assert_eq!(result.total_score, 90.0);
        assert_eq!(result.competence_details.len(), 1);
        assert_eq!(result.competence_details[0].competence_key, "comp1");
        assert_eq!(result.competence_details[0].score, 90.0);
        assert_eq!(result.stage_performance.len(), 1);
        assert_eq!(result.stage_performance[0].stage_id, "stage1");
        assert_eq!(result.stage_performance[0].score, 90.0);
        assert!(result.failed_metrics.is_empty());
    }

    #[test]
    fn test_end_to_end_is_idempotent() {
        let game = single_competence_game();
        let inputs = PlayerInputSet::new("p1", "g1").with_value("score", 73.5);
        let first = calculate_player_performance(&game, &inputs).unwrap();
        let second = calculate_player_performance(&game, &inputs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_with_constant() {
        let mut game = single_competence_game();
        game.metrics[0].formula = "base + bonus".into();
        game.constants.push(Constant {
            const_key: "base".into(),
            const_name: "Base".into(),
            const_value: ConstantValue::Number(10.0),
            const_description: None,
        });
        let inputs = PlayerInputSet::new("p1", "g1").with_value("bonus", 5.0);
        let result = calculate_player_performance(&game, &inputs).unwrap();
        assert_eq!(result.total_score, 15.0);
    }

    #[test]
    fn test_bad_metric_does_not_abort_request() {
        let mut game = single_competence_game();
        game.metrics.push(metric("broken", "1 / 0", 1.0));
        game.competencies[0].metric_keys.push("broken".into());

        let inputs = PlayerInputSet::new("p1", "g1").with_value("score", 90.0);
        let result = calculate_player_performance(&game, &inputs).unwrap();

        // (90 * 1 + 0 * 1) / 2 with the failed metric's weight retained.
        assert_eq!(result.total_score, 45.0);
        assert_eq!(result.failed_metrics, vec!["broken".to_string()]);
        assert!(result.competence_details[0].degraded);
    }

    #[test]
    fn test_game_mismatch_is_fatal() {
        let game = single_competence_game();
        let inputs = PlayerInputSet::new("p1", "other-game");
        assert!(matches!(
            calculate_player_performance(&game, &inputs),
            Err(CalculationError::GameMismatch { .. })
        ));
    }

    #[test]
    fn test_calculate_through_store() {
        let mut store = InMemoryConfigStore::new();
        store.insert(single_competence_game());

        let raw: BTreeMap<String, InputValue> =
            [("score".to_string(), InputValue::Number(60.0))].into_iter().collect();
        let result = calculate(&store, "g1", "p1", raw).unwrap();
        assert_eq!(result.player_id, "p1");
        assert_eq!(result.total_score, 60.0);

        assert!(matches!(
            calculate(&store, "missing", "p1", BTreeMap::new()),
            Err(CalculationError::GameNotFound(_))
        ));
    }

    #[test]
    fn test_standalone_game_metric_reported_but_not_aggregated() {
        let mut game = single_competence_game();
        // In the pool, attached to nothing.
        game.metrics.push(metric("solo", "score * 2", 1.0));

        let inputs = PlayerInputSet::new("p1", "g1").with_value("score", 50.0);
        let result = calculate_player_performance(&game, &inputs).unwrap();

        assert_eq!(result.total_score, 50.0);
        let solo = result.metric_scores.iter().find(|s| s.metric_key == "solo").unwrap();
        assert_eq!(solo.raw_value, 100.0);
    }
}
