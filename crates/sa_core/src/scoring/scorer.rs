//! Per-metric scoring: validation, then formula evaluation.
//!
//! Failure isolation is the point of this module: a metric that cannot be
//! validated or evaluated becomes a zero-valued, flagged `MetricScore`
//! instead of unwinding the pipeline.

use std::collections::BTreeMap;

use crate::formula::{Formula, ResolutionChain, Scalar};
use crate::models::{Game, InputValue, Metric, MetricFailure, MetricScore, PlayerInputSet};

use super::validator;

/// Raw input values as formula bindings, without declared-type coercion.
/// Declared parameters overlay these with their coerced values; undeclared
/// extras stay resolvable as-is.
pub fn raw_bindings(inputs: &PlayerInputSet) -> BTreeMap<String, Scalar> {
    inputs
        .values
        .iter()
        .map(|(key, value)| {
            let scalar = match value {
                InputValue::Number(n) => Scalar::Number(*n),
                InputValue::Bool(b) => Scalar::Bool(*b),
                InputValue::Text(s) => Scalar::Text(s.clone()),
            };
            (key.clone(), scalar)
        })
        .collect()
}

/// Game constants as formula bindings.
pub fn constant_bindings(game: &Game) -> BTreeMap<String, Scalar> {
    game.numeric_constants().into_iter().map(|(k, v)| (k, Scalar::Number(v))).collect()
}

/// Score one metric against one input set.
///
/// Never fails at the request level: validator errors and evaluator errors
/// both come back as a flagged zero score carrying the failure details.
pub fn score_metric(
    metric: &Metric,
    inputs: &PlayerInputSet,
    constants: &BTreeMap<String, Scalar>,
) -> MetricScore {
    let validation = validator::validate(metric, inputs);
    if !validation.is_valid() {
        tracing::debug!(
            metric_key = %metric.metric_key,
            errors = validation.errors.len(),
            "metric excluded by validation"
        );
        return MetricScore::failed(
            &metric.metric_key,
            metric.weight,
            metric.benchmark,
            validation.errors,
        );
    }

    let mut supplied = raw_bindings(inputs);
    supplied.extend(validation.supplied);
    let chain = ResolutionChain {
        inputs: &supplied,
        defaults: &validation.defaults,
        constants,
    };

    match Formula::parse(&metric.formula).and_then(|f| f.evaluate(&chain)) {
        Ok(value) => MetricScore::scored(&metric.metric_key, value, metric.weight, metric.benchmark),
        Err(err) => {
            tracing::debug!(metric_key = %metric.metric_key, %err, "metric evaluation failed");
            MetricScore::failed(
                &metric.metric_key,
                metric.weight,
                metric.benchmark,
                vec![MetricFailure::Eval { message: err.to_string() }],
            )
        }
    }
}

/// Score every metric in the game's pool. Keyed by metric key; iteration
/// order is deterministic.
pub fn score_all(
    game: &Game,
    inputs: &PlayerInputSet,
    constants: &BTreeMap<String, Scalar>,
) -> BTreeMap<String, MetricScore> {
    game.metrics
        .iter()
        .map(|metric| (metric.metric_key.clone(), score_metric(metric, inputs, constants)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParamType, Parameter};

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

    fn no_constants() -> BTreeMap<String, Scalar> {
        BTreeMap::new()
    }

    #[test]
    fn test_score_simple_formula() {
        let metric = metric("accuracy", "hits / shots * 100", 2.0);
        let inputs =
            PlayerInputSet::new("p1", "g1").with_value("hits", 45.0).with_value("shots", 50.0);
        let score = score_metric(&metric, &inputs, &no_constants());
        assert!(!score.failed);
        assert_eq!(score.raw_value, 90.0);
        assert_eq!(score.weight, 2.0);
    }

    #[test]
    fn test_constant_resolution() {
        // Formula "base + bonus" with constant base=10 and input bonus=5.
        let metric = metric("total", "base + bonus", 1.0);
        let inputs = PlayerInputSet::new("p1", "g1").with_value("bonus", 5.0);
        let constants: BTreeMap<String, Scalar> =
            [("base".to_string(), Scalar::Number(10.0))].into_iter().collect();
        let score = score_metric(&metric, &inputs, &constants);
        assert!(!score.failed);
        assert_eq!(score.raw_value, 15.0);
    }

    #[test]
    fn test_supplied_input_beats_constant() {
        let metric = metric("total", "base + 1", 1.0);
        let inputs = PlayerInputSet::new("p1", "g1").with_value("base", 100.0);
        let constants: BTreeMap<String, Scalar> =
            [("base".to_string(), Scalar::Number(10.0))].into_iter().collect();
        let score = score_metric(&metric, &inputs, &constants);
        assert_eq!(score.raw_value, 101.0);
    }

    #[test]
    fn test_missing_required_parameter_scores_zero_flagged() {
        let mut m = metric("m1", "shots * 2", 1.5);
        m.parameters.push(Parameter {
            param_key: "shots".into(),
            param_name: "Shots".into(),
            param_description: None,
            param_type: ParamType::Number,
            is_required: true,
            default_value: None,
        });
        let inputs = PlayerInputSet::new("p1", "g1");
        let score = score_metric(&m, &inputs, &no_constants());
        assert!(score.failed);
        assert_eq!(score.raw_value, 0.0);
        assert_eq!(score.weight, 1.5);
        assert_eq!(
            score.failures,
            vec![MetricFailure::MissingRequiredParameter { param_key: "shots".into() }]
        );
    }

    #[test]
    fn test_declared_default_used_when_unsupplied() {
        let mut m = metric("m1", "shots * 2", 1.0);
        m.parameters.push(Parameter {
            param_key: "shots".into(),
            param_name: "Shots".into(),
            param_description: None,
            param_type: ParamType::Number,
            is_required: false,
            default_value: Some(serde_json::json!(4)),
        });
        let inputs = PlayerInputSet::new("p1", "g1");
        let score = score_metric(&m, &inputs, &no_constants());
        assert!(!score.failed);
        assert_eq!(score.raw_value, 8.0);
    }

    #[test]
    fn test_division_by_zero_is_flagged_not_fatal() {
        let metric = metric("rate", "hits / shots", 1.0);
        let inputs =
            PlayerInputSet::new("p1", "g1").with_value("hits", 3.0).with_value("shots", 0.0);
        let score = score_metric(&metric, &inputs, &no_constants());
        assert!(score.failed);
        assert_eq!(score.raw_value, 0.0);
        assert!(matches!(score.failures[0], MetricFailure::Eval { .. }));
    }

    #[test]
    fn test_declared_date_parameter_usable_in_arithmetic() {
        let mut m = metric("duration", "ended - started", 1.0);
        for key in ["started", "ended"] {
            m.parameters.push(Parameter {
                param_key: key.into(),
                param_name: key.to_uppercase(),
                param_description: None,
                param_type: ParamType::Date,
                is_required: true,
                default_value: None,
            });
        }
        let inputs = PlayerInputSet::new("p1", "g1")
            .with_value("started", "1970-01-01T00:00:00Z")
            .with_value("ended", "1970-01-01T00:05:00Z");
        let score = score_metric(&m, &inputs, &no_constants());
        assert!(!score.failed);
        assert_eq!(score.raw_value, 300.0);
    }

    #[test]
    fn test_score_all_covers_every_pool_metric() {
        let game = Game {
            game_id: "g1".into(),
            game_name: "G1".into(),
            description: None,
            active: true,
            stages: vec![],
            competencies: vec![],
            metrics: vec![metric("a", "score", 1.0), metric("b", "nope", 1.0)],
            constants: vec![],
            updated_at: None,
        };
        let inputs = PlayerInputSet::new("p1", "g1").with_value("score", 50.0);
        let scores = score_all(&game, &inputs, &constant_bindings(&game));
        assert_eq!(scores.len(), 2);
        assert!(!scores["a"].failed);
        assert!(scores["b"].failed); // unresolved identifier
    }
}
