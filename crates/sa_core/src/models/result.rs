//! Performance calculation output records.
//!
//! `PerformanceResult` is the single record handed back to callers; it is
//! immutable once built and JSON-serializable for any transport. Per-metric
//! failures ride along in the diagnostic channel (`metricScores`,
//! `failedMetrics`) so that degraded aggregates are observable, never
//! silently plausible.

use serde::{Deserialize, Serialize};

use super::metric::ParamType;

/// Why one metric could not be scored. Non-fatal: the metric contributes
/// `rawValue = 0` to aggregation and is flagged, the request still completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MetricFailure {
    #[serde(rename_all = "camelCase")]
    MissingRequiredParameter { param_key: String },
    #[serde(rename_all = "camelCase")]
    TypeMismatch { param_key: String, expected: ParamType, found: String },
    #[serde(rename_all = "camelCase")]
    Eval { message: String },
}

impl std::fmt::Display for MetricFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricFailure::MissingRequiredParameter { param_key } => {
                write!(f, "missing required parameter `{}`", param_key)
            }
            MetricFailure::TypeMismatch { param_key, expected, found } => {
                write!(
                    f,
                    "parameter `{}` expects {}, got {}",
                    param_key,
                    expected.as_str(),
                    found
                )
            }
            MetricFailure::Eval { message } => write!(f, "evaluation failed: {}", message),
        }
    }
}

/// Outcome of scoring one metric against one input set.
///
/// `failed = true` distinguishes "could not be scored" from a legitimate
/// zero score; `rawValue` is 0 in the failed case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    pub metric_key: String,
    pub raw_value: f64,
    pub weight: f64,
    #[serde(default)]
    pub benchmark: Option<f64>,
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<MetricFailure>,
}

impl MetricScore {
    pub fn scored(metric_key: impl Into<String>, raw_value: f64, weight: f64, benchmark: Option<f64>) -> Self {
        Self { metric_key: metric_key.into(), raw_value, weight, benchmark, failed: false, failures: Vec::new() }
    }

    pub fn failed(metric_key: impl Into<String>, weight: f64, benchmark: Option<f64>, failures: Vec<MetricFailure>) -> Self {
        Self { metric_key: metric_key.into(), raw_value: 0.0, weight, benchmark, failed: true, failures }
    }
}

/// Per-competence line of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetenceDetail {
    pub competence_key: String,
    pub competence_name: String,
    pub score: f64,
    /// True when at least one attached metric could not be scored, so this
    /// score aggregates around a gap.
    #[serde(default)]
    pub degraded: bool,
}

/// Per-stage line of the result. Stages never feed the total score; they are
/// the time/phase diagnostic view over the same metric pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePerformance {
    pub stage_id: String,
    pub stage_name: String,
    pub score: f64,
    #[serde(default)]
    pub degraded: bool,
}

/// Cross-cutting summary figures, each bounded to [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetrics {
    /// The weighted total score itself.
    pub efficiency: f64,
    /// Mean percent-of-benchmark over successfully scored metrics that
    /// declare a benchmark.
    pub accuracy: f64,
    /// Declared optimal time vs. actual completion time, when available.
    pub speed: f64,
}

/// Benchmark-relative standing for one competence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencePercentile {
    pub competence_key: String,
    /// None when the competence declares no benchmark.
    pub percentile: Option<f64>,
}

/// Benchmark-relative standing for the whole result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    /// Overall percentile; None when no competence declares a benchmark.
    pub overall: Option<f64>,
    pub by_competence: Vec<CompetencePercentile>,
}

/// Immutable result of one performance calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
    pub player_id: String,
    pub game_id: String,
    pub total_score: f64,
    /// Every competence in the game configuration, attached metrics or not.
    pub competence_details: Vec<CompetenceDetail>,
    /// Every stage in the game configuration, in stage order.
    pub stage_performance: Vec<StagePerformance>,
    pub global_metrics: GlobalMetrics,
    pub benchmark_comparison: BenchmarkComparison,
    /// Diagnostic channel: one entry per metric in the game's pool,
    /// including standalone game metrics and failures.
    pub metric_scores: Vec<MetricScore>,
    /// Keys of metrics that could not be scored, for quick inspection.
    pub failed_metrics: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_failure_serializes_tagged() {
        let failure = MetricFailure::MissingRequiredParameter { param_key: "shots".into() };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "missingRequiredParameter");
        assert_eq!(json["paramKey"], "shots");
    }

    #[test]
    fn test_failed_score_is_zero_valued_but_flagged() {
        let score = MetricScore::failed(
            "m1",
            2.0,
            None,
            vec![MetricFailure::Eval { message: "division by zero".into() }],
        );
        assert_eq!(score.raw_value, 0.0);
        assert!(score.failed);
        assert_eq!(score.weight, 2.0);
    }

    #[test]
    fn test_result_wire_shape() {
        let result = PerformanceResult {
            player_id: "p1".into(),
            game_id: "g1".into(),
            total_score: 90.0,
            competence_details: vec![CompetenceDetail {
                competence_key: "aim".into(),
                competence_name: "Aim".into(),
                score: 90.0,
                degraded: false,
            }],
            stage_performance: vec![],
            global_metrics: GlobalMetrics { efficiency: 90.0, accuracy: 90.0, speed: 90.0 },
            benchmark_comparison: BenchmarkComparison { overall: None, by_competence: vec![] },
            metric_scores: vec![],
            failed_metrics: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["totalScore"], 90.0);
        assert_eq!(json["competenceDetails"][0]["competenceKey"], "aim");
        assert!(json["benchmarkComparison"]["overall"].is_null());
    }
}
