//! Final assembly of the `PerformanceResult`.
//!
//! Every competence and every stage in the configuration appears in the
//! result, including those with no attached metrics (score 0, no
//! percentile). Failed metrics are listed explicitly so degraded aggregates
//! are observable rather than silently plausible.

use std::collections::BTreeMap;

use crate::models::{
    BenchmarkComparison, CompetenceDetail, CompetencePercentile, Game, GlobalMetrics, InputValue,
    MetricScore, PerformanceResult, PlayerInputSet, StagePerformance,
};

use super::aggregate::{weighted_average, Aggregates};
use super::benchmark;

/// Input key carrying the player's total completion time in seconds, used
/// for the `speed` global metric against declared stage optimal times.
/// Numbers and numeric strings are both accepted, like NUMBER parameters.
pub const COMPLETION_TIME_KEY: &str = "completion_time";

/// Assemble the immutable result record. Pure assembly over already-computed
/// pieces; the only arithmetic here is the bounded global summary figures.
pub fn build(
    game: &Game,
    inputs: &PlayerInputSet,
    metric_scores: &BTreeMap<String, MetricScore>,
    aggregates: &Aggregates,
) -> PerformanceResult {
    let competence_details: Vec<CompetenceDetail> = aggregates
        .competences
        .iter()
        .map(|c| CompetenceDetail {
            competence_key: c.competence_key.clone(),
            competence_name: c.competence_name.clone(),
            score: c.score,
            degraded: c.degraded,
        })
        .collect();

    let stage_performance: Vec<StagePerformance> = aggregates
        .stages
        .iter()
        .map(|s| StagePerformance {
            stage_id: s.stage_id.clone(),
            stage_name: s.stage_name.clone(),
            score: s.score,
            degraded: s.degraded,
        })
        .collect();

    let by_competence: Vec<CompetencePercentile> = aggregates
        .competences
        .iter()
        .map(|c| CompetencePercentile {
            competence_key: c.competence_key.clone(),
            percentile: if c.has_metrics {
                benchmark::compare(c.score, c.benchmark).percentile
            } else {
                None
            },
        })
        .collect();

    let benchmark_comparison = BenchmarkComparison {
        overall: overall_percentile(aggregates),
        by_competence,
    };

    let global_metrics = global_metrics(game, inputs, metric_scores, aggregates.total_score);

    let ordered_scores: Vec<MetricScore> = metric_scores.values().cloned().collect();
    let failed_metrics: Vec<String> = ordered_scores
        .iter()
        .filter(|s| s.failed)
        .map(|s| s.metric_key.clone())
        .collect();

    PerformanceResult {
        player_id: inputs.player_id.clone(),
        game_id: game.game_id.clone(),
        total_score: aggregates.total_score,
        competence_details,
        stage_performance,
        global_metrics,
        benchmark_comparison,
        metric_scores: ordered_scores,
        failed_metrics,
    }
}

/// Overall standing: the total score against the competence-weight-averaged
/// benchmark of competencies that declare one. None when no competence
/// declares a benchmark.
fn overall_percentile(aggregates: &Aggregates) -> Option<f64> {
    let declared: Vec<(f64, f64)> = aggregates
        .competences
        .iter()
        .filter_map(|c| c.benchmark.map(|b| (b, c.weight)))
        .collect();
    if declared.is_empty() {
        return None;
    }
    let overall_benchmark = weighted_average(declared);
    benchmark::compare(aggregates.total_score, Some(overall_benchmark)).percentile
}

fn global_metrics(
    game: &Game,
    inputs: &PlayerInputSet,
    metric_scores: &BTreeMap<String, MetricScore>,
    total_score: f64,
) -> GlobalMetrics {
    let efficiency = total_score.clamp(0.0, 100.0);

    // Mean percent-of-benchmark over metrics that scored and declare a
    // nonzero benchmark; falls back to efficiency when none qualify.
    let ratios: Vec<f64> = metric_scores
        .values()
        .filter(|s| !s.failed)
        .filter_map(|s| {
            s.benchmark
                .filter(|b| *b != 0.0)
                .map(|b| (100.0 * s.raw_value / b.abs()).clamp(0.0, 100.0))
        })
        .collect();
    let accuracy = if ratios.is_empty() {
        efficiency
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };

    // Declared optimal time vs. actual completion time, when both exist.
    // Accepts numeric strings under the same rule as NUMBER parameters.
    let optimal_total: f64 = game.stages.iter().filter_map(|s| s.optimal_time).sum();
    let actual = match inputs.get(COMPLETION_TIME_KEY) {
        Some(InputValue::Number(n)) => Some(*n),
        Some(InputValue::Text(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let speed = match actual {
        Some(actual) if actual > 0.0 && optimal_total > 0.0 => {
            (100.0 * optimal_total / actual).clamp(0.0, 100.0)
        }
        _ => efficiency,
    };

    GlobalMetrics { efficiency, accuracy, speed }
}
