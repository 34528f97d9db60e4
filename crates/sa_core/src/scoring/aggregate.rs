//! Weighted aggregation of metric scores into stage, competence, and total
//! scores.
//!
//! Stages and competencies are two independent aggregation trees over the
//! same metric pool: a metric attached to both contributes to both. Only
//! competence scores feed the total; stage scores are the diagnostic view.

use std::collections::BTreeMap;

use crate::formula::{Formula, ResolutionChain, Scalar};
use crate::models::{Game, MetricScore};

/// Weighted average `sum(score_i * weight_i) / sum(weight_i)`, defined as 0
/// when the weight sum is 0. Never NaN.
pub fn weighted_average<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (mut value_sum, mut weight_sum) = (0.0, 0.0);
    for (value, weight) in pairs {
        value_sum += value * weight;
        weight_sum += weight;
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        value_sum / weight_sum
    }
}

/// Aggregated score of one competence.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetenceScore {
    pub competence_key: String,
    pub competence_name: String,
    pub score: f64,
    pub weight: f64,
    pub benchmark: Option<f64>,
    /// False for a competence with no attached metrics; such a competence
    /// scores 0 and is excluded from the total-score weighted sum.
    pub has_metrics: bool,
    /// True when any attached metric failed to score, or a formula override
    /// could not be evaluated. The parent score aggregates around a gap.
    pub degraded: bool,
}

/// Aggregated score of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageScore {
    pub stage_id: String,
    pub stage_key: String,
    pub stage_name: String,
    pub score: f64,
    pub benchmark: Option<f64>,
    pub optimal_time: Option<f64>,
    pub has_metrics: bool,
    pub degraded: bool,
}

/// Output of the aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub competences: Vec<CompetenceScore>,
    /// Sorted by stage order.
    pub stages: Vec<StageScore>,
    pub total_score: f64,
}

/// Roll metric scores up into competence scores, stage scores, and the
/// competence-weighted total.
///
/// A failed metric contributes `rawValue = 0` with its declared weight kept
/// in the denominator; the containing aggregate is marked degraded.
pub fn aggregate(
    game: &Game,
    metric_scores: &BTreeMap<String, MetricScore>,
    constants: &BTreeMap<String, Scalar>,
) -> Aggregates {
    let competences: Vec<CompetenceScore> = game
        .competencies
        .iter()
        .map(|competence| {
            let attached: Vec<&MetricScore> = competence
                .metric_keys
                .iter()
                .filter_map(|key| metric_scores.get(key))
                .collect();
            let has_metrics = !attached.is_empty();
            let mut degraded = attached.iter().any(|s| s.failed);

            let averaged =
                weighted_average(attached.iter().map(|s| (s.raw_value, s.weight)));

            // A formula override replaces the weighted average; on evaluation
            // failure the average stands and the competence is flagged.
            let score = match competence.formula.as_deref().filter(|_| has_metrics) {
                Some(formula) => {
                    let bindings: BTreeMap<String, Scalar> = attached
                        .iter()
                        .map(|s| (s.metric_key.clone(), Scalar::Number(s.raw_value)))
                        .collect();
                    let empty = BTreeMap::new();
                    let chain = ResolutionChain {
                        inputs: &bindings,
                        defaults: &empty,
                        constants,
                    };
                    match Formula::parse(formula).and_then(|f| f.evaluate(&chain)) {
                        Ok(value) => value,
                        Err(err) => {
                            tracing::debug!(
                                competence_key = %competence.competence_key,
                                %err,
                                "competence formula override failed, using weighted average"
                            );
                            degraded = true;
                            averaged
                        }
                    }
                }
                None => averaged,
            };

            CompetenceScore {
                competence_key: competence.competence_key.clone(),
                competence_name: competence.competence_name.clone(),
                score: if has_metrics { score } else { 0.0 },
                weight: competence.weight,
                benchmark: competence.benchmark,
                has_metrics,
                degraded,
            }
        })
        .collect();

    let mut stages: Vec<StageScore> = game
        .stages
        .iter()
        .map(|stage| {
            let attached: Vec<&MetricScore> =
                stage.metric_keys.iter().filter_map(|key| metric_scores.get(key)).collect();
            let has_metrics = !attached.is_empty();
            StageScore {
                stage_id: stage.stage_id.clone(),
                stage_key: stage.stage_key.clone(),
                stage_name: stage.stage_name.clone(),
                score: weighted_average(attached.iter().map(|s| (s.raw_value, s.weight))),
                benchmark: stage.benchmark,
                optimal_time: stage.optimal_time,
                has_metrics,
                degraded: attached.iter().any(|s| s.failed),
            }
        })
        .collect();
    stages.sort_by_key(|s| {
        game.stages
            .iter()
            .find(|g| g.stage_id == s.stage_id)
            .map(|g| g.stage_order)
            .unwrap_or(u32::MAX)
    });

    let total_score = weighted_average(
        competences.iter().filter(|c| c.has_metrics).map(|c| (c.score, c.weight)),
    );

    Aggregates { competences, stages, total_score }
}
