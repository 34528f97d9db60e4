//! Read-only access to game configuration and its invariant checks.
//!
//! The administrative system owns all writes; the engine only ever sees a
//! freshly fetched configuration tree and treats it as immutable for the
//! lifetime of one calculation. `validate_game` enforces the invariants
//! storage does not: unique keys per scope, positive weights, distinct
//! stage orders, no dangling metric references.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CalculationError, Result};
use crate::formula::Formula;
use crate::models::Game;

/// Source of game configuration trees, e.g. an in-memory cache fed by the
/// administrative system. Implementations must return the full tree
/// (stages, competencies, metrics, parameters, constants).
pub trait ConfigurationSource {
    fn game_configuration(&self, game_id: &str) -> Result<Game>;
}

/// Simple in-memory configuration store. Games are loaded once (or replaced
/// wholesale on configuration edits) and read concurrently without locking.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    games: BTreeMap<String, Game>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a game's configuration tree.
    pub fn insert(&mut self, game: Game) {
        self.games.insert(game.game_id.clone(), game);
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

impl ConfigurationSource for InMemoryConfigStore {
    fn game_configuration(&self, game_id: &str) -> Result<Game> {
        self.games
            .get(game_id)
            .cloned()
            .ok_or_else(|| CalculationError::GameNotFound(game_id.to_string()))
    }
}

/// Check the configuration invariants the engine relies on. Any violation is
/// fatal for the whole request.
pub fn validate_game(game: &Game) -> Result<()> {
    if !game.active {
        return Err(CalculationError::GameInactive(game.game_id.clone()));
    }

    let err = |message: String| CalculationError::configuration(&game.game_id, message);

    let mut metric_keys = BTreeSet::new();
    for metric in &game.metrics {
        if !metric_keys.insert(metric.metric_key.as_str()) {
            return Err(err(format!("duplicate metric key `{}`", metric.metric_key)));
        }
        if metric.weight <= 0.0 {
            return Err(err(format!(
                "metric `{}` has non-positive weight {}",
                metric.metric_key, metric.weight
            )));
        }
        // Syntax problems are config defects, fatal up front. Unresolved
        // identifiers are not: they may resolve from runtime inputs, and
        // failing ones degrade only the owning metric.
        if let Err(parse_err) = Formula::parse(&metric.formula) {
            return Err(err(format!(
                "metric `{}` has malformed formula: {}",
                metric.metric_key, parse_err
            )));
        }
        let mut param_keys = BTreeSet::new();
        for param in &metric.parameters {
            if !param_keys.insert(param.param_key.as_str()) {
                return Err(err(format!(
                    "duplicate parameter key `{}` on metric `{}`",
                    param.param_key, metric.metric_key
                )));
            }
            // A parameter key shadowing a constant would make resolution
            // ambiguous; surfaced here, never at evaluation time.
            if game.constant(&param.param_key).is_some() {
                return Err(err(format!(
                    "parameter `{}` on metric `{}` collides with a game constant",
                    param.param_key, metric.metric_key
                )));
            }
        }
    }

    let mut const_keys = BTreeSet::new();
    for constant in &game.constants {
        if !const_keys.insert(constant.const_key.as_str()) {
            return Err(err(format!("duplicate constant key `{}`", constant.const_key)));
        }
    }

    let mut stage_keys = BTreeSet::new();
    let mut stage_orders = BTreeSet::new();
    for stage in &game.stages {
        if !stage_keys.insert(stage.stage_key.as_str()) {
            return Err(err(format!("duplicate stage key `{}`", stage.stage_key)));
        }
        if stage.stage_order == 0 {
            return Err(err(format!("stage `{}` has order 0, orders start at 1", stage.stage_key)));
        }
        if !stage_orders.insert(stage.stage_order) {
            return Err(err(format!(
                "stage `{}` reuses order {}",
                stage.stage_key, stage.stage_order
            )));
        }
        for key in &stage.metric_keys {
            if game.metric(key).is_none() {
                return Err(err(format!(
                    "stage `{}` references unknown metric `{}`",
                    stage.stage_key, key
                )));
            }
        }
    }

    let mut competence_keys = BTreeSet::new();
    for competence in &game.competencies {
        if !competence_keys.insert(competence.competence_key.as_str()) {
            return Err(err(format!(
                "duplicate competence key `{}`",
                competence.competence_key
            )));
        }
        if competence.weight <= 0.0 {
            return Err(err(format!(
                "competence `{}` has non-positive weight {}",
                competence.competence_key, competence.weight
            )));
        }
        if let Some(formula) = &competence.formula {
            if let Err(parse_err) = Formula::parse(formula) {
                return Err(err(format!(
                    "competence `{}` has malformed formula override: {}",
                    competence.competence_key, parse_err
                )));
            }
        }
        for key in &competence.metric_keys {
            if game.metric(key).is_none() {
                return Err(err(format!(
                    "competence `{}` references unknown metric `{}`",
                    competence.competence_key, key
                )));
            }
        }
    }

    Ok(())
}
