//! # sa_core - Deterministic Skill Assessment Scoring Engine
//!
//! This library evaluates a hierarchical scoring model for game-based skill
//! assessment: games contain stages and competencies, both reference metrics,
//! metrics are computed from formulas over player inputs and game constants,
//! and a player's raw gameplay inputs reduce to a single weighted total score
//! plus per-stage, per-competence, and benchmark-relative breakdowns.
//!
//! ## Features
//! - 100% deterministic: same configuration + same inputs = same result
//! - Per-metric failure isolation: one bad formula never blocks a calculation
//! - Two independent aggregation trees (stages and competencies) over one
//!   metric pool
//! - JSON API for easy integration with any transport

pub mod api;
pub mod config;
pub mod error;
pub mod formula;
pub mod models;
pub mod scoring;

// Re-export main API surface
pub use api::{calculate_performance_json, PerformanceRequest, PerformanceResponse};
pub use config::{validate_game, ConfigurationSource, InMemoryConfigStore};
pub use error::{CalculationError, Result};
pub use formula::{evaluate, EvalError, Formula, ResolutionChain, Scalar};
pub use models::{
    BenchmarkComparison, Competence, CompetenceDetail, CompetencePercentile, Constant,
    ConstantValue, Game, GlobalMetrics, InputValue, Metric, MetricFailure, MetricScore, ParamType,
    Parameter, PerformanceResult, PlayerInputSet, Stage, StagePerformance,
};
pub use scoring::{calculate, calculate_player_performance, COMPLETION_TIME_KEY};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
