pub mod game;
pub mod inputs;
pub mod metric;
pub mod result;

pub use game::{Competence, Constant, ConstantValue, Game, Stage};
pub use inputs::{InputValue, PlayerInputSet};
pub use metric::{Metric, ParamType, Parameter};
pub use result::{
    BenchmarkComparison, CompetenceDetail, CompetencePercentile, GlobalMetrics, MetricFailure,
    MetricScore, PerformanceResult, StagePerformance,
};
