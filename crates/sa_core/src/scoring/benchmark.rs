//! Benchmark-relative standing.
//!
//! The percentile curve is a policy choice constrained to be monotonic in
//! the actual score, bounded to [0, 100], and stable. Absence of a benchmark
//! is not an error; it simply yields no standing.

/// Delta and percentile of an actual score against a declared benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BenchmarkStanding {
    pub delta: Option<f64>,
    pub percentile: Option<f64>,
}

/// Compare an actual score against an optional benchmark.
///
/// With a benchmark `b != 0`: `percentile = clamp(50 + 50 * (actual - b) / |b|, 0, 100)`,
/// i.e. hitting the benchmark exactly is the 50th percentile and scoring
/// double a positive benchmark saturates at 100. With `b == 0`: 100 when
/// actual > 0, else 50.
pub fn compare(actual: f64, benchmark: Option<f64>) -> BenchmarkStanding {
    let Some(b) = benchmark else {
        return BenchmarkStanding::default();
    };
    let delta = actual - b;
    let percentile = if b == 0.0 {
        if actual > 0.0 {
            100.0
        } else {
            50.0
        }
    } else {
        // |b| in the denominator keeps the curve non-decreasing in `actual`
        // even for a negative benchmark.
        (50.0 + 50.0 * delta / b.abs()).clamp(0.0, 100.0)
    };
    BenchmarkStanding { delta: Some(delta), percentile: Some(percentile) }
}
