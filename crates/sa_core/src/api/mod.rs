pub mod json_api;

pub use json_api::{calculate_performance_json, PerformanceRequest, PerformanceResponse};
