//! # liftstats
//!
//! Weightlifting competition analytics with population-relative percentile
//! ranking, covering USA Weightlifting and IWF result data.
//!
//! ## Architecture
//!
//! - **models**: Typed result rows, derived metrics, population distributions
//! - **calculate**: Per-athlete metric extraction (pure, no I/O)
//! - **sample**: Population sampling against the result store
//! - **rank**: Percentile ranking and performance levels
//! - **store**: Data store client boundary
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod models;
pub mod rank;
pub mod sample;
pub mod store;

pub use models::*;

/// Round to one decimal place, matching how rates are displayed.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average of a slice, or `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
