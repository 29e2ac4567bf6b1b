//! Core data models for the analytics engine.

mod attempt;
mod confidence;
mod ids;
mod metrics;
mod population;
mod result;

pub use attempt::*;
pub use confidence::*;
pub use ids::*;
pub use metrics::*;
pub use population::*;
pub use result::*;
