//! Degradation Trend Forecasting
//!
//! Fits a straight line of health indicator against cycle count for each
//! engine and projects when it crosses the preventive and predictive
//! maintenance thresholds. The gap between the two crossings feeds the
//! economic value estimate.

mod economics;
mod forecaster;
mod trend;

pub use economics::{EconomicModel, EconomicValue};
pub use forecaster::{EngineForecast, FleetForecast, Thresholds, TrendForecaster};
pub use trend::DegradationTrend;

use thiserror::Error;

/// Default stress multiplier (nominal mission profile)
pub const NOMINAL_STRESS: f64 = 1.0;

/// Errors during trend fitting and projection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// Fewer than two distinct cycles, so no line can be fitted
    #[error("Insufficient data: {distinct_cycles} distinct cycle(s), need at least 2")]
    InsufficientData { distinct_cycles: usize },

    /// NaN or infinite cycle/indicator value in the input series
    #[error("Non-finite value at point {index}")]
    NonFiniteValue { index: usize },

    /// Stress multiplier must be finite and positive
    #[error("Invalid stress multiplier: {0}")]
    InvalidStressMultiplier(f64),

    /// Economic constants must be finite, cycles per day positive
    #[error("Invalid economic configuration: {0}")]
    InvalidEconomics(String),
}
