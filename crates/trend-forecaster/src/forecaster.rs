//! Threshold Crossing Projection per Engine and per Fleet

use crate::trend::DegradationTrend;
use crate::ForecastError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Maintenance thresholds in health-indicator units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Level that triggers scheduled (preventive) maintenance
    pub preventive: f64,
    /// Level that triggers risk-based (predictive) maintenance
    pub predictive: f64,
}

impl Default for Thresholds {
    /// Demo values: 50 preventive, 30 predictive
    fn default() -> Self {
        Self {
            preventive: 50.0,
            predictive: 30.0,
        }
    }
}

/// Trend and threshold projections for one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineForecast {
    pub engine_id: String,
    pub slope: f64,
    pub intercept: f64,
    /// Cycle at which the preventive threshold is reached
    pub preventive_cycles: f64,
    /// Cycle at which the predictive threshold is reached
    pub predictive_cycles: f64,
    pub stress_multiplier: f64,
    /// Zero slope: both projections are infinite
    pub degenerate: bool,
}

impl EngineForecast {
    /// Extra cycles gained by acting at the predictive instead of the
    /// preventive threshold. Negative means no extra margin.
    pub fn cycles_unlocked(&self) -> f64 {
        self.predictive_cycles - self.preventive_cycles
    }

    pub fn trend(&self) -> DegradationTrend {
        DegradationTrend {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

/// Forecasts for a fleet, with per-engine failures kept apart
#[derive(Debug, Clone, Default)]
pub struct FleetForecast {
    pub forecasts: BTreeMap<String, EngineForecast>,
    pub failures: BTreeMap<String, ForecastError>,
}

impl FleetForecast {
    pub fn len(&self) -> usize {
        self.forecasts.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty() && self.failures.is_empty()
    }
}

/// Per-engine trend forecaster
pub struct TrendForecaster {
    thresholds: Thresholds,
}

impl TrendForecaster {
    /// Create a new forecaster with explicit thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        info!(
            "Creating trend forecaster: preventive={}, predictive={}",
            thresholds.preventive, thresholds.predictive
        );
        Self { thresholds }
    }

    /// Fit one engine's `(cycle, indicator)` series and project both crossings
    pub fn forecast_engine(
        &self,
        engine_id: &str,
        points: &[(f64, f64)],
        stress_multiplier: f64,
    ) -> Result<EngineForecast, ForecastError> {
        let trend = DegradationTrend::fit(points, stress_multiplier)?;
        let degenerate = trend.is_flat();
        if degenerate {
            warn!(
                "Degenerate trend for engine {}: zero slope, thresholds never crossed",
                engine_id
            );
        }

        let forecast = EngineForecast {
            engine_id: engine_id.to_string(),
            slope: trend.slope,
            intercept: trend.intercept,
            preventive_cycles: trend.to_threshold(self.thresholds.preventive),
            predictive_cycles: trend.to_threshold(self.thresholds.predictive),
            stress_multiplier,
            degenerate,
        };

        debug!(
            "Engine {}: slope={:.5}, intercept={:.3}, preventive={:.1}, predictive={:.1}",
            engine_id,
            forecast.slope,
            forecast.intercept,
            forecast.preventive_cycles,
            forecast.predictive_cycles
        );

        Ok(forecast)
    }

    /// Forecast every engine; one bad engine does not stop the others
    pub fn forecast_fleet<I, K>(&self, series: I, stress_multiplier: f64) -> FleetForecast
    where
        I: IntoIterator<Item = (K, Vec<(f64, f64)>)>,
        K: Into<String>,
    {
        let mut fleet = FleetForecast::default();

        for (engine_id, points) in series {
            let engine_id = engine_id.into();
            match self.forecast_engine(&engine_id, &points, stress_multiplier) {
                Ok(forecast) => {
                    fleet.forecasts.insert(engine_id, forecast);
                }
                Err(e) => {
                    warn!("Forecast failed for engine {}: {}", engine_id, e);
                    fleet.failures.insert(engine_id, e);
                }
            }
        }

        info!(
            "Fleet forecast complete: {} engines, {} failed",
            fleet.forecasts.len(),
            fleet.failures.len()
        );
        fleet
    }
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
