//! Economic Value of Unlocked Cycles

use crate::forecaster::EngineForecast;
use crate::ForecastError;
use serde::{Deserialize, Serialize};

/// Fleet operating constants supplied by configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicModel {
    /// Engine cycles flown per calendar day
    pub cycles_per_day: f64,
    /// Value of one extra day in service
    pub value_per_day: f64,
}

/// Days and value gained for one engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicValue {
    pub days_saved: f64,
    pub economic_value: f64,
}

impl EconomicModel {
    /// Create a validated model
    pub fn new(cycles_per_day: f64, value_per_day: f64) -> Result<Self, ForecastError> {
        let model = Self {
            cycles_per_day,
            value_per_day,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if !self.cycles_per_day.is_finite() || self.cycles_per_day <= 0.0 {
            return Err(ForecastError::InvalidEconomics(format!(
                "cycles_per_day must be positive, got {}",
                self.cycles_per_day
            )));
        }
        if !self.value_per_day.is_finite() {
            return Err(ForecastError::InvalidEconomics(format!(
                "value_per_day must be finite, got {}",
                self.value_per_day
            )));
        }
        Ok(())
    }

    /// `(predictive − preventive) / cycles_per_day * value_per_day`.
    ///
    /// Negative margins stay negative; infinite crossings propagate.
    pub fn evaluate(&self, forecast: &EngineForecast) -> EconomicValue {
        let days_saved = forecast.cycles_unlocked() / self.cycles_per_day;
        EconomicValue {
            days_saved,
            economic_value: days_saved * self.value_per_day,
        }
    }
}
