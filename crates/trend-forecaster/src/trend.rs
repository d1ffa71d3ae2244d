//! Ordinary Least-Squares Degradation Trend

use crate::ForecastError;
use serde::{Deserialize, Serialize};

/// Linear health-indicator trend: `indicator = slope * cycle + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationTrend {
    pub slope: f64,
    pub intercept: f64,
}

impl DegradationTrend {
    /// Fit `(cycle, indicator)` points by least squares.
    ///
    /// The fitted slope is scaled by `stress_multiplier` afterwards; the
    /// intercept keeps its unscaled value.
    pub fn fit(points: &[(f64, f64)], stress_multiplier: f64) -> Result<Self, ForecastError> {
        if !stress_multiplier.is_finite() || stress_multiplier <= 0.0 {
            return Err(ForecastError::InvalidStressMultiplier(stress_multiplier));
        }
        if let Some(index) = points
            .iter()
            .position(|(x, y)| !x.is_finite() || !y.is_finite())
        {
            return Err(ForecastError::NonFiniteValue { index });
        }

        let distinct_cycles = distinct_count(points);
        if distinct_cycles < 2 {
            return Err(ForecastError::InsufficientData { distinct_cycles });
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let first_y = points[0].1;

        // A flat indicator must give an exactly zero slope, which the mean
        // below can miss by rounding.
        if points.iter().all(|p| p.1 == first_y) {
            return Ok(Self {
                slope: 0.0,
                intercept: first_y,
            });
        }

        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for &(x, y) in points {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        Ok(Self {
            slope: slope * stress_multiplier,
            intercept,
        })
    }

    /// Cycle at which the line reaches `threshold`.
    ///
    /// A zero slope never reaches any threshold and yields positive infinity.
    pub fn to_threshold(&self, threshold: f64) -> f64 {
        if self.slope == 0.0 {
            f64::INFINITY
        } else {
            (threshold - self.intercept) / self.slope
        }
    }

    /// Indicator value predicted at `cycle`
    pub fn value_at(&self, cycle: f64) -> f64 {
        self.slope * cycle + self.intercept
    }

    pub fn is_flat(&self) -> bool {
        self.slope == 0.0
    }
}

fn distinct_count(points: &[(f64, f64)]) -> usize {
    let mut cycles: Vec<f64> = points.iter().map(|p| p.0).collect();
    cycles.sort_by(f64::total_cmp);
    cycles.dedup();
    cycles.len()
}
