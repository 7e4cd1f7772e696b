//! Ordinary least-squares straight line over the year axis.
//!
//! Years are centred on their mean before fitting so that the normal
//! equations stay well conditioned for values around 2000.

use crate::{ForecastError, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct LinearTrend {
    mean_year: f64,
    intercept: f64,
    slope: f64,
    in_sample: Vec<f64>,
}

impl LinearTrend {
    /// Fits `value = intercept + slope * (year - mean_year)`.
    ///
    /// `points` must hold at least two distinct years.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InsufficientData`] with fewer than two points
    /// * [`ForecastError::Numerical`] if every year is the same
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(points: &[(i32, f64)]) -> Result<Self, ForecastError> {
        if points.len() < 2 {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: points.len(),
            });
        }

        let n = points.len() as f64;
        let mean_year = points.iter().map(|&(t, _)| f64::from(t)).sum::<f64>() / n;
        let mean_value = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(t, y)| {
            let dx = f64::from(t) - mean_year;
            (dx.mul_add(y - mean_value, sxy), dx.mul_add(dx, sxx))
        });
        if sxx.abs() < f64::EPSILON {
            return Err(ForecastError::Numerical(
                "all years are identical; slope is undefined".to_string(),
            ));
        }

        let slope = sxy / sxx;
        let mut model = Self {
            mean_year,
            intercept: mean_value,
            slope,
            in_sample: Vec::new(),
        };
        model.in_sample = points.iter().map(|&(t, _)| model.value_at(t)).collect();
        Ok(model)
    }

    /// Change per year.
    #[must_use]
    pub const fn slope(&self) -> f64 {
        self.slope
    }

    /// Value of the fitted line at the mean year.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Value of the fitted line at any year.
    #[must_use]
    pub fn value_at(&self, year: i32) -> f64 {
        self.slope
            .mul_add(f64::from(year) - self.mean_year, self.intercept)
    }
}

impl Trend for LinearTrend {
    fn in_sample(&self) -> &[f64] {
        &self.in_sample
    }

    fn project(&self, year: i32) -> f64 {
        self.value_at(year)
    }
}
