//! Holt linear (double) exponential smoothing.
//!
//! The level is seeded from the first point and the trend from the slope
//! between the first two. The trend is kept per year, so uneven gaps in the
//! year axis scale it by the step between consecutive points. In-sample
//! values are one-step-ahead forecasts; the first point's is the point
//! itself.

use crate::{ForecastError, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct HoltTrend {
    level: f64,
    /// Change per year.
    trend: f64,
    last_year: i32,
    in_sample: Vec<f64>,
}

impl HoltTrend {
    /// Runs the smoothing over year-ordered `points` with distinct years.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InsufficientData`] with fewer than two points
    pub fn fit(points: &[(i32, f64)], alpha: f64, beta: f64) -> Result<Self, ForecastError> {
        let &[(first_year, first), (second_year, second), ..] = points else {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: points.len(),
            });
        };

        let mut level = first;
        let mut trend = (second - first) / f64::from(second_year - first_year);
        let mut in_sample = Vec::with_capacity(points.len());
        in_sample.push(first);

        for pair in points.windows(2) {
            let (prev_year, _) = pair[0];
            let (year, value) = pair[1];
            let step = f64::from(year - prev_year);

            let projected = trend.mul_add(step, level);
            in_sample.push(projected);

            let next_level = alpha.mul_add(value, (1.0 - alpha) * projected);
            trend = beta.mul_add((next_level - level) / step, (1.0 - beta) * trend);
            level = next_level;
        }

        let last_year = points.last().map_or(second_year, |&(t, _)| t);
        Ok(Self {
            level,
            trend,
            last_year,
            in_sample,
        })
    }

    /// Smoothed level at the last point.
    #[must_use]
    pub const fn level(&self) -> f64 {
        self.level
    }

    /// Smoothed change per year at the last point.
    #[must_use]
    pub const fn trend(&self) -> f64 {
        self.trend
    }
}

impl Trend for HoltTrend {
    fn in_sample(&self) -> &[f64] {
        &self.in_sample
    }

    fn project(&self, year: i32) -> f64 {
        self.trend
            .mul_add(f64::from(year - self.last_year), self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(year: i32) -> f64 {
        0.5f64.mul_add(f64::from(year - 2000), 10.0)
    }

    #[test]
    fn follows_linear_series_exactly() {
        let points: Vec<(i32, f64)> = (2000..=2010).map(|y| (y, line(y))).collect();
        let model = HoltTrend::fit(&points, 0.5, 0.3).unwrap();
        assert!((model.trend() - 0.5).abs() < 1e-12);
        assert!((model.project(2015) - 17.5).abs() < 1e-9);
        for (fitted, (_, actual)) in model.in_sample().iter().zip(&points) {
            assert!((fitted - actual).abs() < 1e-9);
        }
    }

    #[test]
    fn gaps_scale_the_trend() {
        let points: Vec<(i32, f64)> = [2000, 2002, 2006]
            .into_iter()
            .map(|y| (y, line(y)))
            .collect();
        let model = HoltTrend::fit(&points, 0.3, 0.1).unwrap();
        assert!((model.in_sample()[2] - 13.0).abs() < 1e-9);
        assert!((model.project(2010) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn smooths_toward_recent_values() {
        let points = [(2000, 10.0), (2001, 11.0), (2002, 11.0), (2003, 11.0)];
        let model = HoltTrend::fit(&points, 0.8, 0.5).unwrap();
        // The initial upward trend decays once the series flattens.
        assert!(model.trend() < 1.0);
        assert!(model.level() > 10.0 && model.level() < 12.0);
    }

    #[test]
    fn single_point_is_insufficient() {
        assert!(matches!(
            HoltTrend::fit(&[(2000, 1.0)], 0.5, 0.5),
            Err(ForecastError::InsufficientData {
                required: 2,
                actual: 1
            })
        ));
    }
}
