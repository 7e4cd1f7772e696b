//! Least-squares polynomial trend.
//!
//! Years are centred on their mean and scaled into `[-1, 1]`, then the
//! normal equations `(XᵀX) c = Xᵀy` are solved by Gaussian elimination with
//! partial pivoting.

use crate::{ForecastError, Trend};

/// Pivots smaller than this are treated as zero.
const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialTrend {
    center: f64,
    scale: f64,
    /// Lowest order first.
    coefficients: Vec<f64>,
    in_sample: Vec<f64>,
}

impl PolynomialTrend {
    /// Fits a polynomial of `degree` to `points`, which must hold at least
    /// `degree + 1` distinct years.
    ///
    /// # Errors
    ///
    /// * [`ForecastError::InsufficientData`] with too few points
    /// * [`ForecastError::Numerical`] if the normal equations are singular
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(points: &[(i32, f64)], degree: u8) -> Result<Self, ForecastError> {
        let terms = usize::from(degree) + 1;
        if points.len() < terms {
            return Err(ForecastError::InsufficientData {
                required: terms,
                actual: points.len(),
            });
        }

        let center =
            points.iter().map(|&(t, _)| f64::from(t)).sum::<f64>() / points.len() as f64;
        let spread = points
            .iter()
            .map(|&(t, _)| (f64::from(t) - center).abs())
            .fold(0.0, f64::max);
        let scale = if spread > 0.0 { spread } else { 1.0 };

        let mut normal = vec![vec![0.0; terms]; terms];
        let mut rhs = vec![0.0; terms];
        for &(t, y) in points {
            let powers = powers((f64::from(t) - center) / scale, terms);
            for (row, &pr) in powers.iter().enumerate() {
                rhs[row] = pr.mul_add(y, rhs[row]);
                for (col, &pc) in powers.iter().enumerate() {
                    normal[row][col] = pr.mul_add(pc, normal[row][col]);
                }
            }
        }

        let coefficients = solve(normal, rhs)?;
        let mut model = Self {
            center,
            scale,
            coefficients,
            in_sample: Vec::new(),
        };
        model.in_sample = points.iter().map(|&(t, _)| model.value_at(t)).collect();
        Ok(model)
    }

    /// Value of the fitted curve at any year.
    #[must_use]
    pub fn value_at(&self, year: i32) -> f64 {
        let x = (f64::from(year) - self.center) / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc.mul_add(x, c))
    }
}

impl Trend for PolynomialTrend {
    fn in_sample(&self) -> &[f64] {
        &self.in_sample
    }

    fn project(&self, year: i32) -> f64 {
        self.value_at(year)
    }
}

fn powers(x: f64, terms: usize) -> Vec<f64> {
    std::iter::successors(Some(1.0), |p| Some(p * x))
        .take(terms)
        .collect()
}

/// Solves `a · x = b` in place by Gaussian elimination with partial
/// pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, ForecastError> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(ForecastError::Numerical(
                "normal equations are singular".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] = factor.mul_add(-a[col][k], a[row][k]);
            }
            b[row] = factor.mul_add(-b[col], b[row]);
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(ForecastError::Numerical(
            "polynomial fit produced non-finite coefficients".to_string(),
        ))
    }
}
