//! L1-regularised linear regression by coordinate descent.
//!
//! Minimises `(1 / 2n) · ‖y − Xw − b‖² + α · ‖w‖₁` with an unpenalised
//! intercept `b`.

use crate::config::LassoConfig;
use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, Axis};

/// Lasso estimator with a fixed regularisation strength.
#[derive(Debug, Clone, Copy)]
pub struct Lasso {
    alpha: f64,
    config: LassoConfig,
}

/// Coefficients of a fitted Lasso.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedLasso {
    coefficients: Array1<f64>,
    intercept: f64,
    iterations: usize,
    converged: bool,
}

impl Lasso {
    /// Create a Lasso with strength `alpha`.
    pub fn new(alpha: f64, config: LassoConfig) -> Result<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "alpha must be a non-negative number, got {alpha}"
            )));
        }
        if config.max_iter == 0 || config.tol.is_nan() || config.tol <= 0.0 {
            return Err(ModelError::InvalidParameter(
                "lasso needs max_iter > 0 and tol > 0".to_string(),
            ));
        }
        Ok(Self { alpha, config })
    }

    /// Regularisation strength.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fit coefficients to `x` (rows are observations) and `y`.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLasso> {
        let (n, p) = x.dim();
        if n != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.sum() / n as f64;
        let xc = x - &x_mean;
        let yc = y - y_mean;

        let col_norms: Vec<f64> = xc
            .columns()
            .into_iter()
            .map(|c| c.dot(&c))
            .collect();

        let threshold = self.alpha * n as f64;
        let mut w = Array1::<f64>::zeros(p);
        let mut residual = yc;
        let mut iterations = 0;
        let mut converged = p == 0;

        while !converged && iterations < self.config.max_iter {
            iterations += 1;
            let mut max_delta = 0.0_f64;
            let mut max_w = 0.0_f64;

            for j in 0..p {
                let column = xc.column(j);
                let old = w[j];
                let new = if col_norms[j] > 1e-12 {
                    let rho = column.dot(&residual) + col_norms[j] * old;
                    soft_threshold(rho, threshold) / col_norms[j]
                } else {
                    0.0
                };

                if new != old {
                    residual.scaled_add(old - new, &column);
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_w = max_w.max(new.abs());
            }

            converged = max_delta <= self.config.tol * max_w || max_w == 0.0;
        }

        if !converged {
            tracing::warn!(
                alpha = self.alpha,
                iterations,
                "lasso did not converge; consider more iterations"
            );
        }

        let intercept = y_mean - x_mean.dot(&w);
        Ok(FittedLasso {
            coefficients: w,
            intercept,
            iterations,
            converged,
        })
    }
}

fn soft_threshold(x: f64, lambda: f64) -> f64 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

impl FittedLasso {
    /// Predict targets for the rows of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }

    /// Coefficients, one per input column.
    pub const fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Number of non-zero coefficients.
    pub fn n_nonzero(&self) -> usize {
        self.coefficients.iter().filter(|c| **c != 0.0).count()
    }

    /// Coordinate-descent sweeps performed.
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the tolerance was reached.
    pub const fn converged(&self) -> bool {
        self.converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn design() -> (Array2<f64>, Array1<f64>) {
        let n = 40;
        let x = Array2::from_shape_fn((n, 3), |(i, j)| {
            let t = i as f64;
            match j {
                0 => (t * 0.3).sin(),
                1 => (t * 0.17).cos(),
                _ => t / n as f64,
            }
        });
        let y = x.column(0).mapv(|v| 3.0 * v) + x.column(1).mapv(|v| -2.0 * v) + 5.0;
        (x, y)
    }

    #[test]
    fn test_small_alpha_recovers_coefficients() {
        let (x, y) = design();
        let fit = Lasso::new(1e-6, LassoConfig { max_iter: 100_000, tol: 1e-9 })
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        assert!(fit.converged());
        assert_relative_eq!(fit.coefficients()[0], 3.0, epsilon = 1e-3);
        assert_relative_eq!(fit.coefficients()[1], -2.0, epsilon = 1e-3);
        assert_relative_eq!(fit.coefficients()[2], 0.0, epsilon = 1e-3);
        assert_relative_eq!(fit.intercept(), 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_large_alpha_gives_intercept_only() {
        let (x, y) = design();
        let fit = Lasso::new(1000.0, LassoConfig::default())
            .unwrap()
            .fit(&x, &y)
            .unwrap();
        assert_eq!(fit.n_nonzero(), 0);
        assert_relative_eq!(fit.intercept(), y.mean().unwrap(), epsilon = 1e-12);
        let pred = fit.predict(&x).unwrap();
        assert!(pred.iter().all(|p| (p - fit.intercept()).abs() < 1e-12));
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(Lasso::new(-1.0, LassoConfig::default()).is_err());
        assert!(Lasso::new(f64::NAN, LassoConfig::default()).is_err());
    }

    #[test]
    fn test_dimension_checks() {
        let (x, y) = design();
        let lasso = Lasso::new(0.1, LassoConfig::default()).unwrap();
        let short = y.slice(ndarray::s![..10]).to_owned();
        assert!(lasso.fit(&x, &short).is_err());
        let fit = lasso.fit(&x, &y).unwrap();
        assert!(fit.predict(&Array2::zeros((2, 2))).is_err());
    }
}
