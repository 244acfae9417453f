//! Per-column standardisation.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, Axis};

/// Column means and population standard deviations learned from training data.
///
/// Zero-variance columns get a scale of 1 so they map to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn column statistics.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            })?;
        let scale = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });

        Ok(Self { mean, scale })
    }

    /// Standardise rows with the learned statistics.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.mean.len(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    /// Column means.
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Column scales.
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_standardises_columns() {
        let x = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        assert_abs_diff_eq!(z.column(0).mean().unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.column(0).std(0.0), 1.0, epsilon = 1e-12);
        // constant column maps to zero
        assert!(z.column(1).iter().all(|v| *v == 0.0));
        assert_eq!(scaler.scale()[1], 1.0);
    }

    #[test]
    fn test_column_count_checked() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0]]).is_err());
    }
}
