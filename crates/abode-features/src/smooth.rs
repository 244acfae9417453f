//! Savitzky–Golay smoothing.
//!
//! Interior points are the value at the centre of a least-squares polynomial
//! fitted to the surrounding window. The first and last `window_length / 2`
//! points are taken from a polynomial fitted to the first and last full
//! window respectively, so the output has the same length as the input.

use crate::error::{FeatureError, Result};
use crate::transform::ensure_series;
use abode_data::Observations;
use serde::{Deserialize, Serialize};

/// Suffix appended to a smoothed column name.
pub const SAVGOL_SUFFIX: &str = "_savgol";

/// Configuration for Savitzky–Golay smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Window length, odd (default: 11)
    pub window_length: usize,

    /// Order of the local polynomial, below the window length (default: 3)
    pub poly_order: usize,

    /// Keep the raw source column next to the smoothed one (default: true)
    pub retain_source: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_length: 11,
            poly_order: 3,
            retain_source: true,
        }
    }
}

/// Smooth one column and append it as `<column>_savgol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavgolFilter {
    column: String,
    config: SmoothingConfig,
}

impl SavgolFilter {
    /// Create a filter for `column`.
    pub fn new(column: impl Into<String>, config: SmoothingConfig) -> Result<Self> {
        let filter = Self {
            column: column.into(),
            config,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// Source column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Filter configuration.
    pub const fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Name of the produced column.
    pub fn output_column(&self) -> String {
        format!("{}{SAVGOL_SUFFIX}", self.column)
    }

    /// Stage label used in errors.
    pub fn stage(&self) -> String {
        format!("smooth({})", self.column)
    }

    /// Check window length and polynomial order.
    pub fn validate(&self) -> Result<()> {
        let SmoothingConfig {
            window_length,
            poly_order,
            ..
        } = self.config;

        if window_length % 2 == 0 {
            return Err(FeatureError::InvalidParameter {
                stage: self.stage(),
                reason: format!("window length {window_length} must be odd"),
            });
        }
        if window_length < poly_order + 1 {
            return Err(FeatureError::InvalidParameter {
                stage: self.stage(),
                reason: format!(
                    "window length {window_length} must exceed polynomial order {poly_order}"
                ),
            });
        }
        Ok(())
    }

    /// Smooth the source column of a date-ordered series.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        let stage = self.stage();
        let values = table
            .column(&self.column)
            .map_err(|_| FeatureError::MissingColumn {
                stage: stage.clone(),
                column: self.column.clone(),
            })?;
        ensure_series(table, &stage)?;

        let smoothed = savgol(values, self.config.window_length, self.config.poly_order)
            .ok_or(FeatureError::InsufficientData {
                stage,
                required: self.config.window_length,
                actual: values.len(),
            })?;

        let mut out = table.clone();
        out.add_column(self.output_column(), smoothed)?;
        if !self.config.retain_source {
            out.drop_column(&self.column)?;
        }
        Ok(out)
    }
}

/// Smooth `data` with a Savitzky–Golay filter.
///
/// Returns `None` when the series is shorter than the window.
pub fn savgol(data: &[f64], window_length: usize, poly_order: usize) -> Option<Vec<f64>> {
    let n = data.len();
    if n < window_length || window_length == 0 || poly_order >= window_length {
        return None;
    }
    let half = window_length / 2;

    let centre = evaluation_weights(window_length, poly_order, 0.0)?;
    let mut out = vec![0.0; n];

    for i in half..n - half {
        out[i] = dot(&centre, &data[i - half..=i + half]);
    }

    let head = &data[..window_length];
    let tail = &data[n - window_length..];
    for i in 0..half {
        let offset = i as f64 - half as f64;
        out[i] = dot(&evaluation_weights(window_length, poly_order, offset)?, head);

        let j = n - half + i;
        let offset = (i + 1) as f64;
        out[j] = dot(&evaluation_weights(window_length, poly_order, offset)?, tail);
    }

    Some(out)
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

/// Weights `w` such that `w · window` is the least-squares polynomial of
/// order `poly_order`, fitted at positions `-half..=half`, evaluated at `at`.
fn evaluation_weights(window_length: usize, poly_order: usize, at: f64) -> Option<Vec<f64>> {
    let half = (window_length / 2) as f64;
    let terms = poly_order + 1;

    // Vandermonde matrix over centred positions
    let vander: Vec<Vec<f64>> = (0..window_length)
        .map(|i| {
            let x = i as f64 - half;
            (0..terms).map(|p| x.powi(p as i32)).collect()
        })
        .collect();

    let mut gram = vec![vec![0.0; terms]; terms];
    for row in &vander {
        for a in 0..terms {
            for b in 0..terms {
                gram[a][b] += row[a] * row[b];
            }
        }
    }

    let target: Vec<f64> = (0..terms).map(|p| at.powi(p as i32)).collect();
    let z = solve(gram, target)?;

    Some(vander.iter().map(|row| dot(row, &z)).collect())
}

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
