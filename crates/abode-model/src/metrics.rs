//! Regression metrics and cross-validation scoring.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ModelError::DimensionMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    Ok(mean(
        &y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).abs())
            .collect::<Vec<_>>(),
    ))
}

/// Mean squared error.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    Ok(mean(
        &y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .collect::<Vec<_>>(),
    ))
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let y_mean = mean(y_true);
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Mean absolute error of always predicting the mean of `y_true`.
pub fn baseline_mae(y_true: &[f64]) -> Result<f64> {
    if y_true.is_empty() {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    let y_mean = mean(y_true);
    mean_absolute_error(y_true, &vec![y_mean; y_true.len()])
}

/// Fold score used to rank candidates. Higher is better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Coefficient of determination
    R2,
    /// Negated mean squared error
    #[default]
    NegMeanSquaredError,
}

impl Scoring {
    /// Score predictions against held-out targets.
    pub fn score(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
        match self {
            Self::R2 => r2_score(y_true, y_pred),
            Self::NegMeanSquaredError => mean_squared_error(y_true, y_pred).map(|mse| -mse),
        }
    }

    /// Short name for reports.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::R2 => "r2",
            Self::NegMeanSquaredError => "neg_mean_squared_error",
        }
    }
}
