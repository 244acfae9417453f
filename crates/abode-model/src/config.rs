//! Model configuration.

use crate::metrics::Scoring;
use abode_features::{MAX_HARMONICS, SmoothingConfig};
use serde::{Deserialize, Serialize};

/// `num` values spaced evenly on a log10 scale from `10^start` to `10^stop`.
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

/// Lasso solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LassoConfig {
    /// Maximum coordinate-descent sweeps (default: 1000)
    pub max_iter: usize,

    /// Stop when the largest coefficient update is below `tol · max|w|`
    /// (default: 1e-4)
    pub tol: f64,
}

impl Default for LassoConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Hyper-parameter search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate harmonic counts (default: 0..=6)
    pub harmonics: Vec<usize>,

    /// Candidate Lasso strengths (default: logspace(-1, 3, 3))
    pub alphas: Vec<f64>,

    /// Number of cross-validation folds (default: 5)
    pub folds: usize,

    /// Shuffle rows before splitting (default: true)
    pub shuffle: bool,

    /// Seed for the shuffle (default: 20)
    pub seed: u64,

    /// Fold score to maximise (default: negative mean squared error)
    ///
    /// [`Scoring::R2`] ranks candidates by mean per-fold R², as scikit-learn's
    /// `GridSearchCV` does without an explicit scorer.
    pub scoring: Scoring,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            harmonics: (0..=MAX_HARMONICS).collect(),
            alphas: logspace(-1.0, 3.0, 3),
            folds: 5,
            shuffle: true,
            seed: 20,
            scoring: Scoring::default(),
        }
    }
}

/// What `fit_all` does when a segment cannot be fitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Fit every segment that can be fitted and report the rest
    #[default]
    BestEffort,
    /// Abort on the first failing segment
    Strict,
}

/// Complete model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Savitzky–Golay settings for raw feature smoothing
    pub smoothing: SmoothingConfig,

    /// Highest derivative order of the smoothed mortgage rate (default: 2)
    pub derivative_order: usize,

    /// Cross-validated search space
    pub search: SearchConfig,

    /// Lasso solver settings
    pub lasso: LassoConfig,

    /// Failure policy for segment fits
    pub policy: FitPolicy,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            derivative_order: 2,
            search: SearchConfig::default(),
            lasso: LassoConfig::default(),
            policy: FitPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_logspace() {
        let alphas = logspace(-1.0, 3.0, 3);
        assert_eq!(alphas.len(), 3);
        assert_relative_eq!(alphas[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(alphas[1], 10.0, epsilon = 1e-12);
        assert_relative_eq!(alphas[2], 1000.0, epsilon = 1e-9);
        assert!(logspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.harmonics, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(config.folds, 5);
        assert!(config.shuffle);
        assert_eq!(config.seed, 20);
        assert_eq!(config.scoring, Scoring::NegMeanSquaredError);
    }

    #[test]
    fn test_r2_scoring_option() {
        let config = SearchConfig {
            scoring: Scoring::R2,
            ..Default::default()
        };
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(config.scoring.score(&y, &y).unwrap(), 1.0);
        assert_relative_eq!(config.scoring.score(&y, &[2.5; 4]).unwrap(), 0.0);
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.derivative_order, 2);
        assert_eq!(config.smoothing.window_length, 11);
        assert_eq!(config.smoothing.poly_order, 3);
        assert!(config.smoothing.retain_source);
        assert_eq!(config.lasso.max_iter, 1000);
        assert_eq!(config.policy, FitPolicy::BestEffort);
    }
}
