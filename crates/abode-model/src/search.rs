//! Cross-validated grid search over Lasso strength and harmonic count.

use crate::config::{LassoConfig, SearchConfig};
use crate::cv::KFold;
use crate::error::{ModelError, Result};
use crate::estimator::{design_matrix, fit_pipeline, target_vector};
use crate::lasso::Lasso;
use crate::scaling::StandardScaler;
use abode_data::Observations;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One point of the hyper-parameter grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Lasso regularisation strength
    pub alpha: f64,
    /// Number of calendar-month harmonics
    pub harmonics: usize,
}

/// Every candidate, alpha outer and harmonics inner.
pub fn candidate_grid(config: &SearchConfig) -> Vec<Candidate> {
    config
        .alphas
        .iter()
        .flat_map(|&alpha| {
            config
                .harmonics
                .iter()
                .map(move |&harmonics| Candidate { alpha, harmonics })
        })
        .collect()
}

/// Fold scores of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResult {
    /// Evaluated candidate
    pub candidate: Candidate,
    /// Score on each held-out fold
    pub fold_scores: Vec<f64>,
    /// Mean fold score
    pub mean_score: f64,
    /// Population standard deviation of the fold scores
    pub std_score: f64,
}

impl CvResult {
    fn new(candidate: Candidate, fold_scores: Vec<f64>) -> Self {
        let n = fold_scores.len() as f64;
        let mean_score = fold_scores.iter().sum::<f64>() / n;
        let std_score = (fold_scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        Self {
            candidate,
            fold_scores,
            mean_score,
            std_score,
        }
    }
}

/// Results of a grid search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    results: Vec<CvResult>,
    best: usize,
}

impl SearchOutcome {
    /// Winning candidate's result.
    pub fn best(&self) -> &CvResult {
        &self.results[self.best]
    }

    /// Every candidate's result, in grid order.
    pub fn results(&self) -> &[CvResult] {
        &self.results
    }

    /// Take the winning result.
    pub fn into_best(mut self) -> CvResult {
        self.results.swap_remove(self.best)
    }
}

/// Exhaustive search over [`candidate_grid`] with k-fold cross-validation.
#[derive(Debug, Clone)]
pub struct GridSearch {
    config: SearchConfig,
    lasso: LassoConfig,
    kfold: KFold,
}

impl GridSearch {
    /// Create a search. The grid must not be empty.
    pub fn new(config: SearchConfig, lasso: LassoConfig) -> Result<Self> {
        if config.alphas.is_empty() || config.harmonics.is_empty() {
            return Err(ModelError::InvalidParameter(
                "search grid needs at least one alpha and one harmonic count".to_string(),
            ));
        }
        let kfold = KFold::new(config.folds, config.shuffle, config.seed)?;
        Ok(Self {
            config,
            lasso,
            kfold,
        })
    }

    /// Search configuration.
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Score every candidate on `table` and pick the best mean fold score.
    ///
    /// Ties keep the earlier candidate in grid order.
    pub fn run(&self, table: &Observations, target: &str, features: &[String]) -> Result<SearchOutcome> {
        let y = target_vector(table, target)?;
        let splits = self.kfold.split(table.len())?;

        let mut designs: HashMap<usize, Array2<f64>> = HashMap::new();
        for &h in &self.config.harmonics {
            if !designs.contains_key(&h) {
                let pipeline = fit_pipeline(features, h)?;
                designs.insert(h, design_matrix(&pipeline, table)?);
            }
        }

        let mut results = Vec::new();
        for candidate in candidate_grid(&self.config) {
            let x = designs
                .get(&candidate.harmonics)
                .ok_or_else(|| ModelError::InvalidParameter("missing design matrix".to_string()))?;
            let lasso = Lasso::new(candidate.alpha, self.lasso)?;

            let fold_scores = splits
                .iter()
                .map(|split| {
                    let x_train = x.select(Axis(0), &split.train);
                    let y_train: Array1<f64> = y.select(Axis(0), &split.train);
                    let x_test = x.select(Axis(0), &split.test);
                    let y_test = y.select(Axis(0), &split.test);

                    let scaler = StandardScaler::fit(&x_train)?;
                    let fit = lasso.fit(&scaler.transform(&x_train)?, &y_train)?;
                    let predicted = fit.predict(&scaler.transform(&x_test)?)?;
                    self.config
                        .scoring
                        .score(&y_test.to_vec(), &predicted.to_vec())
                })
                .collect::<Result<Vec<_>>>()?;

            let result = CvResult::new(candidate, fold_scores);
            tracing::debug!(
                alpha = candidate.alpha,
                harmonics = candidate.harmonics,
                mean_score = result.mean_score,
                std_score = result.std_score,
                "scored candidate"
            );
            results.push(result);
        }

        let mut best = 0;
        for (i, result) in results.iter().enumerate().skip(1) {
            if result.mean_score > results[best].mean_score {
                best = i;
            }
        }

        Ok(SearchOutcome { results, best })
    }
}
