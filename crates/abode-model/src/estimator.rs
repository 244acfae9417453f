//! Fitted per-segment estimator.
//!
//! A segment model is the pipeline select → periodic(H) → standardise →
//! Lasso(α), fitted on every row of one segment.

use crate::config::LassoConfig;
use crate::error::{ModelError, Result};
use crate::lasso::{FittedLasso, Lasso};
use crate::metrics::mean_absolute_error;
use crate::scaling::StandardScaler;
use crate::search::{Candidate, CvResult};
use abode_data::{Observations, SegmentKey};
use abode_features::{FeaturePipeline, PeriodicExpansion, SelectFeatures};
use ndarray::{Array1, Array2};

/// Selection of `features` followed by `harmonics` calendar harmonics.
pub fn fit_pipeline(features: &[String], harmonics: usize) -> Result<FeaturePipeline> {
    Ok(FeaturePipeline::new(
        features.iter().cloned(),
        vec![
            SelectFeatures::new(features.iter().cloned())?.into(),
            PeriodicExpansion::new(harmonics).into(),
        ],
    )?)
}

/// Apply `pipeline` and collect its output columns into a finite matrix.
pub(crate) fn design_matrix(pipeline: &FeaturePipeline, table: &Observations) -> Result<Array2<f64>> {
    let transformed = pipeline.apply(table)?;
    let columns = pipeline.output_schema();
    let x = transformed.to_matrix(columns)?;

    if let Some(((_, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ModelError::NonFinite(columns[col].clone()));
    }
    Ok(x)
}

/// Target column as a finite vector.
pub(crate) fn target_vector(table: &Observations, target: &str) -> Result<Array1<f64>> {
    let values = table.column(target)?;
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite(target.to_string()));
    }
    Ok(Array1::from(values.to_vec()))
}

/// Estimator for one segment, immutable once fitted.
#[derive(Debug, Clone)]
pub struct FittedSegmentModel {
    segment: SegmentKey,
    pipeline: FeaturePipeline,
    scaler: StandardScaler,
    lasso: FittedLasso,
    cv: CvResult,
    observations: usize,
    training_mae: f64,
}

impl FittedSegmentModel {
    /// Refit the winning candidate of `cv` on all of `table`.
    pub fn fit(
        segment: SegmentKey,
        table: &Observations,
        target: &str,
        features: &[String],
        cv: CvResult,
        lasso: LassoConfig,
    ) -> Result<Self> {
        if table.is_empty() {
            return Err(ModelError::EmptySegment(segment));
        }

        let pipeline = fit_pipeline(features, cv.candidate.harmonics)?;
        let x = design_matrix(&pipeline, table)?;
        let y = target_vector(table, target)?;

        let scaler = StandardScaler::fit(&x)?;
        let z = scaler.transform(&x)?;
        let fitted = Lasso::new(cv.candidate.alpha, lasso)?.fit(&z, &y)?;

        let in_sample = fitted.predict(&z)?;
        let training_mae = mean_absolute_error(&y.to_vec(), &in_sample.to_vec())?;

        Ok(Self {
            segment,
            pipeline,
            scaler,
            lasso: fitted,
            cv,
            observations: table.len(),
            training_mae,
        })
    }

    /// Predict one value per row of `features`.
    pub fn predict(&self, features: &Observations) -> Result<Vec<f64>> {
        let x = design_matrix(&self.pipeline, features)?;
        let z = self.scaler.transform(&x)?;
        Ok(self.lasso.predict(&z)?.to_vec())
    }

    /// Segment this model belongs to.
    pub const fn segment(&self) -> SegmentKey {
        self.segment
    }

    /// Winning hyper-parameters.
    pub const fn candidate(&self) -> Candidate {
        self.cv.candidate
    }

    /// Cross-validation result of the winning candidate.
    pub const fn cv(&self) -> &CvResult {
        &self.cv
    }

    /// Mean fold score of the winning candidate.
    pub const fn cv_score(&self) -> f64 {
        self.cv.mean_score
    }

    /// Names of the model inputs after harmonic expansion.
    pub fn feature_names(&self) -> &[String] {
        self.pipeline.output_schema()
    }

    /// Coefficient per model input, on the standardised scale.
    pub fn coefficients(&self) -> Vec<(String, f64)> {
        self.feature_names()
            .iter()
            .cloned()
            .zip(self.lasso.coefficients().iter().copied())
            .collect()
    }

    /// Intercept on the standardised scale.
    pub const fn intercept(&self) -> f64 {
        self.lasso.intercept()
    }

    /// Number of non-zero coefficients.
    pub fn n_nonzero(&self) -> usize {
        self.lasso.n_nonzero()
    }

    /// Whether the final Lasso fit converged.
    pub const fn converged(&self) -> bool {
        self.lasso.converged()
    }

    /// Number of training rows.
    pub const fn observations(&self) -> usize {
        self.observations
    }

    /// Mean absolute error on the training rows.
    pub const fn training_mae(&self) -> f64 {
        self.training_mae
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abode_data::calendar::month_end_from_index;

    fn table(n: usize) -> Observations {
        let dates = (0..n as i64)
            .map(|i| month_end_from_index(24_150 + i).unwrap())
            .collect();
        Observations::new(dates)
            .with_column("x", (0..n).map(|i| i as f64).collect())
            .unwrap()
            .with_column("target", (0..n).map(|i| 50.0 + 2.0 * i as f64).collect())
            .unwrap()
    }

    fn cv(alpha: f64, harmonics: usize) -> CvResult {
        CvResult {
            candidate: Candidate { alpha, harmonics },
            fold_scores: vec![-1.0],
            mean_score: -1.0,
            std_score: 0.0,
        }
    }

    #[test]
    fn test_fit_and_predict() {
        let key = SegmentKey::new(2, 1).unwrap();
        let t = table(24);
        let model =
            FittedSegmentModel::fit(key, &t, "target", &["x".to_string()], cv(0.1, 2), LassoConfig::default())
                .unwrap();

        assert_eq!(model.segment(), key);
        assert_eq!(model.observations(), 24);
        assert_eq!(
            model.feature_names(),
            &["x", "sin1_month", "cos1_month", "sin2_month", "cos2_month"]
        );
        let predictions = model.predict(&t).unwrap();
        assert_eq!(predictions.len(), 24);
        assert!(model.training_mae() < 1.0);
    }

    #[test]
    fn test_non_finite_feature() {
        let key = SegmentKey::new(1, 1).unwrap();
        let mut t = table(12);
        t.drop_column("x").unwrap();
        let mut x: Vec<f64> = (0..12).map(f64::from).collect();
        x[3] = f64::NAN;
        t.add_column("x", x).unwrap();

        let result =
            FittedSegmentModel::fit(key, &t, "target", &["x".to_string()], cv(0.1, 0), LassoConfig::default());
        assert!(matches!(result, Err(ModelError::NonFinite(c)) if c == "x"));
    }

    #[test]
    fn test_empty_segment() {
        let key = SegmentKey::new(4, 3).unwrap();
        let t = table(0);
        assert!(matches!(
            FittedSegmentModel::fit(key, &t, "target", &["x".to_string()], cv(0.1, 0), LassoConfig::default()),
            Err(ModelError::EmptySegment(k)) if k == key
        ));
    }
}
