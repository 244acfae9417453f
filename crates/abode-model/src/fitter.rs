//! Fitting one model per market segment.

use crate::config::{FitPolicy, ModelConfig};
use crate::error::{ModelError, Result};
use crate::estimator::FittedSegmentModel;
use crate::search::GridSearch;
use abode_data::{Observations, SegmentKey};
use abode_features::FeatureError;
use std::collections::BTreeMap;

/// Lookup from segment key to fitted model, built once per training run.
#[derive(Debug, Clone, Default)]
pub struct SegmentModels {
    models: BTreeMap<SegmentKey, FittedSegmentModel>,
}

impl SegmentModels {
    /// Model for a key, or the missing-model error.
    pub fn get(&self, key: SegmentKey) -> Result<&FittedSegmentModel> {
        self.models.get(&key).ok_or_else(|| ModelError::not_fitted(key))
    }

    /// Model for raw codes. Codes outside the segment universe fail with the
    /// same missing-model error as an unfitted segment.
    pub fn get_model(&self, bedrooms: i64, density_code: i64) -> Result<&FittedSegmentModel> {
        SegmentKey::from_codes(bedrooms, density_code)
            .ok()
            .and_then(|key| self.models.get(&key))
            .ok_or(ModelError::SegmentNotFitted {
                bedrooms,
                density_code,
            })
    }

    /// Whether a key has a model.
    pub fn contains(&self, key: SegmentKey) -> bool {
        self.models.contains_key(&key)
    }

    /// Fitted keys, in key order.
    pub fn keys(&self) -> impl Iterator<Item = SegmentKey> + '_ {
        self.models.keys().copied()
    }

    /// Fitted models, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&SegmentKey, &FittedSegmentModel)> {
        self.models.iter()
    }

    /// Number of fitted segments.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no segment is fitted.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<FittedSegmentModel> for SegmentModels {
    fn from_iter<I: IntoIterator<Item = FittedSegmentModel>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().map(|m| (m.segment(), m)).collect(),
        }
    }
}

/// A segment that could not be fitted.
#[derive(Debug)]
pub struct SegmentFailure {
    /// Segment key
    pub segment: SegmentKey,
    /// Why the fit failed
    pub error: ModelError,
}

/// Which segments were fitted and which failed.
#[derive(Debug, Default)]
pub struct FitReport {
    /// Fitted segments, in fit order
    pub fitted: Vec<SegmentKey>,
    /// Failed segments, in fit order
    pub failures: Vec<SegmentFailure>,
}

impl FitReport {
    /// Whether every segment was fitted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Keys of the failed segments.
    pub fn failed_keys(&self) -> Vec<SegmentKey> {
        self.failures.iter().map(|f| f.segment).collect()
    }

    /// `Ok` if every segment was fitted, otherwise the aggregate failure.
    pub fn into_result(self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ModelError::PartialFit {
                failed: self.failed_keys(),
            })
        }
    }
}

/// Progress notification for one segment.
#[derive(Debug)]
pub enum FitEvent<'a> {
    /// The segment was fitted
    Fitted(&'a FittedSegmentModel),
    /// The segment failed
    Failed(&'a ModelError),
}

/// Fits every segment of the universe independently.
#[derive(Debug, Clone)]
pub struct SegmentFitter {
    search: GridSearch,
    config: ModelConfig,
}

impl SegmentFitter {
    /// Create a fitter.
    pub fn new(config: ModelConfig) -> Result<Self> {
        let search = GridSearch::new(config.search.clone(), config.lasso)?;
        Ok(Self { search, config })
    }

    /// Fitter configuration.
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit all segments of `table`.
    ///
    /// `table` must be segmented and carry `target` and every name in
    /// `features`. Under [`FitPolicy::Strict`] the first failing segment aborts
    /// the run; under [`FitPolicy::BestEffort`] failures are collected in the
    /// report and the other segments are still fitted.
    pub fn fit_all(
        &self,
        table: &Observations,
        target: &str,
        features: &[String],
    ) -> Result<(SegmentModels, FitReport)> {
        self.fit_all_with_progress(table, target, features, |_, _| {})
    }

    /// [`Self::fit_all`], calling `progress` after each segment.
    pub fn fit_all_with_progress<F>(
        &self,
        table: &Observations,
        target: &str,
        features: &[String],
        mut progress: F,
    ) -> Result<(SegmentModels, FitReport)>
    where
        F: FnMut(SegmentKey, FitEvent<'_>),
    {
        if !table.is_segmented() {
            return Err(abode_data::DataError::NotSegmented.into());
        }
        let stage = "fit";
        if let Some(missing) = std::iter::once(target)
            .chain(features.iter().map(String::as_str))
            .find(|c| !table.has_column(c))
        {
            return Err(FeatureError::MissingColumn {
                stage: stage.to_string(),
                column: missing.to_string(),
            }
            .into());
        }

        let mut fitted = Vec::with_capacity(abode_data::SEGMENT_COUNT);
        let mut report = FitReport::default();

        for key in SegmentKey::all() {
            match self.fit_segment(key, table, target, features) {
                Ok(model) => {
                    tracing::info!(
                        segment = %key,
                        alpha = model.candidate().alpha,
                        harmonics = model.candidate().harmonics,
                        cv_score = model.cv_score(),
                        observations = model.observations(),
                        "fitted segment"
                    );
                    progress(key, FitEvent::Fitted(&model));
                    report.fitted.push(key);
                    fitted.push(model);
                }
                Err(error) => {
                    tracing::warn!(segment = %key, %error, "segment fit failed");
                    progress(key, FitEvent::Failed(&error));
                    if self.config.policy == FitPolicy::Strict {
                        return Err(ModelError::SegmentFit {
                            segment: key,
                            source: Box::new(error),
                        });
                    }
                    report.failures.push(SegmentFailure {
                        segment: key,
                        error,
                    });
                }
            }
        }

        Ok((fitted.into_iter().collect(), report))
    }

    /// Search and refit one segment.
    pub fn fit_segment(
        &self,
        key: SegmentKey,
        table: &Observations,
        target: &str,
        features: &[String],
    ) -> Result<FittedSegmentModel> {
        let rows = table.filter_segment(key)?;
        if rows.is_empty() {
            return Err(ModelError::EmptySegment(key));
        }

        let best = self.search.run(&rows, target, features)?.into_best();
        FittedSegmentModel::fit(key, &rows, target, features, best, self.config.lasso)
    }
}
