//! Broadcast prediction over every segment.

use crate::error::Result;
use crate::fitter::SegmentModels;
use abode_data::{DensityCode, Observations, SegmentKey};
use abode_features::FeaturePipeline;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast for one month and segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Month-end date
    pub date: NaiveDate,
    /// Segment key
    pub segment: SegmentKey,
    /// Predicted target value
    pub value: f64,
}

impl Prediction {
    /// Bedroom count of the segment.
    pub const fn bedrooms(&self) -> u8 {
        self.segment.bedrooms()
    }

    /// Density class of the segment.
    pub const fn density(&self) -> DensityCode {
        self.segment.density()
    }

    /// Human-readable density label.
    pub const fn density_label(&self) -> &'static str {
        self.segment.density().label()
    }
}

/// Applies shared preprocessing and evaluates every segment's model.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    preprocessing: &'a FeaturePipeline,
    models: &'a SegmentModels,
}

impl<'a> Predictor<'a> {
    /// Bind a preprocessing pipeline to fitted models.
    pub const fn new(preprocessing: &'a FeaturePipeline, models: &'a SegmentModels) -> Self {
        Self {
            preprocessing,
            models,
        }
    }

    /// Predict every segment for every row of `raw`.
    ///
    /// Preprocessing runs once. Output holds `12 · rows` predictions, bedrooms
    /// outer and density inner, each segment block in row order. Any segment
    /// without a model fails the whole call.
    pub fn predict(&self, raw: &Observations) -> Result<Vec<Prediction>> {
        let features = self.preprocessing.apply(raw)?;
        self.predict_preprocessed(&features)
    }

    /// Predict from rows that already went through preprocessing.
    pub fn predict_preprocessed(&self, features: &Observations) -> Result<Vec<Prediction>> {
        let keys = SegmentKey::all();
        let mut out = Vec::with_capacity(keys.len() * features.len());

        for key in keys {
            let model = self.models.get(key)?;
            let values = model.predict(features)?;
            out.extend(
                features
                    .dates()
                    .iter()
                    .zip(values)
                    .map(|(&date, value)| Prediction {
                        date,
                        segment: key,
                        value,
                    }),
            );
        }

        tracing::debug!(rows = features.len(), predictions = out.len(), "predicted all segments");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn test_prediction_label() {
        let p = Prediction {
            date: NaiveDate::from_ymd_opt(2019, 1, 31).unwrap(),
            segment: SegmentKey::new(3, 2).unwrap(),
            value: 1.0,
        };
        assert_eq!(p.bedrooms(), 3);
        assert_eq!(p.density_label(), "suburban");
    }

    #[test]
    fn test_no_models_is_missing_model() {
        let pipeline = FeaturePipeline::new(["apr"], Vec::new()).unwrap();
        let models = SegmentModels::default();
        let raw = Observations::new(vec![NaiveDate::from_ymd_opt(2019, 1, 31).unwrap()])
            .with_column("apr", vec![0.04])
            .unwrap();
        assert!(matches!(
            Predictor::new(&pipeline, &models).predict(&raw),
            Err(ModelError::SegmentNotFitted { bedrooms: 1, density_code: 1 })
        ));
    }
}
