//! Export of predictions and segment fits.
//!
//! Records are flat so that the same rows serialise to CSV and JSON.

use abode_model::{FittedSegmentModel, Prediction, SegmentModels};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One predicted value for a month and segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    /// Month-end date.
    pub date: NaiveDate,

    /// Bedroom count.
    pub bedrooms: u8,

    /// Urban-density code (1 = urban, 2 = suburban, 3 = rural).
    pub density_code: u8,

    /// Density label.
    pub density: String,

    /// Predicted target value.
    pub y_hat: f64,
}

impl From<&Prediction> for PredictionRecord {
    fn from(prediction: &Prediction) -> Self {
        Self {
            date: prediction.date,
            bedrooms: prediction.bedrooms(),
            density_code: prediction.segment.density_code(),
            density: prediction.density_label().to_string(),
            y_hat: prediction.value,
        }
    }
}

impl PredictionRecord {
    /// Convert a batch of predictions, keeping their order.
    pub fn from_predictions(predictions: &[Prediction]) -> Vec<Self> {
        predictions.iter().map(Self::from).collect()
    }
}

/// Winning hyper-parameters and fit quality of one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentFitRecord {
    /// Bedroom count.
    pub bedrooms: u8,

    /// Urban-density code.
    pub density_code: u8,

    /// Density label.
    pub density: String,

    /// Selected Lasso regularisation strength.
    pub alpha: f64,

    /// Selected number of calendar harmonics.
    pub harmonics: usize,

    /// Mean cross-validation score of the selected candidate.
    pub cv_score: f64,

    /// Training rows in the segment.
    pub observations: usize,

    /// Coefficients that survived the L1 penalty.
    pub nonzero: usize,

    /// In-sample mean absolute error.
    pub training_mae: f64,

    /// Whether coordinate descent converged on the final refit.
    pub converged: bool,
}

impl From<&FittedSegmentModel> for SegmentFitRecord {
    fn from(model: &FittedSegmentModel) -> Self {
        let segment = model.segment();
        let candidate = model.candidate();
        Self {
            bedrooms: segment.bedrooms(),
            density_code: segment.density_code(),
            density: segment.density().label().to_string(),
            alpha: candidate.alpha,
            harmonics: candidate.harmonics,
            cv_score: model.cv_score(),
            observations: model.observations(),
            nonzero: model.n_nonzero(),
            training_mae: model.training_mae(),
            converged: model.converged(),
        }
    }
}

impl SegmentFitRecord {
    /// One record per fitted model, in segment order.
    pub fn from_models(models: &SegmentModels) -> Vec<Self> {
        models.iter().map(|(_, model)| Self::from(model)).collect()
    }
}

fn csv_string<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn json_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ExportError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn export_records<T: Serialize>(records: &[T], format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => csv_string(records),
        ExportFormat::Json => json_string(records, false),
        ExportFormat::PrettyJson => json_string(records, true),
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl Exporter for PredictionRecord {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(std::slice::from_ref(self)),
            ExportFormat::Json => json_string(self, false),
            ExportFormat::PrettyJson => json_string(self, true),
        }
    }
}

impl Exporter for Vec<PredictionRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

impl Exporter for SegmentFitRecord {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(std::slice::from_ref(self)),
            ExportFormat::Json => json_string(self, false),
            ExportFormat::PrettyJson => json_string(self, true),
        }
    }
}

impl Exporter for Vec<SegmentFitRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        export_records(self, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abode_data::SegmentKey;
    use rstest::rstest;

    fn prediction(bedrooms: u8, density: u8, value: f64) -> Prediction {
        Prediction {
            date: NaiveDate::from_ymd_opt(2019, 3, 31).unwrap(),
            segment: SegmentKey::new(bedrooms, density).unwrap(),
            value,
        }
    }

    fn fit_record() -> SegmentFitRecord {
        SegmentFitRecord {
            bedrooms: 2,
            density_code: 3,
            density: "rural".to_string(),
            alpha: 10.0,
            harmonics: 2,
            cv_score: -12.5,
            observations: 84,
            nonzero: 3,
            training_mae: 2.75,
            converged: true,
        }
    }

    #[test]
    fn test_prediction_record_from_prediction() {
        let record = PredictionRecord::from(&prediction(3, 2, 412.5));
        assert_eq!(record.bedrooms, 3);
        assert_eq!(record.density_code, 2);
        assert_eq!(record.density, "suburban");
        assert_eq!(record.y_hat, 412.5);
    }

    #[test]
    fn test_predictions_csv_has_header_and_rows() {
        let records =
            PredictionRecord::from_predictions(&[prediction(1, 1, 250.0), prediction(1, 2, 210.0)]);
        let csv = records.export_to_string(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,bedrooms,density_code,density,y_hat");
        assert_eq!(lines[1], "2019-03-31,1,1,urban,250.0");
        assert!(lines[2].contains("suburban"));
    }

    #[test]
    fn test_prediction_json() {
        let json = PredictionRecord::from(&prediction(4, 3, 1800.0))
            .export_to_string(ExportFormat::Json)
            .unwrap();
        assert!(json.contains("\"date\":\"2019-03-31\""));
        assert!(json.contains("\"density\":\"rural\""));
        assert!(json.contains("\"y_hat\":1800.0"));
    }

    #[test]
    fn test_fit_record_pretty_json() {
        let json = fit_record().export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(json.contains("\"alpha\": 10.0"));
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_fit_records_round_trip_through_json() {
        let records = vec![fit_record()];
        let json = records.export_to_string(ExportFormat::Json).unwrap();
        let parsed: Vec<SegmentFitRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.csv");
        vec![fit_record()]
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("bedrooms,density_code,density,alpha"));
        assert!(content.contains("rural"));
    }

    #[rstest]
    #[case(ExportFormat::Csv, "csv")]
    #[case(ExportFormat::Json, "json")]
    #[case(ExportFormat::PrettyJson, "json")]
    fn test_export_format_extension(#[case] format: ExportFormat, #[case] expected: &str) {
        assert_eq!(format.extension(), expected);
    }
}
