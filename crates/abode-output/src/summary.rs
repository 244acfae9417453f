//! Per-segment summary of a fit run.

use crate::export::SegmentFitRecord;
use abode_data::SegmentKey;
use abode_model::{FitReport, SegmentModels};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A segment that could not be fitted, with the error rendered as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// Bedroom count.
    pub bedrooms: u8,

    /// Density label.
    pub density: String,

    /// Error message.
    pub error: String,
}

impl FailureRecord {
    /// Create a failure record for a segment.
    pub fn new(segment: SegmentKey, error: impl fmt::Display) -> Self {
        Self {
            bedrooms: segment.bedrooms(),
            density: segment.density().label().to_string(),
            error: error.to_string(),
        }
    }
}

/// Overview of every segment after a fit run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FitSummary {
    /// Name of the fitted market.
    pub title: String,

    /// Target column.
    pub target: String,

    /// Fitted segments, in segment order.
    pub fits: Vec<SegmentFitRecord>,

    /// Failed segments, in fit order.
    pub failures: Vec<FailureRecord>,
}

impl FitSummary {
    /// Create a summary from records.
    pub const fn new(
        title: String,
        target: String,
        fits: Vec<SegmentFitRecord>,
        failures: Vec<FailureRecord>,
    ) -> Self {
        Self {
            title,
            target,
            fits,
            failures,
        }
    }

    /// Summarise fitted models together with the report of the same run.
    pub fn from_fit(
        title: impl Into<String>,
        target: impl Into<String>,
        models: &SegmentModels,
        report: &FitReport,
    ) -> Self {
        let failures = report
            .failures
            .iter()
            .map(|f| FailureRecord::new(f.segment, &f.error))
            .collect();
        Self::new(
            title.into(),
            target.into(),
            SegmentFitRecord::from_models(models),
            failures,
        )
    }

    /// Whether every segment of the run was fitted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Mean in-sample MAE over fitted segments, `None` if nothing was fitted.
    pub fn mean_training_mae(&self) -> Option<f64> {
        if self.fits.is_empty() {
            return None;
        }
        Some(self.fits.iter().map(|r| r.training_mae).sum::<f64>() / self.fits.len() as f64)
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nFit Summary: {}\n", self.title));
        output.push_str(&format!(
            "Target: {} ({} fitted, {} failed)\n",
            self.target,
            self.fits.len(),
            self.failures.len()
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        if !self.fits.is_empty() {
            output.push_str(&format!(
                "{:<6} {:<10} {:>10} {:>5} {:>14} {:>6} {:>8} {:>12}\n",
                "Beds", "Density", "Alpha", "H", "CV Score", "Rows", "Nonzero", "Train MAE"
            ));
            output.push_str(&"-".repeat(80));
            output.push('\n');

            for fit in &self.fits {
                output.push_str(&format!(
                    "{:<6} {:<10} {:>10.3} {:>5} {:>14.4} {:>6} {:>8} {:>12.4}{}\n",
                    fit.bedrooms,
                    fit.density,
                    fit.alpha,
                    fit.harmonics,
                    fit.cv_score,
                    fit.observations,
                    fit.nonzero,
                    fit.training_mae,
                    if fit.converged { "" } else { " *" }
                ));
            }
        }

        if !self.failures.is_empty() {
            output.push_str("\nFailed Segments:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for failure in &self.failures {
                output.push_str(&format!(
                    "  {}br/{}: {}\n",
                    failure.bedrooms, failure.density, failure.error
                ));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Fit Summary: {}\n\n", self.title));
        output.push_str(&format!("**Target:** {}\n\n", self.target));
        output.push_str(&format!(
            "- **Fitted segments:** {}\n- **Failed segments:** {}\n",
            self.fits.len(),
            self.failures.len()
        ));
        if let Some(mae) = self.mean_training_mae() {
            output.push_str(&format!("- **Mean training MAE:** {mae:.4}\n"));
        }
        output.push('\n');

        if !self.fits.is_empty() {
            output.push_str("## Segments\n\n");
            output.push_str(
                "| Bedrooms | Density | Alpha | Harmonics | CV Score | Rows | Nonzero | Train MAE |\n",
            );
            output.push_str(
                "|----------|---------|-------|-----------|----------|------|---------|-----------|\n",
            );
            for fit in &self.fits {
                output.push_str(&format!(
                    "| {} | {} | {:.3} | {} | {:.4} | {} | {} | {:.4} |\n",
                    fit.bedrooms,
                    fit.density,
                    fit.alpha,
                    fit.harmonics,
                    fit.cv_score,
                    fit.observations,
                    fit.nonzero,
                    fit.training_mae
                ));
            }
            output.push('\n');
        }

        if !self.failures.is_empty() {
            output.push_str("## Failures\n\n");
            for failure in &self.failures {
                output.push_str(&format!(
                    "- `{}br/{}`: {}\n",
                    failure.bedrooms, failure.density, failure.error
                ));
            }
        }

        output
    }
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Summary: {} ({})", self.title, self.target)?;
        writeln!(f, "  Fitted: {}", self.fits.len())?;
        writeln!(f, "  Failed: {}", self.failures.len())?;
        if let Some(mae) = self.mean_training_mae() {
            writeln!(f, "  Mean training MAE: {mae:.4}")?;
        }
        Ok(())
    }
}
