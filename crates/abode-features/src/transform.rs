//! Tagged transform variants and their column contracts.

use crate::derivative::Derivatives;
use crate::error::{FeatureError, Result};
use crate::periodic::PeriodicExpansion;
use crate::select::SelectFeatures;
use crate::smooth::SavgolFilter;
use abode_data::Observations;
use serde::{Deserialize, Serialize};

/// One step of a feature pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Keep only the listed columns
    Select(SelectFeatures),
    /// Savitzky–Golay smoothing of one column
    Smooth(SavgolFilter),
    /// Gradients of one column up to an order
    Differentiate(Derivatives),
    /// Calendar-month harmonics
    Periodic(PeriodicExpansion),
}

impl Transform {
    /// Stage label used in errors and logs.
    pub fn stage(&self) -> String {
        match self {
            Self::Select(t) => t.stage(),
            Self::Smooth(t) => t.stage(),
            Self::Differentiate(t) => t.stage(),
            Self::Periodic(t) => t.stage(),
        }
    }

    /// Check the step's own parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Select(t) => t.validate(),
            Self::Smooth(t) => t.validate(),
            Self::Differentiate(t) => t.validate(),
            Self::Periodic(_) => Ok(()),
        }
    }

    /// Columns that must be present before the step runs.
    pub fn required_columns(&self) -> Vec<String> {
        match self {
            Self::Select(t) => t.columns().to_vec(),
            Self::Smooth(t) => vec![t.column().to_string()],
            Self::Differentiate(t) => vec![t.column().to_string()],
            Self::Periodic(_) => Vec::new(),
        }
    }

    /// Columns the step appends.
    pub fn produced_columns(&self) -> Vec<String> {
        match self {
            Self::Select(_) => Vec::new(),
            Self::Smooth(t) => vec![t.output_column()],
            Self::Differentiate(t) => t.output_columns(),
            Self::Periodic(t) => t.output_columns(),
        }
    }

    /// Columns of `schema` the step removes.
    pub fn removed_columns(&self, schema: &[String]) -> Vec<String> {
        match self {
            Self::Select(t) => schema
                .iter()
                .filter(|c| !t.columns().contains(c))
                .cloned()
                .collect(),
            Self::Smooth(t) if !t.config().retain_source => vec![t.column().to_string()],
            _ => Vec::new(),
        }
    }

    /// Schema after the step, given the schema before it.
    ///
    /// Fails if a required column is missing or a produced column already
    /// exists.
    pub fn output_schema(&self, schema: &[String]) -> Result<Vec<String>> {
        if let Some(missing) = self
            .required_columns()
            .into_iter()
            .find(|c| !schema.contains(c))
        {
            return Err(FeatureError::MissingColumn {
                stage: self.stage(),
                column: missing,
            });
        }

        if let Self::Select(t) = self {
            return Ok(t.columns().to_vec());
        }

        let removed = self.removed_columns(schema);
        let mut out: Vec<String> = schema
            .iter()
            .filter(|c| !removed.contains(c))
            .cloned()
            .collect();
        for column in self.produced_columns() {
            if schema.contains(&column) {
                return Err(FeatureError::DuplicateColumn {
                    stage: self.stage(),
                    column,
                });
            }
            out.push(column);
        }
        Ok(out)
    }

    /// Run the step.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        match self {
            Self::Select(t) => t.apply(table),
            Self::Smooth(t) => t.apply(table),
            Self::Differentiate(t) => t.apply(table),
            Self::Periodic(t) => t.apply(table),
        }
    }
}

impl From<SelectFeatures> for Transform {
    fn from(t: SelectFeatures) -> Self {
        Self::Select(t)
    }
}

impl From<SavgolFilter> for Transform {
    fn from(t: SavgolFilter) -> Self {
        Self::Smooth(t)
    }
}

impl From<Derivatives> for Transform {
    fn from(t: Derivatives) -> Self {
        Self::Differentiate(t)
    }
}

impl From<PeriodicExpansion> for Transform {
    fn from(t: PeriodicExpansion) -> Self {
        Self::Periodic(t)
    }
}

/// Fail unless the rows form one series with strictly increasing dates.
pub(crate) fn ensure_series(table: &Observations, stage: &str) -> Result<()> {
    let ordered = table.dates().windows(2).all(|w| w[0] < w[1]);
    if table.is_segmented() || !ordered {
        return Err(FeatureError::NotASeries {
            stage: stage.to_string(),
        });
    }
    Ok(())
}
