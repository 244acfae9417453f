//! Projection onto a fixed list of feature columns.

use crate::error::{FeatureError, Result};
use abode_data::Observations;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Keep only the configured columns, in configured order.
///
/// Dates and segment keys are row identity and always survive. Any other
/// column, such as a target price column, is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectFeatures {
    columns: Vec<String>,
}

impl SelectFeatures {
    /// Create a selection. Names must be non-empty and distinct.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        let select = Self {
            columns: columns.into_iter().map(Into::into).collect(),
        };
        select.validate()?;
        Ok(select)
    }

    /// Selected column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Stage label used in errors.
    pub fn stage(&self) -> String {
        "select".to_string()
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(FeatureError::InvalidParameter {
                stage: self.stage(),
                reason: "no columns selected".to_string(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(FeatureError::InvalidParameter {
                stage: self.stage(),
                reason: format!("column '{dup}' selected twice"),
            });
        }
        Ok(())
    }

    /// Project the table.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        if let Some(missing) = self.columns.iter().find(|c| !table.has_column(c)) {
            return Err(FeatureError::MissingColumn {
                stage: self.stage(),
                column: missing.clone(),
            });
        }
        Ok(table.select(&self.columns)?)
    }
}
