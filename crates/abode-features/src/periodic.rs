//! Sine/cosine harmonics of the calendar month.

use crate::error::Result;
use abode_data::Observations;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Largest harmonic count searched by default.
pub const MAX_HARMONICS: usize = 6;

/// Append `sin{h}_month` and `cos{h}_month` for `h = 1..=harmonics`.
///
/// The month is taken from each row's date, so the date itself never becomes
/// a model column. Zero harmonics leaves the table unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodicExpansion {
    harmonics: usize,
}

impl PeriodicExpansion {
    /// Expansion with the given number of harmonics.
    pub const fn new(harmonics: usize) -> Self {
        Self { harmonics }
    }

    /// Number of sine/cosine pairs.
    pub const fn harmonics(&self) -> usize {
        self.harmonics
    }

    /// Names of the produced columns, in output order.
    pub fn output_columns(&self) -> Vec<String> {
        (1..=self.harmonics)
            .flat_map(|h| [format!("sin{h}_month"), format!("cos{h}_month")])
            .collect()
    }

    /// Stage label used in errors.
    pub fn stage(&self) -> String {
        format!("periodic(H={})", self.harmonics)
    }

    /// Append the harmonic columns.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        let months: Vec<f64> = table.dates().iter().map(|d| f64::from(d.month())).collect();

        let mut out = table.clone();
        for h in 1..=self.harmonics {
            let angle = |m: f64| h as f64 * 2.0 * PI * m / 12.0;
            out.add_column(
                format!("sin{h}_month"),
                months.iter().map(|&m| angle(m).sin()).collect(),
            )?;
            out.add_column(
                format!("cos{h}_month"),
                months.iter().map(|&m| angle(m).cos()).collect(),
            )?;
        }
        Ok(out)
    }
}
