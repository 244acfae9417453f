//! Conversion between polars `DataFrame`s and [`Observations`].

use crate::calendar::{month_end, parse_date};
use crate::error::{DataError, Result};
use crate::table::Observations;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

/// Lazily scan a CSV file with a header row.
pub fn scan_csv(path: &Path) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(DataError::MissingData {
            source_name: path.display().to_string(),
            reason: "file does not exist".to_string(),
        });
    }

    Ok(LazyCsvReader::new(path)
        .with_has_header(true)
        .with_try_parse_dates(true)
        .finish()?)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::ColumnNotFound(name.to_string()))
}

/// Read a date column, accepting either a date dtype or ISO strings.
pub fn date_values(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let dates = column(df, name)?.cast(&DataType::String)?;
    let dates = dates.str()?;

    dates
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            value
                .ok_or_else(|| DataError::Parse(format!("missing {name} in row {i}")))
                .and_then(parse_date)
        })
        .collect()
}

/// Read a numeric column as `f64`, mapping nulls to NaN.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let values = column(df, name)?.cast(&DataType::Float64)?;
    let values = values.f64()?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Read an integer column; nulls are a parse error.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
    let values = column(df, name)?.cast(&DataType::Int64)?;
    let values = values.i64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| DataError::Parse(format!("missing {name} in row {i}"))))
        .collect()
}

impl Observations {
    /// Build an unsegmented table from a frame.
    ///
    /// `date_column` becomes the row date (rolled forward to month end); every
    /// other column is cast to `f64`.
    pub fn from_frame(df: &DataFrame, date_column: &str) -> Result<Self> {
        let dates = date_values(df, date_column)?
            .into_iter()
            .map(month_end)
            .collect::<Result<Vec<_>>>()?;

        let mut table = Self::new(dates);
        for name in df.get_column_names() {
            if name.as_str() == date_column {
                continue;
            }
            table.add_column(name.as_str(), f64_values(df, name.as_str())?)?;
        }
        Ok(table)
    }

    /// Read a CSV file of dated numeric columns.
    pub fn read_csv(path: &Path, date_column: &str) -> Result<Self> {
        let df = scan_csv(path)?.collect()?;
        Self::from_frame(&df, date_column)
    }
}
