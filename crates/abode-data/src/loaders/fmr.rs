//! HUD fair market rents aggregated per density class.

use super::housing::SelectedCounty;
use crate::calendar::month_index;
use crate::error::{DataError, Result};
use crate::frame::{f64_values, i64_values, scan_csv};
use crate::resample::{MONTH, interpolate_monthly, month_ends, monthly_mean};
use crate::segment::{DensityCode, MAX_BEDROOMS, MIN_BEDROOMS, SegmentKey};
use crate::table::Observations;
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;

/// Output column holding fair market rent.
pub const FMR: &str = "fmr";

fn rent_column(bedrooms: u8) -> String {
    format!("fmr_{bedrooms}")
}

/// Interpolated rents for one month and density class.
#[derive(Debug, Clone, PartialEq)]
pub struct FmrRow {
    /// Month-end date
    pub date: NaiveDate,
    /// Density class
    pub density: DensityCode,
    /// Fair market rent per bedroom count (index 0 = 1 bedroom), NaN if missing
    pub rents: [f64; 4],
}

/// Monthly fair market rents per density class.
#[derive(Debug, Clone, Default)]
pub struct FmrTable {
    rows: Vec<FmrRow>,
}

impl FmrTable {
    /// Create a table from monthly rows.
    pub const fn new(rows: Vec<FmrRow>) -> Self {
        Self { rows }
    }

    /// Monthly rows ordered by density, then date.
    pub fn rows(&self) -> &[FmrRow] {
        &self.rows
    }

    /// One row per (month, segment) with column `fmr`.
    pub fn by_segment(&self) -> Result<Observations> {
        let mut dates = Vec::new();
        let mut segments = Vec::new();
        let mut values = Vec::new();

        for bedrooms in MIN_BEDROOMS..=MAX_BEDROOMS {
            for row in &self.rows {
                let rent = row.rents[usize::from(bedrooms - 1)];
                if rent.is_nan() {
                    continue;
                }
                dates.push(row.date);
                segments.push(SegmentKey::with_density(bedrooms, row.density)?);
                values.push(rent);
            }
        }

        Observations::new(dates)
            .with_segments(segments)?
            .with_column(FMR, values)?
            .sorted()
    }

    /// Mean rent across all segments per month, with column `fmr`.
    pub fn index(&self) -> Result<Observations> {
        let (months, rents): (Vec<i64>, Vec<f64>) = self
            .rows
            .iter()
            .flat_map(|row| {
                let month = month_index(row.date);
                row.rents
                    .iter()
                    .filter(|r| !r.is_nan())
                    .map(move |&rent| (month, rent))
            })
            .unzip();

        let long = DataFrame::new(vec![
            Series::new(MONTH.into(), months).into(),
            Series::new(FMR.into(), rents).into(),
        ])?;
        let index = long
            .lazy()
            .group_by([col(MONTH)])
            .agg([col(FMR).mean()])
            .sort([MONTH], Default::default())
            .collect()?;

        Observations::new(month_ends(&index)?).with_column(FMR, f64_values(&index, FMR)?)
    }
}

/// Load county fair market rents for the selected counties.
///
/// Rents are averaged per (date, density code), each date is moved to the end
/// of the preceding month, and the sparse series are linearly interpolated to
/// every month per density class.
pub fn load_fair_market_rents(path: &Path, counties: &[SelectedCounty]) -> Result<FmrTable> {
    let selected = DataFrame::new(vec![
        Series::new(
            "fips_simple".into(),
            counties.iter().map(|c| c.region).collect::<Vec<_>>(),
        )
        .into(),
        Series::new(
            "urban_code".into(),
            counties
                .iter()
                .map(|c| i64::from(c.density.code()))
                .collect::<Vec<_>>(),
        )
        .into(),
    ])?;

    let columns: Vec<String> = (MIN_BEDROOMS..=MAX_BEDROOMS).map(rent_column).collect();
    let names: Vec<&str> = columns.iter().map(String::as_str).collect();

    let mut exprs = vec![col("Date"), col("fips_simple").cast(DataType::Int64)];
    exprs.extend(names.iter().map(|c| col(*c).cast(DataType::Float64)));

    let by_date = scan_csv(path)?
        .select(exprs)
        .inner_join(selected.lazy(), col("fips_simple"), col("fips_simple"))
        .group_by([col("Date"), col("urban_code")])
        .agg(names.iter().map(|c| col(*c).mean()).collect::<Vec<_>>());

    // rents published in a month apply to the month before
    let monthly = monthly_mean(by_date, "Date", &["urban_code"], &names)
        .with_column(col(MONTH) - lit(1i64))
        .collect()?;

    if monthly.height() == 0 {
        return Err(DataError::MissingData {
            source_name: path.display().to_string(),
            reason: "no fair market rents for the selected counties".to_string(),
        });
    }

    let dense = interpolate_monthly(monthly, "urban_code", &names)?;
    let dates = month_ends(&dense)?;
    let codes = i64_values(&dense, "urban_code")?;
    let rents = names
        .iter()
        .map(|c| f64_values(&dense, c))
        .collect::<Result<Vec<_>>>()?;

    let rows = codes
        .iter()
        .enumerate()
        .map(|(i, &code)| {
            let density = u8::try_from(code)
                .ok()
                .and_then(DensityCode::from_code)
                .ok_or_else(|| DataError::Parse(format!("invalid density code {code}")))?;
            let mut row = [f64::NAN; 4];
            for (slot, series) in rents.iter().enumerate() {
                row[slot] = series[i];
            }
            Ok(FmrRow {
                date: dates[i],
                density,
                rents: row,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(months = rows.len(), "interpolated fair market rents");
    Ok(FmrTable::new(rows))
}
