//! County listing and rental prices averaged per urban-density code.

use super::{DataPaths, LoaderConfig};
use crate::calendar::month_end;
use crate::error::{DataError, Result};
use crate::frame::{date_values, f64_values, i64_values, scan_csv};
use crate::segment::{DensityCode, MAX_BEDROOMS, MIN_BEDROOMS, SegmentKey};
use crate::table::Observations;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Target column for listing prices (in thousands).
pub const LISTING_PRICE: &str = "ListingPrice";

/// Target column for rental prices.
pub const RENTAL_PRICE: &str = "RentalPrice";

fn listing_column(bedrooms: u8) -> String {
    format!("MedianListingPrice_{bedrooms}Bedroom")
}

fn rental_column(bedrooms: u8) -> String {
    format!("MedianRentalPrice_{bedrooms}Bedroom")
}

fn price_columns() -> Vec<String> {
    (MIN_BEDROOMS..=MAX_BEDROOMS)
        .flat_map(|b| [listing_column(b), rental_column(b)])
        .collect()
}

/// A county retained for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedCounty {
    /// FIPS code of the county
    pub region: i64,
    /// Density class of the county
    pub density: DensityCode,
}

/// Average prices for one month and density class.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingRow {
    /// Month-end date
    pub date: NaiveDate,
    /// Density class
    pub density: DensityCode,
    /// Median listing price per bedroom count (index 0 = 1 bedroom), NaN if missing
    pub listing: [f64; 4],
    /// Median rental price per bedroom count (index 0 = 1 bedroom), NaN if missing
    pub rental: [f64; 4],
}

/// County prices grouped by (month, density class).
#[derive(Debug, Clone, Default)]
pub struct HousingTable {
    rows: Vec<HousingRow>,
    counties: Vec<SelectedCounty>,
}

impl HousingTable {
    /// Create a table from already aggregated rows.
    pub const fn new(rows: Vec<HousingRow>, counties: Vec<SelectedCounty>) -> Self {
        Self { rows, counties }
    }

    /// Aggregated rows.
    pub fn rows(&self) -> &[HousingRow] {
        &self.rows
    }

    /// Counties that passed the data-availability filter.
    pub fn counties(&self) -> &[SelectedCounty] {
        &self.counties
    }

    fn unpivot<F>(&self, column: &str, scale: f64, value: F, keep: impl Fn(NaiveDate, SegmentKey) -> bool) -> Result<Observations>
    where
        F: Fn(&HousingRow) -> [f64; 4],
    {
        let mut dates = Vec::new();
        let mut segments = Vec::new();
        let mut values = Vec::new();

        for bedrooms in MIN_BEDROOMS..=MAX_BEDROOMS {
            for row in &self.rows {
                let price = value(row)[usize::from(bedrooms - 1)];
                let key = SegmentKey::with_density(bedrooms, row.density)?;
                if price.is_nan() || !keep(row.date, key) {
                    continue;
                }
                dates.push(row.date);
                segments.push(key);
                values.push(price / scale);
            }
        }

        let table = Observations::new(dates)
            .with_segments(segments)?
            .with_column(column, values)?
            .sorted()?;
        table.validate_unique_keys()?;
        Ok(table)
    }

    /// Listing prices in thousands, one row per (month, segment) with data.
    pub fn listing_targets(&self) -> Result<Observations> {
        self.unpivot(LISTING_PRICE, 1000.0, |r| r.listing, |_, _| true)
    }

    /// Rental prices, one row per (month, segment) with data.
    ///
    /// Suburban one-bedroom rents up to and including 2012 are excluded.
    pub fn rental_targets(&self) -> Result<Observations> {
        self.unpivot(RENTAL_PRICE, 1.0, |r| r.rental, |date, key| {
            date.year() > 2012 || key.bedrooms() != 1 || key.density() != DensityCode::Suburban
        })
    }
}

/// Load county prices and average them per (month, density code).
///
/// Only counties in `config.state` with at least one 1-bedroom listing and
/// one 1-bedroom rental observation since `config.min_year` are kept.
pub fn load_housing_by_density(paths: &DataPaths, config: &LoaderConfig) -> Result<HousingTable> {
    let prices = price_columns();

    let mut county_exprs = vec![
        col("Date").cast(DataType::Date),
        col("RegionName").cast(DataType::Int64),
    ];
    county_exprs.extend(prices.iter().map(|c| col(c.as_str()).cast(DataType::Float64)));

    let county = scan_csv(&paths.county_time_series)?
        .select(county_exprs)
        .filter(col("Date").dt().year().gt_eq(lit(config.min_year)));

    let codes = scan_csv(&paths.county_codes)?
        .select([
            col("FIPS code").cast(DataType::Int64).alias("RegionName"),
            col("2013 code").cast(DataType::Int64).alias("urban_code"),
            col("State Abr.").cast(DataType::String).alias("state"),
        ])
        .filter(col("state").eq(lit(config.state.as_str())));

    let listing_1 = listing_column(1);
    let rental_1 = rental_column(1);

    let selected = county
        .clone()
        .inner_join(codes.clone(), col("RegionName"), col("RegionName"))
        .group_by([col("RegionName")])
        .agg([
            col(listing_1.as_str()).count().alias("n_listing"),
            col(rental_1.as_str()).count().alias("n_rental"),
        ])
        .filter(col("n_listing").gt(lit(0)).and(col("n_rental").gt(lit(0))))
        .inner_join(codes, col("RegionName"), col("RegionName"))
        .select([col("RegionName"), col("urban_code")])
        .sort(["RegionName"], Default::default())
        .collect()?;

    let regions = i64_values(&selected, "RegionName")?;
    let codes = i64_values(&selected, "urban_code")?;
    let counties = regions
        .into_iter()
        .zip(codes)
        .map(|(region, code)| {
            let density = u8::try_from(code)
                .ok()
                .and_then(DensityCode::from_code)
                .ok_or_else(|| DataError::Parse(format!("county {region} has density code {code}")))?;
            Ok(SelectedCounty { region, density })
        })
        .collect::<Result<Vec<_>>>()?;

    if counties.is_empty() {
        return Err(DataError::MissingData {
            source_name: paths.county_time_series.display().to_string(),
            reason: format!("no counties in {} with listing and rental data", config.state),
        });
    }
    tracing::debug!(counties = counties.len(), state = %config.state, "selected counties");

    let averaged = county
        .inner_join(selected.lazy(), col("RegionName"), col("RegionName"))
        .group_by([col("Date"), col("urban_code")])
        .agg(prices.iter().map(|c| col(c.as_str()).mean()).collect::<Vec<_>>())
        .sort(["Date", "urban_code"], Default::default())
        .collect()?;

    let dates = date_values(&averaged, "Date")?;
    let density_codes = i64_values(&averaged, "urban_code")?;
    let listing = (MIN_BEDROOMS..=MAX_BEDROOMS)
        .map(|b| f64_values(&averaged, &listing_column(b)))
        .collect::<Result<Vec<_>>>()?;
    let rental = (MIN_BEDROOMS..=MAX_BEDROOMS)
        .map(|b| f64_values(&averaged, &rental_column(b)))
        .collect::<Result<Vec<_>>>()?;

    let rows = dates
        .into_iter()
        .zip(density_codes)
        .enumerate()
        .map(|(i, (date, code))| {
            let density = u8::try_from(code)
                .ok()
                .and_then(DensityCode::from_code)
                .ok_or_else(|| DataError::Parse(format!("invalid density code {code}")))?;
            Ok(HousingRow {
                date: month_end(date)?,
                density,
                listing: [listing[0][i], listing[1][i], listing[2][i], listing[3][i]],
                rental: [rental[0][i], rental[1][i], rental[2][i], rental[3][i]],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(HousingTable::new(rows, counties))
}
