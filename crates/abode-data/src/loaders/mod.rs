//! Loaders for the public datasets behind the housing models.
//!
//! Each loader reads one CSV file with polars, applies the filters and
//! aggregations that dataset needs, and returns month-end-aligned tables.

pub mod fmr;
pub mod hpi;
pub mod housing;
pub mod mortgage;

pub use fmr::{FMR, FmrRow, FmrTable, load_fair_market_rents};
pub use hpi::{HPI_SA, load_house_price_index};
pub use housing::{
    HousingRow, HousingTable, LISTING_PRICE, RENTAL_PRICE, SelectedCounty,
    load_housing_by_density,
};
pub use mortgage::{APR, load_mortgage_rates};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Locations of the raw dataset files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// County-level listing/rental price time series
    pub county_time_series: PathBuf,
    /// NCHS urban-rural codes per county
    pub county_codes: PathBuf,
    /// Weekly 30-year fixed mortgage rates
    pub mortgage_rates: PathBuf,
    /// FHFA house price index master file
    pub hpi_master: PathBuf,
    /// Fair market rents per county
    pub fair_market_rents: PathBuf,
}

impl DataPaths {
    /// Default file names inside a data directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            county_time_series: dir.join("County_time_series.csv"),
            county_codes: dir.join("NCHSURCodes2013.csv"),
            mortgage_rates: dir.join("MORTGAGE30US.csv"),
            hpi_master: dir.join("HPI_master.csv"),
            fair_market_rents: dir.join("all_fmr.csv"),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::in_dir(Path::new("data"))
    }
}

/// Filters applied while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Two-letter state abbreviation used to select counties (default: "MA")
    pub state: String,

    /// First calendar year of price data to keep (default: 2011)
    pub min_year: i32,

    /// House price index place name (default: "New England Division")
    pub hpi_place: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            state: "MA".to_string(),
            min_year: 2011,
            hpi_place: "New England Division".to_string(),
        }
    }
}
