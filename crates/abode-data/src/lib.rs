#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/abode-rs/abode/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod error;
pub mod frame;
pub mod loaders;
pub mod resample;
pub mod segment;
pub mod table;

pub use error::{DataError, Result};
pub use loaders::{
    DataPaths, FmrRow, FmrTable, HousingRow, HousingTable, LoaderConfig, SelectedCounty,
    load_fair_market_rents, load_house_price_index, load_housing_by_density, load_mortgage_rates,
};
pub use segment::{DensityCode, MAX_BEDROOMS, MIN_BEDROOMS, SEGMENT_COUNT, SegmentKey};
pub use table::{Column, JoinValidation, Observations};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
