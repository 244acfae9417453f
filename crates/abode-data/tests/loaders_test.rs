//! End-to-end tests for the CSV dataset loaders.

use abode_data::{
    DataPaths, DensityCode, LoaderConfig, SegmentKey, load_fair_market_rents,
    load_housing_by_density,
};
use approx::assert_relative_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COUNTY_HEADER: &str = "Date,RegionName,MedianListingPrice_1Bedroom,MedianRentalPrice_1Bedroom,\
MedianListingPrice_2Bedroom,MedianRentalPrice_2Bedroom,MedianListingPrice_3Bedroom,\
MedianRentalPrice_3Bedroom,MedianListingPrice_4Bedroom,MedianRentalPrice_4Bedroom";

fn county_row(date: &str, region: i64, listing: &str, rental: &str) -> String {
    format!("{date},{region},{listing},{rental},300000,1500,400000,2000,500000,2500")
}

fn write_fixture(dir: &Path) -> DataPaths {
    let paths = DataPaths::in_dir(dir);

    let county = [
        COUNTY_HEADER.to_string(),
        county_row("2010-12-31", 25001, "100000", "900"),
        county_row("2011-01-31", 25001, "200000", "1000"),
        county_row("2011-01-31", 25017, "220000", "1200"),
        county_row("2011-01-31", 25003, "150000", "800"),
        county_row("2011-01-31", 25009, "", ""),
        county_row("2011-01-31", 33001, "180000", "950"),
        county_row("2011-02-28", 25001, "210000", "1010"),
        county_row("2011-02-28", 25017, "", "1210"),
        county_row("2011-02-28", 25003, "", ""),
    ]
    .join("\n");
    fs::write(&paths.county_time_series, county).unwrap();

    let codes = [
        "State Abr.,County name,FIPS code,CBSA title,2013 code",
        "MA,Barnstable County,25001,Barnstable Town,1",
        "MA,Middlesex County,25017,Boston-Cambridge-Newton,1",
        "MA,Berkshire County,25003,Pittsfield,3",
        "MA,Essex County,25009,Boston-Cambridge-Newton,2",
        "NH,Belknap County,33001,Laconia,3",
    ]
    .join("\n");
    fs::write(&paths.county_codes, codes).unwrap();

    let fmr = [
        "Date,fips_simple,fmr_0,fmr_1,fmr_2,fmr_3,fmr_4",
        "2011-10-01,25001,800,1000,1200,1500,1800",
        "2011-10-01,25017,900,1200,1400,1700,2000",
        "2012-10-01,25001,820,1060,1260,1560,1860",
        "2012-10-01,25017,920,1260,1460,1760,2060",
        "2011-10-01,25003,600,700,850,1000,1200",
        "2011-10-01,33001,500,600,700,800,900",
    ]
    .join("\n");
    fs::write(&paths.fair_market_rents, fmr).unwrap();

    paths
}

#[test]
fn test_housing_selection_and_aggregation() {
    let dir = TempDir::new().unwrap();
    let paths = write_fixture(dir.path());

    let housing = load_housing_by_density(&paths, &LoaderConfig::default()).unwrap();

    let regions: Vec<i64> = housing.counties().iter().map(|c| c.region).collect();
    assert_eq!(regions, vec![25001, 25003, 25017]);

    // January: two urban counties and one rural county
    assert_eq!(housing.rows().len(), 4);
    let urban_jan = &housing.rows()[0];
    assert_eq!(urban_jan.date.to_string(), "2011-01-31");
    assert_eq!(urban_jan.density, DensityCode::Urban);
    assert_relative_eq!(urban_jan.listing[0], 210000.0);
    assert_relative_eq!(urban_jan.rental[0], 1100.0);

    let listing = housing.listing_targets().unwrap();
    let urban_1br = listing.filter_segment(SegmentKey::new(1, 1).unwrap()).unwrap();
    assert_eq!(urban_1br.len(), 2);
    assert_relative_eq!(urban_1br.column("ListingPrice").unwrap()[0], 210.0);
    assert_relative_eq!(urban_1br.column("ListingPrice").unwrap()[1], 210.0);

    let rural_1br = listing.filter_segment(SegmentKey::new(1, 3).unwrap()).unwrap();
    assert_eq!(rural_1br.len(), 1);
}

#[test]
fn test_fair_market_rents_shift_and_interpolate() {
    let dir = TempDir::new().unwrap();
    let paths = write_fixture(dir.path());

    let housing = load_housing_by_density(&paths, &LoaderConfig::default()).unwrap();
    let fmr = load_fair_market_rents(&paths.fair_market_rents, housing.counties()).unwrap();

    let urban: Vec<_> = fmr
        .rows()
        .iter()
        .filter(|r| r.density == DensityCode::Urban)
        .collect();
    assert_eq!(urban.len(), 13);
    assert_eq!(urban[0].date.to_string(), "2011-09-30");
    assert_eq!(urban[12].date.to_string(), "2012-09-30");
    assert_relative_eq!(urban[0].rents[0], 1100.0);
    assert_relative_eq!(urban[6].rents[0], 1130.0);
    assert_relative_eq!(urban[12].rents[0], 1160.0);

    let rural: Vec<_> = fmr
        .rows()
        .iter()
        .filter(|r| r.density == DensityCode::Rural)
        .collect();
    assert_eq!(rural.len(), 1);
    assert_relative_eq!(rural[0].rents[3], 1200.0);

    let index = fmr.index().unwrap();
    assert_eq!(index.len(), 13);
    let first = index.column("fmr").unwrap()[0];
    assert_relative_eq!(first, (1100.0 + 1300.0 + 1600.0 + 1900.0 + 700.0 + 850.0 + 1000.0 + 1200.0) / 8.0);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let err = load_housing_by_density(&paths, &LoaderConfig::default()).unwrap_err();
    assert!(err.to_string().contains("County_time_series.csv"));
}
