//! FHFA house price index.

use crate::calendar::month_end_of;
use crate::error::{DataError, Result};
use crate::frame::{f64_values, i64_values, scan_csv};
use crate::table::Observations;
use polars::prelude::*;
use std::path::Path;

/// Output column holding the seasonally adjusted index.
pub const HPI_SA: &str = "hpi_sa";

/// Load the traditional purchase-only monthly index for one place.
///
/// Each `(yr, period)` pair becomes the last day of that month. Returns an
/// unsegmented table with column `hpi_sa`.
pub fn load_house_price_index(path: &Path, place_name: &str) -> Result<Observations> {
    let df = scan_csv(path)?
        .filter(
            col("hpi_type")
                .eq(lit("traditional"))
                .and(col("hpi_flavor").eq(lit("purchase-only")))
                .and(col("frequency").eq(lit("monthly")))
                .and(col("place_name").eq(lit(place_name))),
        )
        .select([col("yr"), col("period"), col("index_sa")])
        .sort(["yr", "period"], Default::default())
        .collect()?;

    if df.height() == 0 {
        return Err(DataError::MissingData {
            source_name: path.display().to_string(),
            reason: format!("no monthly purchase-only index for '{place_name}'"),
        });
    }

    let years = i64_values(&df, "yr")?;
    let periods = i64_values(&df, "period")?;
    let dates = years
        .into_iter()
        .zip(periods)
        .map(|(year, period)| {
            let year = i32::try_from(year)
                .map_err(|_| DataError::Parse(format!("year {year} out of range")))?;
            let month = u32::try_from(period)
                .map_err(|_| DataError::Parse(format!("period {period} out of range")))?;
            month_end_of(year, month)
        })
        .collect::<Result<Vec<_>>>()?;

    let table = Observations::new(dates).with_column(HPI_SA, f64_values(&df, "index_sa")?)?;
    table.validate_unique_keys()?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str =
        "hpi_type,hpi_flavor,frequency,level,place_name,place_id,yr,period,index_nsa,index_sa";

    #[test]
    fn test_load_house_price_index_filters_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "traditional,purchase-only,monthly,Census Division,New England Division,DV_NE,2019,2,250.1,251.2").unwrap();
        writeln!(file, "traditional,purchase-only,monthly,Census Division,New England Division,DV_NE,2019,1,249.0,250.0").unwrap();
        writeln!(file, "traditional,all-transactions,quarterly,Census Division,New England Division,DV_NE,2019,1,240.0,240.0").unwrap();
        writeln!(file, "traditional,purchase-only,monthly,Census Division,Pacific Division,DV_PAC,2019,1,300.0,301.0").unwrap();
        file.flush().unwrap();

        let hpi = load_house_price_index(file.path(), "New England Division").unwrap();
        assert_eq!(hpi.len(), 2);
        assert_eq!(hpi.dates()[0].to_string(), "2019-01-31");
        assert_eq!(hpi.dates()[1].to_string(), "2019-02-28");
        assert_eq!(hpi.column(HPI_SA).unwrap(), &[250.0, 251.2]);
    }

    #[test]
    fn test_unknown_place_is_missing_data() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "traditional,purchase-only,monthly,Census Division,Pacific Division,DV_PAC,2019,1,300.0,301.0").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_house_price_index(file.path(), "Nowhere"),
            Err(DataError::MissingData { .. })
        ));
    }
}
