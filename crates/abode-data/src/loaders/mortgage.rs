//! Weekly 30-year fixed mortgage rates resampled to monthly averages.

use crate::error::Result;
use crate::frame::{f64_values, scan_csv};
use crate::resample::{month_ends, monthly_mean};
use crate::table::Observations;
use polars::prelude::*;
use std::path::Path;

/// Output column holding the annual percentage rate as a fraction.
pub const APR: &str = "apr";

/// Load `DATE`/`MORTGAGE30US` rows, convert percent to fraction and average
/// per calendar month.
///
/// Returns an unsegmented table with one row per month-end and column `apr`.
pub fn load_mortgage_rates(path: &Path) -> Result<Observations> {
    let rates = scan_csv(path)?
        .select([
            col("DATE"),
            (col("MORTGAGE30US").cast(DataType::Float64) / lit(100.0)).alias(APR),
        ])
        .filter(col(APR).is_not_null());

    let monthly = monthly_mean(rates, "DATE", &[], &[APR]).collect()?;
    tracing::debug!(months = monthly.height(), "resampled mortgage rates");

    Observations::new(month_ends(&monthly)?).with_column(APR, f64_values(&monthly, APR)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_load_mortgage_rates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DATE,MORTGAGE30US").unwrap();
        writeln!(file, "2019-01-03,4.51").unwrap();
        writeln!(file, "2019-01-10,4.45").unwrap();
        writeln!(file, "2019-01-17,.").unwrap();
        writeln!(file, "2019-02-07,4.41").unwrap();
        file.flush().unwrap();

        let rates = load_mortgage_rates(file.path()).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.dates()[0].to_string(), "2019-01-31");
        assert_relative_eq!(rates.column(APR).unwrap()[0], 0.0448, epsilon = 1e-12);
        assert_relative_eq!(rates.column(APR).unwrap()[1], 0.0441, epsilon = 1e-12);
    }
}
