//! Numerical derivatives of a column.

use crate::error::{FeatureError, Result};
use crate::transform::ensure_series;
use abode_data::Observations;
use serde::{Deserialize, Serialize};

/// Append `<column>_div_1 ..= <column>_div_<order>`.
///
/// Order `k` is the gradient of order `k - 1`, with central differences in the
/// interior and one-sided differences at both ends, in units of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivatives {
    column: String,
    order: usize,
}

impl Derivatives {
    /// Create derivatives of `column` up to `order` (at least 1).
    pub fn new(column: impl Into<String>, order: usize) -> Result<Self> {
        let derivatives = Self {
            column: column.into(),
            order,
        };
        derivatives.validate()?;
        Ok(derivatives)
    }

    /// Source column.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Highest derivative order.
    pub const fn order(&self) -> usize {
        self.order
    }

    /// Names of the produced columns, lowest order first.
    pub fn output_columns(&self) -> Vec<String> {
        (1..=self.order)
            .map(|k| derivative_column(&self.column, k))
            .collect()
    }

    /// Stage label used in errors.
    pub fn stage(&self) -> String {
        format!("differentiate({})", self.column)
    }

    /// Check the order.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(FeatureError::InvalidParameter {
                stage: self.stage(),
                reason: "derivative order must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Differentiate the source column of a date-ordered series.
    pub fn apply(&self, table: &Observations) -> Result<Observations> {
        let stage = self.stage();
        let source = table
            .column(&self.column)
            .map_err(|_| FeatureError::MissingColumn {
                stage: stage.clone(),
                column: self.column.clone(),
            })?;
        ensure_series(table, &stage)?;

        let mut out = table.clone();
        let mut previous = source.to_vec();
        for (k, name) in (1..=self.order).zip(self.output_columns()) {
            let next = gradient(&previous).ok_or(FeatureError::InsufficientData {
                stage: format!("{stage} order {k}"),
                required: 2,
                actual: previous.len(),
            })?;
            out.add_column(name, next.clone())?;
            previous = next;
        }
        Ok(out)
    }
}

/// Name of the `order`-th derivative of `column`.
pub fn derivative_column(column: &str, order: usize) -> String {
    format!("{column}_div_{order}")
}

/// Discrete gradient with unit spacing. `None` for fewer than two points.
pub fn gradient(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mut out = Vec::with_capacity(n);
    out.push(values[1] - values[0]);
    out.extend(values.windows(3).map(|w| (w[2] - w[0]) / 2.0));
    out.push(values[n - 1] - values[n - 2]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abode_data::calendar::month_end_from_index;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn series(values: Vec<f64>) -> Observations {
        let dates = (0..values.len() as i64)
            .map(|i| month_end_from_index(24_100 + i).unwrap())
            .collect();
        Observations::new(dates).with_column("x", values).unwrap()
    }

    #[test]
    fn test_gradient_matches_central_differences() {
        let g = gradient(&[1.0, 2.0, 4.0, 7.0, 11.0]).unwrap();
        assert_eq!(g, vec![1.0, 1.5, 2.5, 3.5, 4.0]);
        assert_eq!(gradient(&[3.0, 5.0]).unwrap(), vec![2.0, 2.0]);
        assert!(gradient(&[1.0]).is_none());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    fn test_constant_column_has_zero_derivatives(#[case] order: usize) {
        let table = series(vec![0.0425; 15]);
        let out = Derivatives::new("x", order).unwrap().apply(&table).unwrap();
        for k in 1..=order {
            let d = out.column(&derivative_column("x", k)).unwrap();
            assert!(d.iter().all(|v| *v == 0.0), "order {k} not zero: {d:?}");
        }
    }

    #[test]
    fn test_second_order_of_quadratic() {
        let table = series((0..10).map(|i| f64::from(i * i)).collect());
        let out = Derivatives::new("x", 2).unwrap().apply(&table).unwrap();
        assert_eq!(out.column_names(), vec!["x", "x_div_1", "x_div_2"]);
        // interior second derivative of i^2 is 2 away from the edges
        let d2 = out.column("x_div_2").unwrap();
        for v in &d2[2..8] {
            assert_relative_eq!(*v, 2.0);
        }
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let table = series(vec![1.0]);
        assert!(matches!(
            Derivatives::new("x", 1).unwrap().apply(&table),
            Err(FeatureError::InsufficientData { required: 2, .. })
        ));
    }
}
