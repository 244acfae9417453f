//! Monthly resampling of irregular series as polars expressions.
//!
//! Months are keyed by a consecutive month number (see
//! [`crate::calendar::month_index`]) so that gaps can be measured and filled
//! in month steps regardless of day-of-month.

use crate::calendar::month_end_from_index;
use crate::error::Result;
use crate::frame::i64_values;
use chrono::NaiveDate;
use polars::prelude::*;

/// Column holding the consecutive month number.
pub const MONTH: &str = "month";

/// Consecutive month number of a date expression.
pub fn month_number(date: Expr) -> Expr {
    let date = date.cast(DataType::Date);
    date.clone().dt().year().cast(DataType::Int64) * lit(12i64)
        + date.dt().month().cast(DataType::Int64)
        - lit(1i64)
}

/// Average `values` per calendar month of `date` within each `keys` group.
///
/// Nulls are skipped; the output carries `keys`, [`MONTH`] and `values`,
/// sorted by `keys` then month.
pub fn monthly_mean(frame: LazyFrame, date: &str, keys: &[&str], values: &[&str]) -> LazyFrame {
    let mut group: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    group.push(col(MONTH));
    let mut order: Vec<&str> = keys.to_vec();
    order.push(MONTH);

    frame
        .with_column(month_number(col(date)).alias(MONTH))
        .group_by(group)
        .agg(values.iter().map(|v| col(*v).mean()).collect::<Vec<_>>())
        .sort(order, Default::default())
}

/// Upsample a monthly frame to every month between the first and last month
/// of each `key` group, interpolating `values` linearly in month steps.
///
/// `frame` must carry `key`, [`MONTH`] and `values` with at most one row per
/// (key, month).
pub fn interpolate_monthly(frame: DataFrame, key: &str, values: &[&str]) -> Result<DataFrame> {
    let spans = frame
        .clone()
        .lazy()
        .group_by([col(key)])
        .agg([
            col(MONTH).min().alias("first"),
            col(MONTH).max().alias("last"),
        ])
        .sort([key], Default::default())
        .collect()?;

    let groups = i64_values(&spans, key)?;
    let firsts = i64_values(&spans, "first")?;
    let lasts = i64_values(&spans, "last")?;
    let (grid_keys, grid_months): (Vec<i64>, Vec<i64>) = groups
        .iter()
        .zip(firsts.iter().zip(&lasts))
        .flat_map(|(&group, (&first, &last))| (first..=last).map(move |m| (group, m)))
        .unzip();

    let grid = DataFrame::new(vec![
        Series::new(key.into(), grid_keys).into(),
        Series::new(MONTH.into(), grid_months).into(),
    ])?;

    Ok(grid
        .lazy()
        .join(
            frame.lazy(),
            [col(key), col(MONTH)],
            [col(key), col(MONTH)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([key, MONTH], Default::default())
        .with_columns(
            values
                .iter()
                .map(|v| {
                    col(*v)
                        .interpolate(InterpolationMethod::Linear)
                        .over([col(key)])
                })
                .collect::<Vec<_>>(),
        )
        .collect()?)
}

/// Month-end dates of a [`MONTH`] column.
pub fn month_ends(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    i64_values(df, MONTH)?
        .into_iter()
        .map(month_end_from_index)
        .collect()
}
