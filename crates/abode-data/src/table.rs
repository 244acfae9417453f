//! Observation tables.
//!
//! An [`Observations`] table is an ordered sequence of rows. Every row carries
//! a month-end date, optionally a [`SegmentKey`], and one `f64` value per named
//! column. Dates and segment keys are row identity: they are never dropped by a
//! projection and never become model inputs on their own.

use crate::error::{DataError, Result};
use crate::segment::SegmentKey;
use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A named numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<f64>,
}

impl Column {
    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column values, one per row.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// How a date join validates its keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinValidation {
    /// Each right-hand date appears at most once. Left rows without a partner
    /// are excluded from the result.
    ManyToOne,

    /// Both sides have unique dates and every date has a partner.
    OneToOne,
}

/// Date-ordered table of numeric observations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observations {
    dates: Vec<NaiveDate>,
    segments: Option<Vec<SegmentKey>>,
    columns: Vec<Column>,
}

impl Observations {
    /// Create a table with the given row dates and no columns.
    pub const fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            segments: None,
            columns: Vec::new(),
        }
    }

    /// Attach one segment key per row.
    pub fn with_segments(mut self, segments: Vec<SegmentKey>) -> Result<Self> {
        if segments.len() != self.dates.len() {
            return Err(DataError::LengthMismatch {
                name: "segments".to_string(),
                expected: self.dates.len(),
                actual: segments.len(),
            });
        }
        self.segments = Some(segments);
        Ok(self)
    }

    /// Builder form of [`Observations::add_column`].
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.add_column(name, values)?;
        Ok(self)
    }

    /// Append a column. Fails on a length mismatch or a duplicate name.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(DataError::LengthMismatch {
                name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        if self.has_column(&name) {
            return Err(DataError::DuplicateColumn(name));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Remove a column and return its values.
    pub fn drop_column(&mut self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .position(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))?;
        Ok(self.columns.remove(idx).values)
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Row dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Row segment keys, if the table is segmented.
    pub fn segments(&self) -> Option<&[SegmentKey]> {
        self.segments.as_deref()
    }

    /// Whether every row carries a segment key.
    pub const fn is_segmented(&self) -> bool {
        self.segments.is_some()
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Values of a column.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.position(name)
            .map(|idx| self.columns[idx].values.as_slice())
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// First and last date, if any rows exist.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.dates.iter().min()?;
        let last = self.dates.iter().max()?;
        Some((*first, *last))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Keep only the named columns, in the given order.
    ///
    /// Dates and segment keys are preserved. Every name must exist.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column(name).map(|values| Column {
                    name: name.to_string(),
                    values: values.to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dates: self.dates.clone(),
            segments: self.segments.clone(),
            columns,
        })
    }

    /// Rows at the given positions, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(DataError::Parse(format!(
                "row index {bad} out of bounds for table of {} rows",
                self.len()
            )));
        }

        let pick = |values: &[f64]| indices.iter().map(|&i| values[i]).collect::<Vec<_>>();

        Ok(Self {
            dates: indices.iter().map(|&i| self.dates[i]).collect(),
            segments: self
                .segments
                .as_ref()
                .map(|s| indices.iter().map(|&i| s[i]).collect()),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: pick(&c.values),
                })
                .collect(),
        })
    }

    /// Rows belonging to one segment.
    pub fn filter_segment(&self, key: SegmentKey) -> Result<Self> {
        let segments = self.segments.as_ref().ok_or(DataError::NotSegmented)?;
        let indices: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == key)
            .map(|(i, _)| i)
            .collect();
        self.take_rows(&indices)
    }

    /// Drop rows where the named column is NaN.
    pub fn drop_missing(&self, name: &str) -> Result<Self> {
        let values = self.column(name)?;
        let indices: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, _)| i)
            .collect();
        self.take_rows(&indices)
    }

    /// Number of rows per segment.
    pub fn segment_counts(&self) -> Result<BTreeMap<SegmentKey, usize>> {
        let segments = self.segments.as_ref().ok_or(DataError::NotSegmented)?;
        let mut counts = BTreeMap::new();
        for key in segments {
            *counts.entry(*key).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Sort rows by date, then segment key.
    pub fn sorted(&self) -> Result<Self> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by_key(|&i| (self.dates[i], self.segments.as_ref().map(|s| s[i])));
        self.take_rows(&indices)
    }

    /// Stack tables with identical column names and segmentation.
    pub fn concat(tables: Vec<Self>) -> Result<Self> {
        let mut iter = tables.into_iter();
        let Some(mut out) = iter.next() else {
            return Ok(Self::default());
        };

        for table in iter {
            if table.column_names() != out.column_names() {
                return Err(DataError::DataIntegrity(format!(
                    "cannot concatenate tables with columns {:?} and {:?}",
                    out.column_names(),
                    table.column_names()
                )));
            }
            match (&mut out.segments, table.segments) {
                (Some(acc), Some(more)) => acc.extend(more),
                (None, None) => {}
                _ => {
                    return Err(DataError::DataIntegrity(
                        "cannot concatenate segmented and unsegmented tables".to_string(),
                    ));
                }
            }
            out.dates.extend(table.dates);
            for (acc, more) in out.columns.iter_mut().zip(table.columns) {
                acc.values.extend(more.values);
            }
        }

        Ok(out)
    }

    /// Dense row-major matrix of the named columns.
    pub fn to_matrix<S: AsRef<str>>(&self, names: &[S]) -> Result<Array2<f64>> {
        let columns = names
            .iter()
            .map(|n| self.column(n.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Array2::from_shape_fn(
            (self.len(), columns.len()),
            |(row, col)| columns[col][row],
        ))
    }

    /// Fail if any (date, segment) pair appears more than once.
    pub fn validate_unique_keys(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.len());
        for (i, date) in self.dates.iter().enumerate() {
            let segment = self.segments.as_ref().map(|s| s[i]);
            if !seen.insert((*date, segment)) {
                return Err(DataError::DataIntegrity(match segment {
                    Some(key) => format!("duplicate row for {date} in segment {key}"),
                    None => format!("duplicate row for {date}"),
                }));
            }
        }
        Ok(())
    }

    /// Attach the columns of a date-keyed table to every row with the same date.
    ///
    /// The right-hand table must not be segmented and must not share column
    /// names with this table.
    pub fn join_on_date(&self, right: &Self, validation: JoinValidation) -> Result<Self> {
        if right.is_segmented() {
            return Err(DataError::DataIntegrity(
                "right side of a date join must be keyed by date only".to_string(),
            ));
        }
        if let Some(clash) = right.columns.iter().find(|c| self.has_column(&c.name)) {
            return Err(DataError::DuplicateColumn(clash.name.clone()));
        }

        let mut right_index: HashMap<NaiveDate, usize> = HashMap::with_capacity(right.len());
        for (i, date) in right.dates.iter().enumerate() {
            if right_index.insert(*date, i).is_some() {
                return Err(DataError::DataIntegrity(format!(
                    "date {date} appears more than once on the right side of a join"
                )));
            }
        }

        if validation == JoinValidation::OneToOne {
            self.validate_unique_keys()?;
            let left_dates: HashSet<NaiveDate> = self.dates.iter().copied().collect();
            if let Some(date) = self.dates.iter().find(|d| !right_index.contains_key(d)) {
                return Err(DataError::DataIntegrity(format!(
                    "date {date} has no partner on the right side of a one-to-one join"
                )));
            }
            if let Some(date) = right.dates.iter().find(|d| !left_dates.contains(d)) {
                return Err(DataError::DataIntegrity(format!(
                    "date {date} has no partner on the left side of a one-to-one join"
                )));
            }
        }

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = self
            .dates
            .iter()
            .enumerate()
            .filter_map(|(i, d)| right_index.get(d).map(|&j| (i, j)))
            .unzip();

        let unmatched = self.len() - left_rows.len();
        if unmatched > 0 {
            tracing::warn!(
                unmatched,
                total = self.len(),
                "rows without a matching date were excluded from the join"
            );
        }

        let mut joined = self.take_rows(&left_rows)?;
        for column in &right.columns {
            let values = right_rows.iter().map(|&j| column.values[j]).collect();
            joined.add_column(column.name.clone(), values)?;
        }
        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn month(m: u32) -> NaiveDate {
        crate::calendar::month_end_of(2020, m).unwrap()
    }

    fn features() -> Observations {
        Observations::new(vec![month(1), month(2), month(3)])
            .with_column("apr", vec![0.04, 0.041, 0.042])
            .unwrap()
    }

    fn targets() -> Observations {
        let k1 = SegmentKey::new(1, 1).unwrap();
        let k2 = SegmentKey::new(2, 3).unwrap();
        Observations::new(vec![month(1), month(1), month(2), month(4)])
            .with_segments(vec![k1, k2, k1, k1])
            .unwrap()
            .with_column("price", vec![100.0, 200.0, 110.0, 130.0])
            .unwrap()
    }

    #[test]
    fn test_add_column_checks() {
        let mut t = features();
        assert!(matches!(
            t.add_column("x", vec![1.0]),
            Err(DataError::LengthMismatch { .. })
        ));
        assert!(matches!(
            t.add_column("apr", vec![1.0, 2.0, 3.0]),
            Err(DataError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_select_keeps_identity() {
        let t = targets().with_column("extra", vec![0.0; 4]).unwrap();
        let s = t.select(&["price"]).unwrap();
        assert_eq!(s.column_names(), vec!["price"]);
        assert_eq!(s.dates(), t.dates());
        assert_eq!(s.segments(), t.segments());
        assert!(matches!(
            t.select(&["missing"]),
            Err(DataError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_filter_segment() {
        let t = targets();
        let k1 = SegmentKey::new(1, 1).unwrap();
        let sub = t.filter_segment(k1).unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.column("price").unwrap(), &[100.0, 110.0, 130.0]);

        assert!(matches!(
            features().filter_segment(k1),
            Err(DataError::NotSegmented)
        ));
    }

    #[test]
    fn test_join_many_to_one_excludes_unmatched() {
        let joined = targets()
            .join_on_date(&features(), JoinValidation::ManyToOne)
            .unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.column_names(), vec!["price", "apr"]);
        assert_relative_eq!(joined.column("apr").unwrap()[2], 0.041);
    }

    #[test]
    fn test_join_rejects_duplicate_right_dates() {
        let right = Observations::new(vec![month(1), month(1)])
            .with_column("apr", vec![0.1, 0.2])
            .unwrap();
        assert!(matches!(
            targets().join_on_date(&right, JoinValidation::ManyToOne),
            Err(DataError::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_join_one_to_one_requires_partners() {
        let left = Observations::new(vec![month(1), month(2)])
            .with_column("fmr", vec![1.0, 2.0])
            .unwrap();
        assert!(matches!(
            left.join_on_date(&features(), JoinValidation::OneToOne),
            Err(DataError::DataIntegrity(_))
        ));

        let full = Observations::new(vec![month(1), month(2), month(3)])
            .with_column("fmr", vec![1.0, 2.0, 3.0])
            .unwrap();
        let joined = full
            .join_on_date(&features(), JoinValidation::OneToOne)
            .unwrap();
        assert_eq!(joined.len(), 3);
    }

    #[test]
    fn test_validate_unique_keys() {
        assert!(targets().validate_unique_keys().is_ok());
        let k = SegmentKey::new(1, 1).unwrap();
        let dup = Observations::new(vec![month(1), month(1)])
            .with_segments(vec![k, k])
            .unwrap();
        assert!(dup.validate_unique_keys().is_err());
    }

    #[test]
    fn test_to_matrix_and_drop_missing() {
        let t = Observations::new(vec![month(1), month(2)])
            .with_column("a", vec![1.0, f64::NAN])
            .unwrap()
            .with_column("b", vec![3.0, 4.0])
            .unwrap();
        let m = t.to_matrix(&["b", "a"]).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert_relative_eq!(m[[0, 0]], 3.0);
        assert_relative_eq!(m[[0, 1]], 1.0);

        let clean = t.drop_missing("a").unwrap();
        assert_eq!(clean.len(), 1);
    }

    #[test]
    fn test_concat_and_sort() {
        let a = Observations::new(vec![month(2)])
            .with_column("v", vec![2.0])
            .unwrap();
        let b = Observations::new(vec![month(1)])
            .with_column("v", vec![1.0])
            .unwrap();
        let stacked = Observations::concat(vec![a, b]).unwrap().sorted().unwrap();
        assert_eq!(stacked.dates(), &[month(1), month(2)]);
        assert_eq!(stacked.column("v").unwrap(), &[1.0, 2.0]);
    }
}
