//! Date-indexed tables of asset values (prices, weights, returns).
//!
//! A [`Frame`] has a strictly increasing date index, unique column names and
//! one `f64` per cell. Missing cells are `NaN`.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::error::EngineError;
use super::series::{validate_index, TimeSeries};

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Vec<NaiveDate>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl Frame {
    pub fn new(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, EngineError> {
        if rows.len() != index.len() {
            return Err(EngineError::ShapeMismatch {
                expected: index.len(),
                found: rows.len(),
            });
        }
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(EngineError::ShapeMismatch {
                expected: columns.len(),
                found: row.len(),
            });
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(EngineError::DuplicateColumn(column.clone()));
            }
        }
        validate_index(&index)?;
        Ok(Self {
            index,
            columns,
            rows,
        })
    }

    /// Frame with every cell set to `value`.
    pub fn filled(
        index: Vec<NaiveDate>,
        columns: Vec<String>,
        value: f64,
    ) -> Result<Self, EngineError> {
        let rows = vec![vec![value; columns.len()]; index.len()];
        Self::new(index, columns, rows)
    }

    /// Build from named columns of equal length.
    pub fn from_columns(
        index: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, EngineError> {
        if let Some((_, values)) = columns.iter().find(|(_, v)| v.len() != index.len()) {
            return Err(EngineError::ShapeMismatch {
                expected: index.len(),
                found: values.len(),
            });
        }
        let rows = (0..index.len())
            .map(|i| columns.iter().map(|(_, v)| v[i]).collect())
            .collect();
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Self::new(index, names, rows)
    }

    /// Same index and columns, new cells. Shapes must already agree.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<f64>>) -> Frame {
        Frame {
            index: self.index.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.rows[i]
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.binary_search(&date).ok()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let i = self.position(date)?;
        let j = self.column_position(column)?;
        Some(self.rows[i][j])
    }

    pub fn column(&self, name: &str) -> Option<TimeSeries> {
        let j = self.column_position(name)?;
        Some(self.column_at(j))
    }

    pub(crate) fn column_at(&self, j: usize) -> TimeSeries {
        TimeSeries::from_parts_unchecked(
            self.index.clone(),
            self.rows.iter().map(|r| r[j]).collect(),
        )
    }

    /// Row at `date` as a column → value map.
    pub fn row_map(&self, date: NaiveDate) -> Option<BTreeMap<String, f64>> {
        let i = self.position(date)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(self.rows[i].iter().copied())
                .collect(),
        )
    }

    /// Propagate the last defined value of each column into missing cells.
    pub fn ffill(&self) -> Frame {
        let mut rows = self.rows.clone();
        for i in 1..rows.len() {
            for j in 0..self.columns.len() {
                if rows[i][j].is_nan() {
                    rows[i][j] = rows[i - 1][j];
                }
            }
        }
        self.with_rows(rows)
    }

    /// Replace missing cells with `value`.
    pub fn fillna(&self, value: f64) -> Frame {
        self.map(|v| if v.is_nan() { value } else { v })
    }

    /// Column-wise percentage change, first row missing.
    pub fn pct_change(&self) -> Frame {
        let returns: Vec<TimeSeries> = (0..self.width())
            .map(|j| self.column_at(j).pct_change())
            .collect();
        let rows = (0..self.len())
            .map(|i| returns.iter().map(|r| r.values()[i]).collect())
            .collect();
        self.with_rows(rows)
    }

    /// Row-over-row difference, first row missing.
    pub fn diff(&self) -> Frame {
        let rows = (0..self.len())
            .map(|i| {
                if i == 0 {
                    vec![f64::NAN; self.width()]
                } else {
                    self.rows[i]
                        .iter()
                        .zip(&self.rows[i - 1])
                        .map(|(a, b)| a - b)
                        .collect()
                }
            })
            .collect();
        self.with_rows(rows)
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Frame {
        self.with_rows(
            self.rows
                .iter()
                .map(|r| r.iter().map(|&v| f(v)).collect())
                .collect(),
        )
    }

    /// Cell-wise combination of two frames with identical shape.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Frame, f: F) -> Result<Frame, EngineError> {
        if self.index != other.index {
            return Err(EngineError::IndexMismatch);
        }
        if self.columns != other.columns {
            return Err(EngineError::ShapeMismatch {
                expected: self.width(),
                found: other.width(),
            });
        }
        Ok(self.with_rows(
            self.rows
                .iter()
                .zip(&other.rows)
                .map(|(a, b)| a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
                .collect(),
        ))
    }

    /// Keep rows within `[before, after]`, both bounds inclusive.
    pub fn truncate(&self, before: Option<NaiveDate>, after: Option<NaiveDate>) -> Frame {
        let keep: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, d)| before.is_none_or(|b| **d >= b) && after.is_none_or(|a| **d <= a))
            .map(|(i, _)| i)
            .collect();
        self.select_rows(&keep)
    }

    pub fn tail(&self, n: usize) -> Frame {
        let start = self.len().saturating_sub(n);
        let keep: Vec<usize> = (start..self.len()).collect();
        self.select_rows(&keep)
    }

    /// Rows at the given (increasing) positions.
    pub(crate) fn select_rows(&self, positions: &[usize]) -> Frame {
        Frame {
            index: positions.iter().map(|&i| self.index[i]).collect(),
            columns: self.columns.clone(),
            rows: positions.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Rows at the given dates; unknown dates fail.
    pub fn select_dates(&self, dates: &[NaiveDate]) -> Result<Frame, EngineError> {
        let positions = dates
            .iter()
            .map(|&d| self.position(d).ok_or(EngineError::UnknownTimestamp(d)))
            .collect::<Result<Vec<_>, _>>()?;
        Frame::new(
            dates.to_vec(),
            self.columns.clone(),
            positions.iter().map(|&i| self.rows[i].clone()).collect(),
        )
    }

    /// Subset of columns, in the requested order. Unknown names fail.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame, EngineError> {
        let positions = names
            .iter()
            .map(|n| {
                self.column_position(n.as_ref())
                    .ok_or_else(|| EngineError::UnknownAsset(n.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let columns = names.iter().map(|n| n.as_ref().to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| positions.iter().map(|&j| r[j]).collect())
            .collect();
        Frame::new(self.index.clone(), columns, rows)
    }

    /// Same rows laid onto `columns`; columns not present here are missing.
    pub fn reindex_columns(&self, columns: &[String]) -> Frame {
        let positions: Vec<Option<usize>> =
            columns.iter().map(|c| self.column_position(c)).collect();
        Frame {
            index: self.index.clone(),
            columns: columns.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|r| {
                    positions
                        .iter()
                        .map(|p| p.map_or(f64::NAN, |j| r[j]))
                        .collect()
                })
                .collect(),
        }
    }

    /// Same columns laid onto `index`; dates not present here are missing.
    pub fn reindex(&self, index: &[NaiveDate]) -> Result<Frame, EngineError> {
        let rows = index
            .iter()
            .map(|&d| match self.position(d) {
                Some(i) => self.rows[i].clone(),
                None => vec![f64::NAN; self.width()],
            })
            .collect();
        Frame::new(index.to_vec(), self.columns.clone(), rows)
    }

    /// Row sums, skipping missing cells. An all-missing row sums to zero.
    pub fn sum_rows(&self) -> TimeSeries {
        TimeSeries::from_parts_unchecked(
            self.index.clone(),
            self.rows
                .iter()
                .map(|r| r.iter().filter(|v| !v.is_nan()).sum())
                .collect(),
        )
    }

    /// Sum columns within groups given by `groups` (column → group name).
    /// Columns without a group are dropped; groups come out sorted.
    pub fn group_columns(&self, groups: &BTreeMap<String, String>) -> Frame {
        let names: BTreeSet<&String> = self
            .columns
            .iter()
            .filter_map(|c| groups.get(c))
            .collect();
        let names: Vec<String> = names.into_iter().cloned().collect();
        let targets: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| groups.get(c).and_then(|g| names.iter().position(|n| n == g)))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut sums = vec![0.0; names.len()];
                for (value, target) in r.iter().zip(&targets) {
                    if let Some(k) = target {
                        if !value.is_nan() {
                            sums[*k] += value;
                        }
                    }
                }
                sums
            })
            .collect();
        Frame {
            index: self.index.clone(),
            columns: names,
            rows,
        }
    }

    /// Append a column of values.
    pub fn with_column(&self, name: &str, values: &[f64]) -> Result<Frame, EngineError> {
        if values.len() != self.len() {
            return Err(EngineError::ShapeMismatch {
                expected: self.len(),
                found: values.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(r, &v)| {
                let mut r = r.clone();
                r.push(v);
                r
            })
            .collect();
        Frame::new(self.index.clone(), columns, rows)
    }

    /// Stack frames along time. Columns are the sorted union; cells absent
    /// from a frame are missing. Overlapping dates fail.
    pub fn concat_rows(frames: &[Frame]) -> Result<Frame, EngineError> {
        let columns: Vec<String> = frames
            .iter()
            .flat_map(|f| f.columns.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut seen = HashSet::new();
        let mut index = Vec::new();
        let mut rows = Vec::new();
        for frame in frames {
            let aligned = frame.reindex_columns(&columns);
            for (date, row) in aligned.index.into_iter().zip(aligned.rows) {
                if !seen.insert(date) {
                    return Err(EngineError::DuplicateIndex(date));
                }
                index.push(date);
                rows.push(row);
            }
        }
        Frame::new(index, columns, rows)
    }

    /// Place frames side by side. The index is the sorted union of dates;
    /// overlapping columns fail.
    pub fn concat_columns(frames: &[Frame]) -> Result<Frame, EngineError> {
        let index: Vec<NaiveDate> = frames
            .iter()
            .flat_map(|f| f.index.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<f64>> = vec![Vec::new(); index.len()];
        for frame in frames {
            if let Some(dup) = frame.columns.iter().find(|c| columns.contains(c)) {
                return Err(EngineError::DuplicateColumn(dup.clone()));
            }
            columns.extend(frame.columns.iter().cloned());
            let aligned = frame.reindex(&index)?;
            for (row, extra) in rows.iter_mut().zip(aligned.rows) {
                row.extend(extra);
            }
        }
        Frame::new(index, columns, rows)
    }

    /// Largest absolute cell difference; missing cells are ignored.
    /// Frames of different shape compare as infinitely far apart.
    pub fn max_abs_diff(&self, other: &Frame) -> f64 {
        if self.index != other.index || self.columns != other.columns {
            return f64::INFINITY;
        }
        self.rows
            .iter()
            .zip(&other.rows)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()))
            .filter(|v| !v.is_nan())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Frame {
        Frame::new(
            vec![d(1), d(2), d(3)],
            cols(&["A", "B"]),
            vec![vec![1.0, 10.0], vec![f64::NAN, 11.0], vec![3.0, f64::NAN]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Frame::new(vec![d(1)], cols(&["A", "A"]), vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateColumn(c) if c == "A"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Frame::new(vec![d(1)], cols(&["A", "B"]), vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
    }

    #[test]
    fn ffill_propagates_last_value() {
        let f = sample().ffill();
        assert_eq!(f.row(1), &[1.0, 11.0]);
        assert_eq!(f.row(2), &[3.0, 11.0]);
    }

    #[test]
    fn sum_rows_skips_missing() {
        let s = sample().sum_rows();
        assert_eq!(s.values(), &[11.0, 11.0, 3.0]);
    }

    #[test]
    fn group_columns_sums_and_drops_unmapped() {
        let f = Frame::new(
            vec![d(1)],
            cols(&["A", "B", "C"]),
            vec![vec![0.1, 0.2, 0.3]],
        )
        .unwrap();
        let mut groups = BTreeMap::new();
        groups.insert("A".to_string(), "Tech".to_string());
        groups.insert("B".to_string(), "Tech".to_string());
        let g = f.group_columns(&groups);
        assert_eq!(g.columns(), &["Tech".to_string()]);
        assert!((g.row(0)[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn concat_rows_rejects_overlap() {
        let f = sample();
        let err = Frame::concat_rows(&[f.clone(), f]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateIndex(_)));
    }

    #[test]
    fn concat_rows_stacks_disjoint_frames() {
        let f = sample();
        let a = f.truncate(None, Some(d(1)));
        let b = f.truncate(Some(d(2)), None);
        let joined = Frame::concat_rows(&[a, b]).unwrap();
        assert_eq!(joined.index(), f.index());
    }

    #[test]
    fn concat_columns_rejects_overlap() {
        let f = sample();
        let err = Frame::concat_columns(&[f.clone(), f]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateColumn(_)));
    }

    #[test]
    fn concat_columns_unions_index() {
        let a = Frame::new(vec![d(1), d(2)], cols(&["A"]), vec![vec![1.0], vec![2.0]]).unwrap();
        let b = Frame::new(vec![d(2), d(3)], cols(&["B"]), vec![vec![5.0], vec![6.0]]).unwrap();
        let joined = Frame::concat_columns(&[a, b]).unwrap();
        assert_eq!(joined.index(), &[d(1), d(2), d(3)]);
        assert!(joined.row(0)[1].is_nan());
        assert_eq!(joined.row(1), &[2.0, 5.0]);
    }

    #[test]
    fn select_columns_unknown_fails() {
        let err = sample().select_columns(&["Z"]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownAsset(a) if a == "Z"));
    }

    #[test]
    fn max_abs_diff_ignores_missing() {
        let a = sample();
        let b = a.map(|v| v + 0.5);
        assert!((a.max_abs_diff(&b) - 0.5).abs() < 1e-12);
    }
}
