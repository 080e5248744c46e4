//! Date-indexed value series and resampling frequencies.
//!
//! A [`TimeSeries`] holds one `f64` per date with a strictly increasing
//! index. Missing observations are `NaN`.

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;

/// Check that `index` is strictly increasing.
pub(crate) fn validate_index(index: &[NaiveDate]) -> Result<(), EngineError> {
    for (position, pair) in index.windows(2).enumerate() {
        if pair[1] == pair[0] {
            return Err(EngineError::DuplicateIndex(pair[1]));
        }
        if pair[1] < pair[0] {
            return Err(EngineError::NotIncreasing {
                position: position + 1,
                previous: pair[0],
                current: pair[1],
            });
        }
    }
    Ok(())
}

/// Resample frequency used for NAV resampling and time ironing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Weeks ending on Sunday.
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    /// Last calendar day of the period containing `date`.
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Weekly => {
                let ahead = 6 - date.weekday().num_days_from_monday() as i64;
                date + Duration::days(ahead)
            }
            Frequency::Monthly => month_end(date.year(), date.month()),
            Frequency::Quarterly => {
                let quarter_month = ((date.month() - 1) / 3 + 1) * 3;
                month_end(date.year(), quarter_month)
            }
            Frequency::Annual => month_end(date.year(), 12),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self {
            Frequency::Weekly => "W",
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Annual => "A",
        };
        write!(f, "{rule}")
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "W" | "WEEKLY" => Ok(Frequency::Weekly),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            "Q" | "3M" | "QUARTERLY" => Ok(Frequency::Quarterly),
            "A" | "Y" | "ANNUAL" => Ok(Frequency::Annual),
            _ => Err(EngineError::InvalidFrequency(s.to_string())),
        }
    }
}

/// Last day of the given month.
pub fn month_end(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// A strictly increasing date → value series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    index: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(index: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, EngineError> {
        if index.len() != values.len() {
            return Err(EngineError::ShapeMismatch {
                expected: index.len(),
                found: values.len(),
            });
        }
        validate_index(&index)?;
        Ok(Self { index, values })
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (index, values) = pairs.into_iter().unzip();
        Self::new(index, values)
    }

    /// Build from parts already known to be valid (sub-slices of a valid series).
    pub(crate) fn from_parts_unchecked(index: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, f64)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.iter().last()
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.index.binary_search(&date).ok()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.position(date).map(|i| self.values[i])
    }

    /// Drop missing observations.
    pub fn dropna(&self) -> TimeSeries {
        let (index, values) = self.iter().filter(|(_, v)| !v.is_nan()).unzip();
        Self::from_parts_unchecked(index, values)
    }

    /// Simple percentage change; the first element is missing.
    pub fn pct_change(&self) -> TimeSeries {
        let mut values = Vec::with_capacity(self.len());
        let mut previous = f64::NAN;
        for &v in &self.values {
            values.push(v / previous - 1.0);
            if !v.is_nan() {
                previous = v;
            }
        }
        Self::from_parts_unchecked(self.index.clone(), values)
    }

    /// Keep dates within `[before, after]`, both bounds inclusive.
    pub fn truncate(&self, before: Option<NaiveDate>, after: Option<NaiveDate>) -> TimeSeries {
        let (index, values) = self
            .iter()
            .filter(|(d, _)| before.is_none_or(|b| *d >= b) && after.is_none_or(|a| *d <= a))
            .unzip();
        Self::from_parts_unchecked(index, values)
    }

    pub fn head(&self, n: usize) -> TimeSeries {
        let n = n.min(self.len());
        Self::from_parts_unchecked(self.index[..n].to_vec(), self.values[..n].to_vec())
    }

    pub fn tail(&self, n: usize) -> TimeSeries {
        let start = self.len().saturating_sub(n);
        Self::from_parts_unchecked(self.index[start..].to_vec(), self.values[start..].to_vec())
    }

    pub fn map<F: FnMut(f64) -> f64>(&self, mut f: F) -> TimeSeries {
        Self::from_parts_unchecked(self.index.clone(), self.values.iter().map(|&v| f(v)).collect())
    }

    /// Cumulative product of `1 + r`.
    pub fn cum_growth(&self) -> TimeSeries {
        let mut level = 1.0;
        let values = self
            .values
            .iter()
            .map(|r| {
                level *= 1.0 + r;
                level
            })
            .collect();
        Self::from_parts_unchecked(self.index.clone(), values)
    }

    /// Last defined value of every period that has data, stamped at the period end.
    pub fn resample_last(&self, freq: Frequency) -> TimeSeries {
        let mut index: Vec<NaiveDate> = Vec::new();
        let mut values: Vec<f64> = Vec::new();
        for (date, value) in self.iter() {
            let end = freq.period_end(date);
            if index.last() != Some(&end) {
                index.push(end);
                values.push(f64::NAN);
            }
            if !value.is_nan() {
                if let Some(last) = values.last_mut() {
                    *last = value;
                }
            }
        }
        Self::from_parts_unchecked(index, values)
    }

    /// Mean of the defined values, `NaN` if there are none.
    pub fn mean(&self) -> f64 {
        let defined: Vec<f64> = self.values.iter().copied().filter(|v| !v.is_nan()).collect();
        if defined.is_empty() {
            return f64::NAN;
        }
        defined.iter().sum::<f64>() / defined.len() as f64
    }

    /// Sample standard deviation (n - 1) of the defined values.
    pub fn std(&self) -> f64 {
        let defined: Vec<f64> = self.values.iter().copied().filter(|v| !v.is_nan()).collect();
        if defined.len() < 2 {
            return f64::NAN;
        }
        let mean = defined.iter().sum::<f64>() / defined.len() as f64;
        let variance = defined.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (defined.len() - 1) as f64;
        variance.sqrt()
    }

    /// Largest defined value, `NaN` if there are none.
    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, f64::max)
    }

    /// Smallest defined value, `NaN` if there are none.
    pub fn min(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::NAN, f64::min)
    }
}
