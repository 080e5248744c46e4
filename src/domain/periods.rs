//! Period returns relative to an as-of date (MTD, YTD, rolling years).
//!
//! Each period has a boundary: the last day of the previous month (MTD),
//! the last day of the previous year (YTD) or the as-of date minus N years.
//! The period return compounds every return strictly after the boundary and
//! on or before the as-of date.

use chrono::{Datelike, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::error::EngineError;
use super::series::{month_end, TimeSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    MonthToDate,
    YearToDate,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::MonthToDate,
        Period::YearToDate,
        Period::OneYear,
        Period::ThreeYears,
        Period::FiveYears,
        Period::TenYears,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Period::MonthToDate => "Month-to-Date",
            Period::YearToDate => "Year-to-Date",
            Period::OneYear => "One Year",
            Period::ThreeYears => "Three Years",
            Period::FiveYears => "Five Years",
            Period::TenYears => "Ten Years",
        }
    }

    /// Nearest boundary preceding `today`.
    pub fn boundary(&self, today: NaiveDate) -> NaiveDate {
        let years_back = |n: u32| {
            today
                .checked_sub_months(Months::new(12 * n))
                .unwrap_or(NaiveDate::MIN)
        };
        match self {
            Period::MonthToDate => {
                let (year, month) = if today.month() == 1 {
                    (today.year() - 1, 12)
                } else {
                    (today.year(), today.month() - 1)
                };
                month_end(year, month)
            }
            Period::YearToDate => month_end(today.year() - 1, 12),
            Period::OneYear => years_back(1),
            Period::ThreeYears => years_back(3),
            Period::FiveYears => years_back(5),
            Period::TenYears => years_back(10),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Period::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(key))
            .or(match key.to_uppercase().as_str() {
                "MTD" => Some(Period::MonthToDate),
                "YTD" => Some(Period::YearToDate),
                _ => None,
            })
            .ok_or_else(|| EngineError::UnknownPeriod(s.to_string()))
    }
}

/// Boundary of every period as of `today`.
pub fn period_offsets(today: NaiveDate) -> Vec<(Period, NaiveDate)> {
    Period::ALL.iter().map(|p| (*p, p.boundary(today))).collect()
}

/// Compounded return over `(boundary, today]`; `NaN` when no return falls
/// inside the window.
pub fn period_return(returns: &TimeSeries, boundary: NaiveDate, today: NaiveDate) -> f64 {
    let window: Vec<f64> = returns
        .iter()
        .filter(|(d, r)| *d > boundary && *d <= today && !r.is_nan())
        .map(|(_, r)| r)
        .collect();
    if window.is_empty() {
        return f64::NAN;
    }
    window.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Return for every period, in [`Period::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturns {
    pub today: NaiveDate,
    pub values: Vec<(Period, f64)>,
}

impl PeriodReturns {
    pub fn compute(returns: &TimeSeries, today: NaiveDate) -> Self {
        let values = period_offsets(today)
            .into_iter()
            .map(|(period, boundary)| (period, period_return(returns, boundary, today)))
            .collect();
        Self { today, values }
    }

    pub fn get(&self, period: Period) -> f64 {
        self.values
            .iter()
            .find(|(p, _)| *p == period)
            .map_or(f64::NAN, |(_, v)| *v)
    }

    /// Lookup by label, e.g. `"Month-to-Date"` or `"YTD"`.
    pub fn get_label(&self, label: &str) -> Result<f64, EngineError> {
        Ok(self.get(label.parse()?))
    }
}

pub fn period_returns(returns: &TimeSeries, today: NaiveDate) -> PeriodReturns {
    PeriodReturns::compute(returns, today)
}
