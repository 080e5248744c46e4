//! Year × month grid of monthly returns.

use chrono::Datelike;
use std::collections::BTreeMap;

use super::series::TimeSeries;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    /// Return per calendar month, `NaN` where the month has no data.
    pub months: [f64; 12],
    /// Compounded return of the year.
    pub ytd: f64,
    /// Annualized sample standard deviation of the monthly returns.
    pub stdev: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlyTable {
    pub rows: BTreeMap<i32, MonthlyRow>,
}

impl MonthlyTable {
    pub fn from_returns(monthly_returns: &TimeSeries) -> Self {
        let mut by_year: BTreeMap<i32, Vec<(u32, f64)>> = BTreeMap::new();
        for (date, r) in monthly_returns.iter().filter(|(_, r)| !r.is_nan()) {
            by_year.entry(date.year()).or_default().push((date.month(), r));
        }

        let rows = by_year
            .into_iter()
            .map(|(year, entries)| {
                let mut months = [f64::NAN; 12];
                for (month, r) in &entries {
                    months[(*month - 1) as usize] = *r;
                }
                let ytd = entries.iter().fold(1.0, |acc, (_, r)| acc * (1.0 + r)) - 1.0;
                let stdev = sample_std(entries.iter().map(|(_, r)| *r)) * 12f64.sqrt();
                (year, MonthlyRow { months, ytd, stdev })
            })
            .collect();

        Self { rows }
    }

    pub fn get(&self, year: i32) -> Option<&MonthlyRow> {
        self.rows.get(&year)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn sample_std<I: Iterator<Item = f64>>(values: I) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}
