//! Ordered performance report of a [`NavSeries`].
//!
//! Percent metrics are multiplied by 100; ratios, counts, nav levels and
//! dates are reported as they are.

use chrono::{Months, NaiveDate};
use std::fmt;

use super::nav::NavSeries;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryValue {
    Number(f64),
    Count(usize),
    Date(NaiveDate),
    Missing,
}

impl SummaryValue {
    /// Numeric view; counts widen to `f64`, dates and missing entries are `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SummaryValue::Number(v) => Some(*v),
            SummaryValue::Count(n) => Some(*n as f64),
            SummaryValue::Date(_) | SummaryValue::Missing => None,
        }
    }
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Number(v) if v.is_nan() => write!(f, ""),
            SummaryValue::Number(v) => write!(f, "{v:.2}"),
            SummaryValue::Count(n) => write!(f, "{n}"),
            SummaryValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SummaryValue::Missing => write!(f, ""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub entries: Vec<(String, SummaryValue)>,
}

impl Summary {
    pub fn get(&self, label: &str) -> Option<SummaryValue> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    fn push(&mut self, label: impl Into<String>, value: SummaryValue) {
        self.entries.push((label.into(), value));
    }

    fn pct(&mut self, label: impl Into<String>, value: f64) {
        self.push(label, SummaryValue::Number(100.0 * value));
    }

    fn num(&mut self, label: impl Into<String>, value: f64) {
        self.push(label, SummaryValue::Number(value));
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.labels().map(str::len).max().unwrap_or(0);
        for (label, value) in &self.entries {
            writeln!(f, "{label:<width$}  {value}")?;
        }
        Ok(())
    }
}

impl NavSeries {
    pub fn summary(&self, alpha: f64, periods: Option<f64>, r_f: f64) -> Summary {
        let periods = periods.unwrap_or_else(|| self.periods_per_year());
        let returns = self.returns().dropna();
        let drawdown = self.drawdown();
        let alpha_label = (100.0 * alpha) as i64;

        let mut s = Summary::default();
        let cum_return = returns
            .values()
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r))
            - 1.0;
        s.pct("Return", cum_return);
        s.push("# Events", SummaryValue::Count(returns.len()));
        s.num("# Events per year", periods);

        s.pct("Annualized Return", self.annualized_return(Some(periods)));
        s.pct(
            "Annualized Volatility",
            self.annualized_volatility(Some(periods)),
        );
        s.num(
            format!("Annualized Sharpe Ratio (r_f = {r_f})"),
            self.sharpe_ratio(Some(periods), r_f),
        );

        s.pct("Max Drawdown", drawdown.max());
        s.pct("Max % return", returns.max());
        s.pct("Min % return", returns.min());

        s.pct("MTD", self.mtd());
        s.pct("YTD", self.ytd());

        s.num("Current Nav", self.current());
        s.num("Max Nav", self.max());
        s.pct(
            "Current Drawdown",
            drawdown.last().map_or(f64::NAN, |(_, v)| v),
        );

        s.num("Calmar Ratio (3Y)", self.calmar_ratio(Some(periods), r_f));

        let positive = returns.values().iter().filter(|r| **r >= 0.0).count();
        s.push("# Positive Events", SummaryValue::Count(positive));
        s.push(
            "# Negative Events",
            SummaryValue::Count(returns.len() - positive),
        );

        s.pct(
            format!("Value at Risk (alpha = {alpha_label})"),
            self.var(alpha),
        );
        s.pct(
            format!("Conditional Value at Risk (alpha = {alpha_label})"),
            self.cvar(alpha),
        );

        let date = |d: Option<NaiveDate>| d.map_or(SummaryValue::Missing, SummaryValue::Date);
        s.push("First at", date(self.first_date()));
        s.push("Last at", date(self.last_date()));
        s
    }
}

/// One summary per trailing window; `None` is the whole history.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub summaries: Vec<Summary>,
}

impl SummaryTable {
    pub fn labels(&self) -> Vec<String> {
        self.summaries
            .first()
            .map(|s| s.labels().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, column: &str, label: &str) -> Option<SummaryValue> {
        let i = self.columns.iter().position(|c| c == column)?;
        self.summaries[i].get(label)
    }
}

pub fn lookback_label(years: Option<u32>) -> String {
    match years {
        None => "All".to_string(),
        Some(n) => format!("{n}Y"),
    }
}

pub fn summary_table(
    nav: &NavSeries,
    lookbacks: &[Option<u32>],
    alpha: f64,
    periods: Option<f64>,
    r_f: f64,
) -> SummaryTable {
    let summaries = maybe_parallel_map(lookbacks, |years| {
        let window = match (years, nav.last_date()) {
            (Some(n), Some(last)) => {
                nav.truncate(last.checked_sub_months(Months::new(12 * n)), None)
            }
            _ => nav.clone(),
        };
        window.summary(alpha, periods, r_f)
    });
    SummaryTable {
        columns: lookbacks.iter().copied().map(lookback_label).collect(),
        summaries,
    }
}

/// Maps `f` over `items`, in parallel when the `parallel` feature is on.
pub fn maybe_parallel_map<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        if items.len() > 1 {
            return items.par_iter().map(f).collect();
        }
    }

    items.iter().map(f).collect()
}
