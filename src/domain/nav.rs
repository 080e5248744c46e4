//! NAV series and the return/risk analytics derived from it.

use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;

use super::drawdown::Drawdown;
use super::error::EngineError;
use super::monthly::MonthlyTable;
use super::periods::PeriodReturns;
use super::series::{Frequency, TimeSeries, month_end};
use super::var::ValueAtRisk;

/// Annualization factor used when the series is too short to infer one.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 256.0;

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;

/// A non-negative, strictly increasing level series (NAV or price).
///
/// Missing observations are dropped on construction. The first observation
/// is the drawdown baseline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavSeries {
    series: TimeSeries,
}

impl NavSeries {
    /// Wrap an existing level series.
    pub fn from_nav(ts: &TimeSeries) -> Result<Self, EngineError> {
        let series = ts.dropna();
        if let Some((date, value)) = series.iter().find(|(_, v)| *v < 0.0) {
            return Err(EngineError::NegativeValue { date, value });
        }
        Ok(Self { series })
    }

    /// Compound simple returns into a level series starting at `1 + r[0]`.
    pub fn from_returns(returns: &TimeSeries) -> Result<Self, EngineError> {
        Self::from_nav(&returns.dropna().cum_growth())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.series.index()
    }

    pub fn values(&self) -> &[f64] {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.series.first().map(|(d, _)| d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.series.last().map(|(d, _)| d)
    }

    /// Latest value, `NaN` when empty.
    pub fn current(&self) -> f64 {
        self.series.last().map_or(f64::NAN, |(_, v)| v)
    }

    pub fn max(&self) -> f64 {
        self.series.max()
    }

    /// Observations per year inferred from the mean spacing of the index.
    pub fn periods_per_year(&self) -> f64 {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return DEFAULT_PERIODS_PER_YEAR;
        };
        if self.len() < 2 {
            return DEFAULT_PERIODS_PER_YEAR;
        }
        let mean_seconds = (last - first).num_seconds() as f64 / (self.len() - 1) as f64;
        (SECONDS_PER_YEAR / mean_seconds).round()
    }

    fn periods_or_inferred(&self, periods: Option<f64>) -> f64 {
        periods.unwrap_or_else(|| self.periods_per_year())
    }

    /// Simple returns; the first observation has none.
    pub fn returns(&self) -> TimeSeries {
        self.series.pct_change().tail(self.len().saturating_sub(1))
    }

    pub fn returns_monthly(&self) -> TimeSeries {
        self.monthly().returns()
    }

    /// Calendar-year returns keyed by year.
    pub fn returns_annual(&self) -> BTreeMap<i32, f64> {
        self.annual()
            .returns()
            .iter()
            .map(|(d, r)| (d.year(), r))
            .collect()
    }

    pub fn annualized_volatility(&self, periods: Option<f64>) -> f64 {
        self.periods_or_inferred(periods).sqrt() * self.returns().std()
    }

    /// exp(mean(ln(a)))
    fn gmean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        (values.iter().map(|v| v.ln()).sum::<f64>() / values.len() as f64).exp()
    }

    /// Annualized geometric-mean return in excess of `r_f`.
    fn mean_r(&self, periods: f64, r_f: f64) -> f64 {
        let growth: Vec<f64> = self.returns().values().iter().map(|r| 1.0 + r).collect();
        periods * (Self::gmean(&growth) - 1.0) - r_f
    }

    pub fn annualized_return(&self, periods: Option<f64>) -> f64 {
        self.mean_r(self.periods_or_inferred(periods), 0.0)
    }

    pub fn sharpe_ratio(&self, periods: Option<f64>, r_f: f64) -> f64 {
        let periods = self.periods_or_inferred(periods);
        self.mean_r(periods, r_f) / self.annualized_volatility(Some(periods))
    }

    pub fn drawdown(&self) -> TimeSeries {
        Drawdown::from_validated(&self.series, 0.0).drawdown()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.drawdown().max()
    }

    pub fn drawdown_periods(
        &self,
        eps: f64,
    ) -> Result<BTreeMap<NaiveDate, chrono::Duration>, EngineError> {
        Drawdown::from_validated(&self.series, eps).periods()
    }

    /// Excess return over max drawdown; `+inf` when there was no drawdown.
    pub fn sortino_ratio(&self, periods: Option<f64>, r_f: f64) -> f64 {
        let periods = self.periods_or_inferred(periods);
        let m = self.max_drawdown();
        if m == 0.0 {
            return f64::INFINITY;
        }
        self.mean_r(periods, r_f) / m
    }

    /// Sortino ratio of the trailing three years.
    pub fn calmar_ratio(&self, periods: Option<f64>, r_f: f64) -> f64 {
        let periods = self.periods_or_inferred(periods);
        let Some(last) = self.last_date() else {
            return f64::NAN;
        };
        let start = last.checked_sub_months(Months::new(36));
        self.truncate(start, None).sortino_ratio(Some(periods), r_f)
    }

    fn last_return(levels: &NavSeries) -> f64 {
        levels.returns().last().map_or(f64::NAN, |(_, r)| r)
    }

    /// Return of the last (possibly partial) month.
    pub fn mtd(&self) -> f64 {
        Self::last_return(&self.monthly())
    }

    /// Return of the last (possibly partial) year.
    pub fn ytd(&self) -> f64 {
        Self::last_return(&self.annual())
    }

    /// Monthly returns of the current year, newest first, labelled `MM`.
    pub fn ytd_series(&self) -> Vec<(String, f64)> {
        let Some(today) = self.last_date() else {
            return Vec::new();
        };
        let first_day = NaiveDate::from_ymd_opt(today.year(), 1, 1);
        let last_day = month_end(today.year(), today.month());
        let mut months: Vec<(String, f64)> = self
            .returns_monthly()
            .truncate(first_day, Some(last_day))
            .iter()
            .map(|(d, r)| (format!("{:02}", d.month()), r))
            .collect();
        months.reverse();
        months
    }

    pub fn recent(&self, n: usize) -> TimeSeries {
        self.returns().tail(n).dropna()
    }

    pub fn var(&self, alpha: f64) -> f64 {
        ValueAtRisk::new(&self.returns(), alpha).var()
    }

    pub fn cvar(&self, alpha: f64) -> f64 {
        ValueAtRisk::new(&self.returns(), alpha).cvar()
    }

    /// Exponentially weighted, bias-corrected volatility of the returns,
    /// annualized. `com` is the center of mass of the decay.
    pub fn ewm_volatility(&self, com: f64, min_periods: usize, periods: Option<f64>) -> TimeSeries {
        let scale = self.periods_or_inferred(periods).sqrt();
        let decay = 1.0 - 1.0 / (1.0 + com);
        let (mut s0, mut s1, mut s2, mut q) = (0.0, 0.0, 0.0, 0.0);
        let mut count = 0usize;
        self.returns().map(|r| {
            let r = if r.is_nan() { 0.0 } else { r };
            s0 = decay * s0 + 1.0;
            s1 = decay * s1 + r;
            s2 = decay * s2 + r * r;
            q = decay * decay * q + 1.0;
            count += 1;
            if count < min_periods.max(2) {
                return f64::NAN;
            }
            let mean = s1 / s0;
            let biased = (s2 / s0 - mean * mean).max(0.0);
            let correction = s0 * s0 / (s0 * s0 - q);
            scale * (biased * correction).sqrt()
        })
    }

    pub fn period_returns(&self) -> PeriodReturns {
        match self.last_date() {
            Some(today) => PeriodReturns::compute(&self.returns(), today),
            None => PeriodReturns {
                today: NaiveDate::MIN,
                values: Vec::new(),
            },
        }
    }

    pub fn monthly_table(&self) -> MonthlyTable {
        MonthlyTable::from_returns(&self.returns_monthly())
    }

    /// Rescale so the first observation equals `value`.
    pub fn adjust(&self, value: f64) -> NavSeries {
        match self.series.first() {
            Some((_, first)) => NavSeries {
                series: self.series.map(|v| v * value / first),
            },
            None => NavSeries::empty(),
        }
    }

    pub fn truncate(&self, before: Option<NaiveDate>, after: Option<NaiveDate>) -> NavSeries {
        NavSeries {
            series: self.series.truncate(before, after),
        }
    }

    /// Charge a constant fee per observation, in basis points.
    pub fn fee(&self, daily_fee_basis_pts: f64) -> Result<NavSeries, EngineError> {
        let charge = daily_fee_basis_pts / 10_000.0;
        let returns = self
            .series
            .pct_change()
            .map(|r| (if r.is_nan() { 0.0 } else { r }) - charge);
        NavSeries::from_returns(&returns)
    }

    pub fn monthly(&self) -> NavSeries {
        self.resample(Frequency::Monthly)
    }

    pub fn annual(&self) -> NavSeries {
        self.resample(Frequency::Annual)
    }

    pub fn weekly(&self) -> NavSeries {
        self.resample(Frequency::Weekly)
    }

    /// Period-end values preceded by the very first observation, with the
    /// final period stamped at the true last date.
    fn resample(&self, freq: Frequency) -> NavSeries {
        let (Some(first), Some((last_date, _))) = (self.series.first(), self.series.last()) else {
            return NavSeries::empty();
        };
        let ends = self.series.resample_last(freq);
        let mut pairs: Vec<(NaiveDate, f64)> = Vec::with_capacity(ends.len() + 1);
        pairs.push(first);
        let n = ends.len();
        for (i, (date, value)) in ends.iter().enumerate() {
            let date = if i + 1 == n { last_date } else { date };
            match pairs.last_mut() {
                Some(prev) if prev.0 == date => *prev = (date, value),
                _ => pairs.push((date, value)),
            }
        }
        let (index, values) = pairs.into_iter().unzip();
        NavSeries {
            series: TimeSeries::from_parts_unchecked(index, values),
        }
    }
}
