//! High-water mark, drawdown and drawdown periods.
//!
//! drawdown[t] = 1 - value[t] / max(value[..=t])
//! A period starts at the first date in drawdown (drawdown > eps) and ends
//! at the first date out of it. A period still open at the end is closed at
//! the last date.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use super::error::EngineError;
use super::series::TimeSeries;

#[derive(Debug, Clone)]
pub struct Drawdown<'a> {
    series: &'a TimeSeries,
    eps: f64,
}

impl<'a> Drawdown<'a> {
    pub fn new(series: &'a TimeSeries, eps: f64) -> Result<Self, EngineError> {
        if let Some((date, value)) = series.iter().find(|(_, v)| *v < 0.0) {
            return Err(EngineError::NegativeValue { date, value });
        }
        Ok(Self { series, eps })
    }

    /// For series already known to be non-negative.
    pub(crate) fn from_validated(series: &'a TimeSeries, eps: f64) -> Self {
        Self { series, eps }
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn price_series(&self) -> &TimeSeries {
        self.series
    }

    pub fn highwatermark(&self) -> TimeSeries {
        let mut peak = f64::NAN;
        self.series.map(|v| {
            peak = peak.max(v);
            peak
        })
    }

    pub fn drawdown(&self) -> TimeSeries {
        let mut peak = f64::NAN;
        self.series.map(|v| {
            peak = peak.max(v);
            1.0 - v / peak
        })
    }

    pub fn periods(&self) -> Result<BTreeMap<NaiveDate, Duration>, EngineError> {
        let drawdown = self.drawdown();
        let Some((_, first)) = drawdown.first() else {
            return Ok(BTreeMap::new());
        };
        if first != 0.0 {
            return Err(EngineError::DrawdownBaseline(first));
        }

        let mut periods = BTreeMap::new();
        let mut open: Option<NaiveDate> = None;
        for (date, dd) in drawdown.iter().skip(1) {
            let is_down = dd > self.eps;
            match (open, is_down) {
                (None, true) => open = Some(date),
                (Some(start), false) => {
                    periods.insert(start, date - start);
                    open = None;
                }
                _ => {}
            }
        }
        if let (Some(start), Some((last, _))) = (open, drawdown.last()) {
            periods.insert(start, last - start);
        }
        Ok(periods)
    }
}

/// Drawdown of a price or nav series.
pub fn drawdown(series: &TimeSeries) -> Result<TimeSeries, EngineError> {
    Ok(Drawdown::new(series, 0.0)?.drawdown())
}

/// Start date → length of every drawdown period.
pub fn drawdown_periods(
    series: &TimeSeries,
    eps: f64,
) -> Result<BTreeMap<NaiveDate, Duration>, EngineError> {
    Drawdown::new(series, eps)?.periods()
}
