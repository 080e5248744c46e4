//! Portfolio of weights over a price history.
//!
//! Prices are forward-filled on construction and the weight frame is laid
//! onto the sorted price columns, then resolved row by row:
//! - rows before the first row carrying any weight hold zero weight;
//! - rows with at least one defined weight read missing cells as zero;
//! - fully undefined rows after that are projected forward from the
//!   previous row, letting each position drift with its asset's return.
//!
//! Every derived series (returns, nav, leverage, positions) is computed on
//! demand. Apart from [`Portfolio::forward_in_place`] all operations return
//! new portfolios.

mod iron;
mod ops;
mod report;

pub use ops::{merge, similar, Axis};
pub use report::{AssetTable, TopFlop, Transaction};

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::EngineError;
use super::frame::Frame;
use super::nav::NavSeries;
use super::series::TimeSeries;
use super::summary::Summary;

/// Notional used to turn weights into traded amounts.
pub const FUND_SIZE: f64 = 1e6;

/// Smallest notional change counted as a trade.
pub const TRADE_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    prices: Frame,
    weights: Frame,
}

impl Portfolio {
    pub fn new(prices: Frame, weights: Frame) -> Result<Self, EngineError> {
        let missing: Vec<String> = weights
            .columns()
            .iter()
            .filter(|c| prices.column_position(c).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::WeightColumnsNotSubset { missing });
        }
        if prices.index() != weights.index() {
            return Err(EngineError::IndexMismatch);
        }
        check_gaps(&weights)?;
        check_prices(&prices)?;

        let mut assets = prices.columns().to_vec();
        assets.sort();
        let prices = prices.select_columns(&assets)?.ffill();
        let weights = resolve(&prices, &weights.reindex_columns(&assets));

        tracing::debug!(
            assets = assets.len(),
            dates = prices.len(),
            "portfolio constructed"
        );
        Ok(Self { prices, weights })
    }

    /// Prices with zero weight everywhere.
    pub fn from_prices(prices: Frame) -> Result<Self, EngineError> {
        let weights = Frame::filled(prices.index().to_vec(), prices.columns().to_vec(), 0.0)?;
        Self::new(prices, weights)
    }

    /// The same weight per asset on every date. Assets not named hold zero.
    pub fn with_constant_weights(
        prices: Frame,
        weights: &BTreeMap<String, f64>,
    ) -> Result<Self, EngineError> {
        let columns: Vec<String> = weights.keys().cloned().collect();
        let row: Vec<f64> = weights.values().copied().collect();
        let frame = Frame::new(
            prices.index().to_vec(),
            columns,
            vec![row; prices.len()],
        )?;
        Self::new(prices, frame)
    }

    /// Both frames are already aligned and resolved.
    pub(crate) fn from_resolved(prices: Frame, weights: Frame) -> Self {
        Self { prices, weights }
    }

    pub fn prices(&self) -> &Frame {
        &self.prices
    }

    pub fn weights(&self) -> &Frame {
        &self.weights
    }

    pub fn index(&self) -> &[NaiveDate] {
        self.prices.index()
    }

    /// Sorted asset names.
    pub fn assets(&self) -> &[String] {
        self.prices.columns()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn last_date(&self) -> Result<NaiveDate, EngineError> {
        self.index()
            .last()
            .copied()
            .ok_or(EngineError::EmptyPortfolio)
    }

    pub fn asset_returns(&self) -> Frame {
        self.prices.pct_change()
    }

    /// Previous row's weight times this row's asset return.
    pub fn weighted_returns(&self) -> Frame {
        let returns = self.asset_returns().fillna(0.0);
        let rows = (0..self.len())
            .map(|i| {
                returns
                    .row(i)
                    .iter()
                    .enumerate()
                    .map(|(j, r)| if i == 0 { 0.0 } else { r * self.weights.row(i - 1)[j] })
                    .collect()
            })
            .collect();
        returns.with_rows(rows)
    }

    pub fn leverage(&self) -> TimeSeries {
        self.weights.sum_rows()
    }

    pub fn cash(&self) -> TimeSeries {
        self.leverage().map(|l| 1.0 - l)
    }

    fn nav_levels(&self) -> TimeSeries {
        self.weighted_returns().sum_rows().cum_growth()
    }

    pub fn nav(&self) -> Result<NavSeries, EngineError> {
        NavSeries::from_nav(&self.nav_levels())
    }

    /// Units held per asset: weight × nav ÷ price.
    pub fn position(&self) -> Frame {
        let nav = self.nav_levels();
        let rows = (0..self.len())
            .map(|i| {
                self.weights
                    .row(i)
                    .iter()
                    .zip(self.prices.row(i))
                    .map(|(w, p)| w * nav.values()[i] / p)
                    .collect()
            })
            .collect();
        self.weights.with_rows(rows)
    }

    /// Weights on the last date.
    pub fn weight_current(&self) -> Result<BTreeMap<String, f64>, EngineError> {
        let today = self.last_date()?;
        self.weights
            .row_map(today)
            .ok_or(EngineError::UnknownTimestamp(today))
    }

    pub fn summary(&self, alpha: f64, periods: Option<f64>, r_f: f64) -> Result<Summary, EngineError> {
        Ok(self.nav()?.summary(alpha, periods, r_f))
    }

    /// Weights at `t` after drifting from `yesterday` with the returns at `t`.
    fn projected(&self, t: usize, yesterday: usize) -> Vec<f64> {
        project(&self.weights, &self.asset_returns(), t, yesterday)
    }

    fn locate(
        &self,
        t: NaiveDate,
        yesterday: Option<NaiveDate>,
    ) -> Result<(usize, usize), EngineError> {
        let i = self
            .prices
            .position(t)
            .ok_or(EngineError::UnknownTimestamp(t))?;
        let y = match yesterday {
            Some(y) => self
                .prices
                .position(y)
                .ok_or(EngineError::UnknownTimestamp(y))?,
            None => i.checked_sub(1).ok_or(EngineError::NoPriorTimestamp(t))?,
        };
        Ok((i, y))
    }

    /// New portfolio whose weights at `t` are projected from `yesterday`
    /// (default: the previous date).
    pub fn forward(&self, t: NaiveDate, yesterday: Option<NaiveDate>) -> Result<Portfolio, EngineError> {
        let mut portfolio = self.clone();
        portfolio.forward_in_place(t, yesterday)?;
        Ok(portfolio)
    }

    pub fn forward_in_place(
        &mut self,
        t: NaiveDate,
        yesterday: Option<NaiveDate>,
    ) -> Result<(), EngineError> {
        let (i, y) = self.locate(t, yesterday)?;
        let w = self.projected(i, y);
        self.weights.row_mut(i).copy_from_slice(&w);
        Ok(())
    }

    pub fn truncate(&self, before: Option<NaiveDate>, after: Option<NaiveDate>) -> Portfolio {
        Self::from_resolved(
            self.prices.truncate(before, after),
            self.weights.truncate(before, after),
        )
    }

    pub fn tail(&self, n: usize) -> Portfolio {
        Self::from_resolved(self.prices.tail(n), self.weights.tail(n))
    }

    pub fn subportfolio<S: AsRef<str>>(&self, assets: &[S]) -> Result<Portfolio, EngineError> {
        Self::new(
            self.prices.select_columns(assets)?,
            self.weights.select_columns(assets)?,
        )
    }

    /// Replace every weight row by `f(row)`.
    pub fn apply_rows<F>(&self, f: F) -> Result<Portfolio, EngineError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let rows = self
            .weights
            .rows()
            .iter()
            .map(|r| f(r))
            .collect();
        let weights = Frame::new(self.index().to_vec(), self.assets().to_vec(), rows)?;
        Self::new(self.prices.clone(), weights)
    }

    /// Replace every weight column by `f(column)`.
    pub fn apply_columns<F>(&self, f: F) -> Result<Portfolio, EngineError>
    where
        F: Fn(&TimeSeries) -> Vec<f64>,
    {
        let columns = self
            .assets()
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), f(&self.weights.column_at(j))))
            .collect();
        let weights = Frame::from_columns(self.index().to_vec(), columns)?;
        Self::new(self.prices.clone(), weights)
    }

    pub fn trading_days(&self) -> Vec<NaiveDate> {
        self.trading_days_with(FUND_SIZE, TRADE_THRESHOLD)
    }

    /// Dates where the notional held changes by more than `threshold` in total.
    pub fn trading_days_with(&self, notional: f64, threshold: f64) -> Vec<NaiveDate> {
        self.position()
            .map(|p| notional * p)
            .diff()
            .map(f64::abs)
            .sum_rows()
            .iter()
            .filter(|(_, traded)| *traded > threshold)
            .map(|(d, _)| d)
            .collect()
    }

    /// Σ|w_t − drift(w_{t-1})| per date; the first date counts its full weights.
    pub fn turnover(&self) -> TimeSeries {
        let returns = self.asset_returns();
        let values = (0..self.len())
            .map(|i| {
                let drift = if i == 0 {
                    vec![0.0; self.assets().len()]
                } else {
                    project(&self.weights, &returns, i, i - 1)
                };
                self.weights
                    .row(i)
                    .iter()
                    .zip(&drift)
                    .map(|(w, d)| (w - d).abs())
                    .sum()
            })
            .collect();
        TimeSeries::from_parts_unchecked(self.index().to_vec(), values)
    }

    /// Turnover charged at `bps` basis points.
    pub fn transaction_costs(&self, bps: f64) -> TimeSeries {
        self.turnover().map(|t| t * bps / 10_000.0)
    }

    /// Nav with transaction costs at `bps` deducted from each date's return.
    pub fn nav_net_of_costs(&self, bps: f64) -> Result<NavSeries, EngineError> {
        let costs = self.transaction_costs(bps);
        let net = self
            .weighted_returns()
            .sum_rows()
            .values()
            .iter()
            .zip(costs.values())
            .map(|(r, c)| r - c)
            .collect();
        let returns = TimeSeries::from_parts_unchecked(self.index().to_vec(), net);
        NavSeries::from_nav(&returns.cum_growth())
    }
}

/// Prices may be missing but never negative.
fn check_prices(prices: &Frame) -> Result<(), EngineError> {
    for (date, row) in prices.index().iter().zip(prices.rows()) {
        if let Some(value) = row.iter().copied().find(|v| *v < 0.0) {
            return Err(EngineError::NegativeValue { date: *date, value });
        }
    }
    Ok(())
}

/// Defined observations of each weight column must be contiguous across
/// rebalance rows (rows carrying at least one weight). Fully undefined rows
/// are drift rows and do not count.
fn check_gaps(weights: &Frame) -> Result<(), EngineError> {
    let rebalances: Vec<&Vec<f64>> = weights
        .rows()
        .iter()
        .filter(|r| r.iter().any(|v| !v.is_nan()))
        .collect();
    for (j, asset) in weights.columns().iter().enumerate() {
        let defined: Vec<usize> = rebalances
            .iter()
            .enumerate()
            .filter(|(_, r)| !r[j].is_nan())
            .map(|(i, _)| i)
            .collect();
        let gap = defined.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0);
        if gap > 1 {
            return Err(EngineError::WeightGap {
                asset: asset.clone(),
                gap,
            });
        }
    }
    Ok(())
}

/// value_i = w_i (1 + r_i), w'_i = value_i / (Σ value + cash)
fn project(weights: &Frame, returns: &Frame, t: usize, yesterday: usize) -> Vec<f64> {
    let w = weights.row(yesterday);
    let cash = 1.0 - w.iter().filter(|v| !v.is_nan()).sum::<f64>();
    let value: Vec<f64> = w
        .iter()
        .zip(returns.row(t))
        .map(|(w, r)| {
            let w = if w.is_nan() { 0.0 } else { *w };
            let r = if r.is_nan() { 0.0 } else { *r };
            w * (1.0 + r)
        })
        .collect();
    let total = value.iter().sum::<f64>() + cash;
    value.iter().map(|v| v / total).collect()
}

fn resolve(prices: &Frame, raw: &Frame) -> Frame {
    let returns = prices.pct_change();
    let first = (0..raw.len()).find(|&i| raw.row(i).iter().any(|v| !v.is_nan()));
    let mut weights = raw.clone();
    for i in 0..raw.len() {
        let undefined = raw.row(i).iter().all(|v| v.is_nan());
        match first {
            Some(first) if i > first && undefined => {
                let w = project(&weights, &returns, i, i - 1);
                weights.row_mut(i).copy_from_slice(&w);
            }
            _ => {
                for v in weights.row_mut(i) {
                    if v.is_nan() {
                        *v = 0.0;
                    }
                }
            }
        }
    }
    weights
}
