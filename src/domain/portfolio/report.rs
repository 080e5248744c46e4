//! Tabular views of a portfolio: sectors, snapshot, state, top/flop and
//! the transaction list.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::{project, Portfolio, FUND_SIZE, TRADE_THRESHOLD};
use crate::domain::error::EngineError;
use crate::domain::frame::Frame;
use crate::domain::periods::{period_return, Period};

/// Label of a date column in snapshot and state tables, e.g. `05-Mar-24`.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%d-%b-%y").to_string()
}

/// One row per asset, one column per measure.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTable {
    pub index_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<f64>)>,
}

impl AssetTable {
    pub fn get(&self, asset: &str, column: &str) -> Option<f64> {
        let j = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, values)| values[j])
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(a, _)| a.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopFlop {
    /// Best first.
    pub top: Vec<(String, f64)>,
    /// Worst first.
    pub flop: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub asset: String,
    /// Weight held after the trade.
    pub weight: f64,
    /// Weight the position would have drifted to without trading.
    pub drift: f64,
}

impl Transaction {
    pub fn traded(&self) -> f64 {
        self.weight - self.drift
    }
}

impl Portfolio {
    /// Weights summed per sector (`asset → sector`), with an optional
    /// `Total` column. Assets without a sector are left out.
    pub fn sector_weights(
        &self,
        sectors: &BTreeMap<String, String>,
        total: bool,
    ) -> Result<Frame, EngineError> {
        let frame = self.weights.ffill().group_columns(sectors);
        if !total {
            return Ok(frame);
        }
        let sums = frame.sum_rows();
        frame.with_column("Total", sums.values())
    }

    /// Sector weights on the last date.
    pub fn sector_weights_final(
        &self,
        sectors: &BTreeMap<String, String>,
        total: bool,
    ) -> Result<BTreeMap<String, f64>, EngineError> {
        let today = self.last_date()?;
        self.sector_weights(sectors, total)?
            .row_map(today)
            .ok_or(EngineError::UnknownTimestamp(today))
    }

    /// Per asset period return of its weighted returns as of `today`.
    fn attribution(&self, period: Period, today: NaiveDate) -> Vec<(String, f64)> {
        let boundary = period.boundary(today);
        let weighted = self.weighted_returns();
        self.assets()
            .iter()
            .enumerate()
            .map(|(j, asset)| {
                (
                    asset.clone(),
                    period_return(&weighted.column_at(j), boundary, today),
                )
            })
            .collect()
    }

    /// MTD and YTD contribution per asset plus the weights on the last
    /// `n` trading days.
    pub fn snapshot(&self, n: usize) -> Result<AssetTable, EngineError> {
        self.snapshot_with(n, FUND_SIZE, TRADE_THRESHOLD)
    }

    /// [`Portfolio::snapshot`] with trading days detected at `notional`
    /// and `threshold`.
    pub fn snapshot_with(
        &self,
        n: usize,
        notional: f64,
        threshold: f64,
    ) -> Result<AssetTable, EngineError> {
        let today = self.last_date()?;
        let mtd = self.attribution(Period::MonthToDate, today);
        let ytd = self.attribution(Period::YearToDate, today);

        let days = self.trading_days_with(notional, threshold);
        let days = &days[days.len().saturating_sub(n)..];
        let weights = self.weights.select_dates(days)?;

        let mut columns = vec![
            Period::MonthToDate.label().to_string(),
            Period::YearToDate.label().to_string(),
        ];
        columns.extend(days.iter().copied().map(date_label));

        let rows = self
            .assets()
            .iter()
            .enumerate()
            .map(|(j, asset)| {
                let mut values = vec![mtd[j].1, ytd[j].1];
                values.extend(weights.rows().iter().map(|r| r[j]));
                (asset.clone(), values)
            })
            .collect();

        Ok(AssetTable {
            index_name: "Asset".to_string(),
            columns,
            rows,
        })
    }

    pub fn top_flop_mtd(&self, n: usize, as_of: NaiveDate) -> TopFlop {
        self.top_flop(n, as_of, Period::MonthToDate)
    }

    pub fn top_flop_ytd(&self, n: usize, as_of: NaiveDate) -> TopFlop {
        self.top_flop(n, as_of, Period::YearToDate)
    }

    /// Best and worst `n` assets by period contribution; missing returns
    /// are left out.
    pub fn top_flop(&self, n: usize, as_of: NaiveDate, period: Period) -> TopFlop {
        let mut ranked: Vec<(String, f64)> = self
            .attribution(period, as_of)
            .into_iter()
            .filter(|(_, r)| !r.is_nan())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let top = ranked.iter().take(n).cloned().collect();
        let flop = ranked.iter().rev().take(n).cloned().collect();
        TopFlop { top, flop }
    }

    /// Weights on the last trading days before today and today, next to
    /// today's weights extrapolated from yesterday and the gap between the
    /// two. With a single date the extrapolation is today's weights.
    pub fn state(&self) -> Result<AssetTable, EngineError> {
        self.state_with(FUND_SIZE, TRADE_THRESHOLD)
    }

    /// [`Portfolio::state`] with trading days detected at `notional` and
    /// `threshold`.
    pub fn state_with(&self, notional: f64, threshold: f64) -> Result<AssetTable, EngineError> {
        let today = self.last_date()?;
        let trading = self.trading_days_with(notional, threshold);
        let mut events: Vec<NaiveDate> = if trading.is_empty() {
            Vec::new()
        } else {
            let end = trading.len() - 1;
            trading[end.saturating_sub(4)..end].to_vec()
        };
        if !events.contains(&today) {
            events.push(today);
        }

        let weights = self.weights.select_dates(&events)?;
        let i = self.len() - 1;
        // a single date has nothing to drift from
        let extrapolated = if i == 0 {
            self.weights.row(i).to_vec()
        } else {
            project(&self.weights, &self.asset_returns(), i, i - 1)
        };

        let mut columns: Vec<String> = events.iter().copied().map(date_label).collect();
        columns.push("Extrapolated".to_string());
        columns.push("Gap".to_string());

        let rows = self
            .assets()
            .iter()
            .enumerate()
            .map(|(j, asset)| {
                let mut values: Vec<f64> = weights.rows().iter().map(|r| r[j]).collect();
                let projected = extrapolated[j];
                values.push(projected);
                values.push(self.weights.row(i)[j] - projected);
                (asset.clone(), values)
            })
            .collect();

        Ok(AssetTable {
            index_name: "Symbol".to_string(),
            columns,
            rows,
        })
    }

    /// Every asset whose weight moved away from its drift on a trading day.
    pub fn transaction_report(&self, notional: f64, threshold: f64) -> Vec<Transaction> {
        let returns = self.asset_returns();
        let mut transactions = Vec::new();
        for date in self.trading_days_with(notional, threshold) {
            let Some(i) = self.prices.position(date).filter(|i| *i > 0) else {
                continue;
            };
            let drift = project(&self.weights, &returns, i, i - 1);
            for ((asset, weight), drift) in self
                .assets()
                .iter()
                .zip(self.weights.row(i))
                .zip(drift)
            {
                if ((weight - drift) * notional).abs() > threshold {
                    transactions.push(Transaction {
                        date,
                        asset: asset.clone(),
                        weight: *weight,
                        drift,
                    });
                }
            }
        }
        tracing::debug!(count = transactions.len(), "transactions extracted");
        transactions
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transaction_report(FUND_SIZE, TRADE_THRESHOLD)
    }
}
