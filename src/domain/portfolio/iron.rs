//! Ironing: replace small or off-schedule rebalances by drift.

use std::collections::BTreeSet;

use super::{project, Portfolio};
use crate::domain::series::Frequency;

impl Portfolio {
    /// Forward-project every date (except the last) whose weights moved by
    /// at most `threshold` in every asset since the previous date. A
    /// non-positive threshold leaves the portfolio unchanged.
    pub fn iron_threshold(&self, threshold: f64) -> Portfolio {
        let mut portfolio = self.clone();
        if threshold <= 0.0 || self.len() < 3 {
            return portfolio;
        }

        let returns = self.asset_returns();
        let mut ironed = 0usize;
        for i in 1..self.len() - 1 {
            let today = portfolio.weights.row(i);
            let yesterday = portfolio.weights.row(i - 1);
            let change = today
                .iter()
                .zip(yesterday)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            if change <= threshold {
                let w = project(&portfolio.weights, &returns, i, i - 1);
                portfolio.weights.row_mut(i).copy_from_slice(&w);
                ironed += 1;
            }
        }
        tracing::debug!(threshold, ironed, "ironed portfolio by threshold");
        portfolio
    }

    /// Keep the literal weights only at the first date and at the last
    /// observation of every `freq` period; every other date except the
    /// last is forward-projected.
    pub fn iron_time(&self, freq: Frequency) -> Portfolio {
        let mut portfolio = self.clone();
        let index = self.index();
        let Some(first) = index.first() else {
            return portfolio;
        };

        let mut moments = BTreeSet::from([*first]);
        for (i, date) in index.iter().enumerate() {
            let end = freq.period_end(*date);
            let last_in_period = index
                .get(i + 1)
                .is_none_or(|next| freq.period_end(*next) != end);
            if last_in_period {
                moments.insert(*date);
            }
        }

        let returns = self.asset_returns();
        for i in 1..index.len().saturating_sub(1) {
            if !moments.contains(&index[i]) {
                let w = project(&portfolio.weights, &returns, i, i - 1);
                portfolio.weights.row_mut(i).copy_from_slice(&w);
            }
        }
        tracing::debug!(%freq, moments = moments.len(), "ironed portfolio by time");
        portfolio
    }
}
