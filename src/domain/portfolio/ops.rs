//! Portfolio algebra: scaling, merging and comparison.

use std::ops::Mul;

use super::Portfolio;
use crate::domain::error::EngineError;
use crate::domain::frame::Frame;

/// Direction in which [`merge`] stacks portfolios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Append dates; assets are the union.
    Time,
    /// Place assets side by side; dates are the union.
    Assets,
}

impl Portfolio {
    /// Weights multiplied by `k`; prices unchanged.
    pub fn scale(&self, k: f64) -> Portfolio {
        Portfolio::from_resolved(self.prices.clone(), self.weights.map(|w| k * w))
    }
}

impl Mul<f64> for &Portfolio {
    type Output = Portfolio;

    fn mul(self, k: f64) -> Portfolio {
        self.scale(k)
    }
}

impl Mul<&Portfolio> for f64 {
    type Output = Portfolio;

    fn mul(self, p: &Portfolio) -> Portfolio {
        p.scale(self)
    }
}

/// Concatenate portfolios. Overlapping dates (along [`Axis::Time`]) or
/// assets (along [`Axis::Assets`]) fail; weights missing after the
/// concatenation are zero.
pub fn merge(portfolios: &[Portfolio], axis: Axis) -> Result<Portfolio, EngineError> {
    let prices: Vec<Frame> = portfolios.iter().map(|p| p.prices.clone()).collect();
    let weights: Vec<Frame> = portfolios.iter().map(|p| p.weights.clone()).collect();
    let (prices, weights) = match axis {
        Axis::Time => (Frame::concat_rows(&prices)?, Frame::concat_rows(&weights)?),
        Axis::Assets => (
            Frame::concat_columns(&prices)?,
            Frame::concat_columns(&weights)?,
        ),
    };
    Portfolio::new(prices, weights.fillna(0.0))
}

/// Same dates, same assets, and weights and prices within `eps`.
pub fn similar(a: &Portfolio, b: &Portfolio, eps: f64) -> bool {
    a.index() == b.index()
        && a.assets() == b.assets()
        && a.weights.max_abs_diff(&b.weights) < eps
        && a.prices.max_abs_diff(&b.prices) < eps
}
