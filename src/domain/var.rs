//! Historical Value-at-Risk and Conditional Value-at-Risk.
//!
//! Losses are negated simple returns. VaR is the empirical alpha-quantile of
//! the losses (next-higher order statistic), CVaR the mean of the losses at
//! or beyond it. Both are positive fractions for losing tails.

use super::series::TimeSeries;

#[derive(Debug, Clone)]
pub struct ValueAtRisk {
    losses: Vec<f64>,
    alpha: f64,
}

impl ValueAtRisk {
    /// `returns` are simple period returns; missing values are ignored.
    pub fn new(returns: &TimeSeries, alpha: f64) -> Self {
        let mut losses: Vec<f64> = returns
            .values()
            .iter()
            .filter(|r| !r.is_nan())
            .map(|r| -r)
            .collect();
        losses.sort_by(f64::total_cmp);
        Self { losses, alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn var(&self) -> f64 {
        if self.losses.is_empty() {
            return f64::NAN;
        }
        let position = self.alpha.clamp(0.0, 1.0) * (self.losses.len() - 1) as f64;
        self.losses[position.ceil() as usize]
    }

    pub fn cvar(&self) -> f64 {
        let var = self.var();
        if var.is_nan() {
            return f64::NAN;
        }
        let tail: Vec<f64> = self.losses.iter().copied().filter(|l| *l >= var).collect();
        tail.iter().sum::<f64>() / tail.len() as f64
    }
}
