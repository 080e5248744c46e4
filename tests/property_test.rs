//! Property tests for the portfolio model.
//!
//! Covers:
//! - Nav built from returns reproduces the returns
//! - Projected weights and cash always sum to one
//! - Long-only weights summing to at most one keep leverage in [0, 1]
//! - Ironing with a zero threshold changes nothing
//! - Drawdowns are non-negative and start at zero

mod common;

use common::*;
use navport::domain::frame::Frame;
use navport::domain::nav::NavSeries;
use navport::domain::portfolio::{similar, Portfolio};
use navport::domain::series::TimeSeries;
use proptest::prelude::*;

/// Daily returns between -20% and +20%.
fn returns_strategy(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.2f64..0.2, len)
}

/// Rows of long-only weights for `width` assets whose sum stays at most one.
fn weight_rows(len: usize, width: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(0.0f64..1.0, width), len).prop_map(move |rows| {
        rows.into_iter()
            .map(|row| {
                let total: f64 = row.iter().sum();
                if total > 1.0 {
                    row.iter().map(|w| w / total).collect()
                } else {
                    row
                }
            })
            .collect()
    })
}

fn portfolio_from(returns: &[Vec<f64>], weights: Vec<Vec<f64>>) -> Portfolio {
    let index = daily_dates(date(2024, 1, 1), returns.len());
    let width = returns[0].len();
    let mut level = vec![100.0; width];
    let prices = returns
        .iter()
        .map(|row| {
            for (p, r) in level.iter_mut().zip(row) {
                *p *= 1.0 + r;
            }
            level.clone()
        })
        .collect();
    let columns: Vec<String> = (0..width).map(|j| format!("A{j}")).collect();
    let prices = Frame::new(index.clone(), columns.clone(), prices).unwrap();
    let weights = Frame::new(index, columns, weights).unwrap();
    Portfolio::new(prices, weights).unwrap()
}

proptest! {
    #[test]
    fn nav_returns_round_trip(returns in returns_strategy(30)) {
        let ts = TimeSeries::new(daily_dates(date(2024, 1, 1), returns.len()), returns.clone()).unwrap();
        let back = NavSeries::from_returns(&ts).unwrap().returns();
        for (r, expected) in back.values().iter().zip(&returns[1..]) {
            prop_assert!((r - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn forward_weights_plus_cash_is_one(
        returns in prop::collection::vec(returns_strategy(3), 10),
        weights in weight_rows(10, 3),
        t in 1usize..10,
    ) {
        let portfolio = portfolio_from(&returns, weights);
        let day = portfolio.index()[t];
        let moved = portfolio.forward(day, None).unwrap();

        let yesterday: f64 = moved.weights().row(t - 1).iter().sum();
        let today: f64 = moved.weights().row(t).iter().sum();
        prop_assert!(today >= 0.0);
        prop_assert!(today <= 1.0 + 1e-12);
        if yesterday == 0.0 {
            prop_assert_eq!(today, 0.0);
        }
        prop_assert!((today + moved.cash().values()[t] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn long_only_leverage_is_bounded(
        returns in prop::collection::vec(returns_strategy(4), 12),
        weights in weight_rows(12, 4),
    ) {
        let portfolio = portfolio_from(&returns, weights);
        for l in portfolio.leverage().values() {
            prop_assert!(*l >= 0.0 && *l <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn zero_threshold_ironing_is_identity(
        returns in prop::collection::vec(returns_strategy(2), 8),
        weights in weight_rows(8, 2),
    ) {
        let portfolio = portfolio_from(&returns, weights);
        prop_assert!(similar(&portfolio, &portfolio.iron_threshold(0.0), 1e-15));
    }

    #[test]
    fn drawdown_is_non_negative(
        returns in prop::collection::vec(returns_strategy(2), 15),
        weights in weight_rows(15, 2),
    ) {
        let nav = portfolio_from(&returns, weights).nav().unwrap();
        let drawdown = nav.drawdown();
        prop_assert_eq!(drawdown.values()[0], 0.0);
        prop_assert!(drawdown.values().iter().all(|d| *d >= 0.0));
        prop_assert!(nav.drawdown_periods(0.0).is_ok());
    }
}
