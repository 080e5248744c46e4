//! Integration tests for navport.
//!
//! Covers:
//! - Portfolio loading through the data port
//! - Nav, leverage and cash invariants
//! - Forward projection and ironing
//! - Merging portfolios
//! - Drawdown analysis
//! - Summary tables over lookback windows
//! - Snapshot, state and sector reports

mod common;

use approx::assert_relative_eq;
use common::*;
use navport::cli::load_portfolio;
use navport::domain::error::EngineError;
use navport::domain::frame::Frame;
use navport::domain::nav::NavSeries;
use navport::domain::portfolio::{merge, similar, Axis, Portfolio};
use navport::domain::series::{Frequency, TimeSeries};
use navport::domain::summary::{summary_table, SummaryValue};
use std::collections::BTreeMap;

mod loading {
    use super::*;

    #[test]
    fn sparse_weights_are_aligned_onto_price_dates() {
        let prices = growth_prices(date(2024, 1, 1), 5, &[("A", 0.01), ("B", -0.01)]);
        let weights = frame(
            vec![date(2024, 1, 1), date(2024, 1, 4)],
            &["A", "B"],
            vec![vec![0.5, 0.5], vec![0.3, 0.3]],
        );
        let port = MockDataPort::new(prices).with_weights(weights);
        let portfolio = load_portfolio(&port).unwrap();

        assert_eq!(portfolio.len(), 5);
        assert_eq!(portfolio.weights().value(date(2024, 1, 4), "A"), Some(0.3));
        let projected = portfolio.weights().row(1);
        assert!(projected[0] > 0.5);
        assert!(projected[1] < 0.5);
    }

    #[test]
    fn no_weights_gives_cash_portfolio() {
        let prices = growth_prices(date(2024, 1, 1), 3, &[("A", 0.02)]);
        let portfolio = load_portfolio(&MockDataPort::new(prices)).unwrap();
        assert!(portfolio.leverage().values().iter().all(|l| *l == 0.0));
        assert!(portfolio.nav().unwrap().values().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn weights_on_unknown_date_fail() {
        let prices = growth_prices(date(2024, 1, 1), 3, &[("A", 0.02)]);
        let weights = frame(vec![date(2024, 2, 1)], &["A"], vec![vec![1.0]]);
        let port = MockDataPort::new(prices).with_weights(weights);
        assert!(matches!(
            load_portfolio(&port),
            Err(EngineError::Data { .. })
        ));
    }

    #[test]
    fn unknown_weight_asset_fails() {
        let prices = growth_prices(date(2024, 1, 1), 3, &[("A", 0.02)]);
        let weights = frame(vec![date(2024, 1, 1)], &["Z"], vec![vec![1.0]]);
        let port = MockDataPort::new(prices).with_weights(weights);
        assert!(matches!(
            load_portfolio(&port),
            Err(EngineError::WeightColumnsNotSubset { missing }) if missing == vec!["Z".to_string()]
        ));
    }

    #[test]
    fn data_port_errors_propagate() {
        let prices = growth_prices(date(2024, 1, 1), 3, &[("A", 0.02)]);
        let port = MockDataPort::new(prices).failing();
        assert!(matches!(
            load_portfolio(&port),
            Err(EngineError::Data { .. })
        ));
    }
}

mod nav_invariants {
    use super::*;

    #[test]
    fn fully_invested_in_ten_percent_asset() {
        let (prices, weights) = ten_percent_portfolio();
        let portfolio = Portfolio::new(prices, weights).unwrap();
        let nav = portfolio.nav().unwrap();
        assert_relative_eq!(nav.values()[0], 1.0);
        assert_relative_eq!(nav.values()[1], 1.1, epsilon = 1e-12);
        assert_relative_eq!(nav.current(), 1.21, epsilon = 1e-12);
        assert_relative_eq!(portfolio.cash().values()[2], 0.0);
    }

    #[test]
    fn drawdown_starts_at_zero() {
        let prices = growth_prices(date(2024, 1, 1), 30, &[("A", -0.01)]);
        let weights = Frame::filled(prices.index().to_vec(), vec!["A".into()], 0.8).unwrap();
        let nav = Portfolio::new(prices, weights).unwrap().nav().unwrap();
        let drawdown = nav.drawdown();
        assert_eq!(drawdown.values()[0], 0.0);
        assert!(drawdown.values().iter().all(|d| *d >= 0.0));
        assert!(nav.max_drawdown() > 0.0);
    }

    #[test]
    fn nav_from_returns_recovers_returns() {
        let returns = TimeSeries::new(
            daily_dates(date(2024, 1, 1), 4),
            vec![0.0, 0.05, -0.02, 0.01],
        )
        .unwrap();
        let nav = NavSeries::from_returns(&returns).unwrap();
        let back = nav.returns();
        assert_relative_eq!(back.get(date(2024, 1, 2)).unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(back.get(date(2024, 1, 3)).unwrap(), -0.02, epsilon = 1e-12);
        assert_relative_eq!(back.get(date(2024, 1, 4)).unwrap(), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn leverage_and_cash_sum_to_one() {
        let prices = growth_prices(date(2024, 1, 1), 10, &[("A", 0.01), ("B", 0.03)]);
        let weights = BTreeMap::from([("A".to_string(), 0.3), ("B".to_string(), 0.4)]);
        let portfolio = Portfolio::with_constant_weights(prices, &weights).unwrap();
        for (l, c) in portfolio
            .leverage()
            .values()
            .iter()
            .zip(portfolio.cash().values())
        {
            assert_relative_eq!(l + c, 1.0, epsilon = 1e-12);
            assert!((0.0..=1.0).contains(l));
        }
    }

    #[test]
    fn net_of_costs_is_below_gross() {
        let prices = growth_prices(date(2024, 1, 1), 5, &[("A", 0.01), ("B", 0.0)]);
        let weights = frame(
            prices.index().to_vec(),
            &["A", "B"],
            vec![
                vec![0.5, 0.5],
                vec![0.2, 0.8],
                vec![0.6, 0.4],
                vec![0.1, 0.9],
                vec![0.5, 0.5],
            ],
        );
        let portfolio = Portfolio::new(prices, weights).unwrap();
        let gross = portfolio.nav().unwrap();
        let net = portfolio.nav_net_of_costs(25.0).unwrap();
        assert!(net.current() < gross.current());
        assert_eq!(net.len(), gross.len());
    }
}

mod projection {
    use super::*;

    fn drifting() -> Portfolio {
        let prices = growth_prices(date(2024, 3, 1), 4, &[("A", 0.05), ("B", -0.02)]);
        let weights = frame(
            prices.index().to_vec(),
            &["A", "B"],
            vec![
                vec![0.4, 0.4],
                vec![0.4, 0.4],
                vec![0.4, 0.4],
                vec![0.4, 0.4],
            ],
        );
        Portfolio::new(prices, weights).unwrap()
    }

    #[test]
    fn forward_keeps_weights_plus_cash_at_one() {
        let portfolio = drifting();
        let moved = portfolio.forward(date(2024, 3, 3), None).unwrap();
        let row = moved.weights().row(2);
        let invested: f64 = row.iter().sum();
        let cash = moved.cash().values()[2];
        assert_relative_eq!(invested + cash, 1.0, epsilon = 1e-12);
        assert!(row[0] > 0.4);
        assert!(row[1] < 0.4);
        assert_eq!(portfolio.weights().row(2), &[0.4, 0.4]);
    }

    #[test]
    fn forward_on_first_date_fails() {
        let portfolio = drifting();
        assert!(matches!(
            portfolio.forward(date(2024, 3, 1), None),
            Err(EngineError::NoPriorTimestamp(_))
        ));
        assert!(matches!(
            portfolio.forward(date(2025, 1, 1), None),
            Err(EngineError::UnknownTimestamp(_))
        ));
    }

    #[test]
    fn ironing_with_zero_threshold_is_identity() {
        let portfolio = drifting();
        let ironed = portfolio.iron_threshold(0.0);
        assert!(similar(&portfolio, &ironed, 1e-12));
    }

    #[test]
    fn ironing_with_large_threshold_removes_rebalances() {
        let portfolio = drifting();
        let ironed = portfolio.iron_threshold(1.0);
        assert!(ironed.trading_days().len() <= portfolio.trading_days().len());
        assert_eq!(ironed.weights().row(0), portfolio.weights().row(0));
        assert_eq!(ironed.weights().row(3), portfolio.weights().row(3));
        let drifted = ironed.weights().row(1);
        assert!(drifted[0] > 0.4);
    }

    #[test]
    fn time_ironing_keeps_period_ends() {
        let prices = growth_prices(date(2024, 1, 25), 14, &[("A", 0.01), ("B", 0.02)]);
        let weights = Frame::filled(
            prices.index().to_vec(),
            vec!["A".into(), "B".into()],
            0.5,
        )
        .unwrap();
        let portfolio = Portfolio::new(prices, weights).unwrap();
        let ironed = portfolio.iron_time(Frequency::Monthly);

        for kept in [date(2024, 1, 25), date(2024, 1, 31), date(2024, 2, 7)] {
            let i = portfolio.weights().position(kept).unwrap();
            assert_eq!(ironed.weights().row(i), portfolio.weights().row(i));
        }
        let i = portfolio.weights().position(date(2024, 2, 3)).unwrap();
        assert!(ironed.weights().row(i)[1] > 0.5);
    }
}

mod merging {
    use super::*;
    use chrono::NaiveDate;

    fn single(start: NaiveDate, asset: &str) -> Portfolio {
        let prices = growth_prices(start, 3, &[(asset, 0.01)]);
        let weights = Frame::filled(prices.index().to_vec(), vec![asset.into()], 0.5).unwrap();
        Portfolio::new(prices, weights).unwrap()
    }

    #[test]
    fn merging_a_portfolio_with_itself_fails() {
        let p = single(date(2024, 1, 1), "A");
        assert!(matches!(
            merge(&[p.clone(), p], Axis::Time),
            Err(EngineError::DuplicateIndex(_))
        ));
    }

    #[test]
    fn merge_along_time_concatenates() {
        let a = single(date(2024, 1, 1), "A");
        let b = single(date(2024, 1, 4), "A");
        let merged = merge(&[a, b], Axis::Time).unwrap();
        assert_eq!(merged.len(), 6);
        assert_eq!(merged.weights().value(date(2024, 1, 6), "A"), Some(0.5));
    }

    #[test]
    fn merge_along_assets_fills_zero() {
        let a = single(date(2024, 1, 1), "A");
        let b = single(date(2024, 1, 1), "B");
        let merged = merge(&[a, b], Axis::Assets).unwrap();
        assert_eq!(merged.assets(), &["A".to_string(), "B".to_string()]);
        assert_relative_eq!(merged.leverage().values()[0], 1.0);
    }

    #[test]
    fn scaling_halves_leverage() {
        let p = single(date(2024, 1, 1), "A");
        let half = 0.5 * &p;
        assert_relative_eq!(half.leverage().values()[0], 0.25);
        assert!(similar(&(&half * 2.0), &p, 1e-12));
    }
}

mod drawdowns {
    use super::*;

    #[test]
    fn periods_cover_each_dip_until_recovery() {
        let index = daily_dates(date(2024, 1, 1), 7);
        let levels = vec![1.0, 0.9, 0.95, 1.05, 1.0, 1.1, 1.1];
        let nav = NavSeries::from_nav(&TimeSeries::new(index, levels).unwrap()).unwrap();
        let periods = nav.drawdown_periods(0.0).unwrap();

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[&date(2024, 1, 2)].num_days(), 2);
        assert_eq!(periods[&date(2024, 1, 5)].num_days(), 1);
    }

    #[test]
    fn single_dip_recovering_at_the_end() {
        let index = daily_dates(date(2024, 1, 1), 4);
        let nav = NavSeries::from_nav(&TimeSeries::new(index, vec![1.0, 0.9, 0.95, 1.0]).unwrap())
            .unwrap();
        let periods = nav.drawdown_periods(0.0).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[&date(2024, 1, 2)].num_days(), 2);
    }

    #[test]
    fn flat_nav_has_no_periods() {
        let index = daily_dates(date(2024, 1, 1), 4);
        let nav = NavSeries::from_nav(&TimeSeries::new(index, vec![1.0; 4]).unwrap()).unwrap();
        assert!(nav.drawdown_periods(0.0).unwrap().is_empty());
        assert_eq!(nav.max_drawdown(), 0.0);
    }
}

mod summaries {
    use super::*;

    fn long_nav() -> NavSeries {
        let prices = growth_prices(date(2020, 1, 1), 1500, &[("A", 0.0005)]);
        let weights = Frame::filled(prices.index().to_vec(), vec!["A".into()], 1.0).unwrap();
        Portfolio::new(prices, weights).unwrap().nav().unwrap()
    }

    #[test]
    fn table_has_one_column_per_lookback() {
        let nav = long_nav();
        let table = summary_table(&nav, &[None, Some(1), Some(3)], 0.95, None, 0.0);
        assert_eq!(table.columns, vec!["All", "1Y", "3Y"]);
        assert_eq!(table.labels().len(), 21);

        let events = |column: &str| match table.get(column, "# Events") {
            Some(SummaryValue::Count(n)) => n,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(events("All"), 1499);
        assert!(events("1Y") < events("3Y"));
        assert!(events("3Y") < events("All"));
    }

    #[test]
    fn steady_growth_has_no_drawdown() {
        let summary = long_nav().summary(0.95, Some(365.0), 0.0);
        assert_eq!(summary.get("Max Drawdown").and_then(|v| v.as_f64()), Some(0.0));
        let annualized = summary
            .get("Annualized Return")
            .and_then(|v| v.as_f64())
            .unwrap();
        assert_relative_eq!(annualized, 100.0 * 0.0005 * 365.0, epsilon = 1e-6);
        assert_eq!(
            summary.get("First at"),
            Some(SummaryValue::Date(date(2020, 1, 1)))
        );
    }
}

mod reports {
    use super::*;

    fn book() -> Portfolio {
        let prices = growth_prices(date(2024, 1, 29), 8, &[("A", 0.01), ("B", -0.01), ("C", 0.0)]);
        let weights = frame(
            prices.index().to_vec(),
            &["A", "B", "C"],
            vec![
                vec![0.3, 0.3, 0.3],
                vec![f64::NAN, f64::NAN, f64::NAN],
                vec![f64::NAN, f64::NAN, f64::NAN],
                vec![0.2, 0.4, 0.3],
                vec![f64::NAN, f64::NAN, f64::NAN],
                vec![f64::NAN, f64::NAN, f64::NAN],
                vec![0.25, 0.25, 0.4],
                vec![f64::NAN, f64::NAN, f64::NAN],
            ],
        );
        Portfolio::new(prices, weights).unwrap()
    }

    #[test]
    fn snapshot_lists_every_asset() {
        let snapshot = book().snapshot(3).unwrap();
        assert_eq!(snapshot.index_name, "Asset");
        assert_eq!(snapshot.assets().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(snapshot.columns[0], "Month-to-Date");
        assert_eq!(snapshot.columns[1], "Year-to-Date");
        // two rebalance dates
        assert_eq!(snapshot.columns.len(), 4);
        assert!(snapshot.get("A", "Month-to-Date").unwrap() > 0.0);
        assert!(snapshot.get("B", "Month-to-Date").unwrap() < 0.0);
        assert_eq!(snapshot.get("C", "Month-to-Date"), Some(0.0));
    }

    #[test]
    fn top_flop_ranks_contributions() {
        let portfolio = book();
        let today = portfolio.last_date().unwrap();
        let ranked = portfolio.top_flop_ytd(1, today);
        assert_eq!(ranked.top[0].0, "A");
        assert_eq!(ranked.flop[0].0, "B");
    }

    #[test]
    fn state_gap_is_zero_on_drift_day() {
        let state = book().state().unwrap();
        assert_eq!(state.index_name, "Symbol");
        let n = state.columns.len();
        assert_eq!(state.columns[n - 2], "Extrapolated");
        assert_eq!(state.columns[n - 1], "Gap");
        for asset in ["A", "B", "C"] {
            assert_relative_eq!(state.get(asset, "Gap").unwrap(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn sector_weights_sum_with_total() {
        let sectors = BTreeMap::from([
            ("A".to_string(), "Tech".to_string()),
            ("B".to_string(), "Tech".to_string()),
            ("C".to_string(), "Energy".to_string()),
        ]);
        let portfolio = book();
        let first = portfolio.sector_weights(&sectors, true).unwrap();
        assert_relative_eq!(first.value(date(2024, 1, 29), "Tech").unwrap(), 0.6);
        assert_relative_eq!(
            first.value(date(2024, 1, 29), "Total").unwrap(),
            0.9,
            epsilon = 1e-12
        );

        let last = portfolio.sector_weights_final(&sectors, false).unwrap();
        assert!(!last.contains_key("Total"));
        assert!(last["Energy"] > 0.0);
    }

    #[test]
    fn transactions_on_rebalance_dates() {
        let portfolio = book();
        let dates: Vec<_> = portfolio
            .transactions()
            .into_iter()
            .map(|t| t.date)
            .collect();
        assert!(dates.contains(&date(2024, 2, 1)));
        assert!(dates.contains(&date(2024, 2, 4)));
        assert!(!dates.contains(&date(2024, 1, 30)));
    }
}
