//! Analysis and portfolio parameters read from the `[analysis]` and
//! `[portfolio]` config sections.

use super::error::EngineError;
use super::portfolio::{FUND_SIZE, TRADE_THRESHOLD};
use super::series::Frequency;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub alpha: f64,
    pub risk_free_rate: f64,
    /// Inferred from the nav index when absent.
    pub periods_per_year: Option<f64>,
    pub drawdown_eps: f64,
    /// Trailing windows in years; `None` is the whole history.
    pub lookbacks: Vec<Option<u32>>,
    pub iron_threshold: f64,
    pub iron_rule: Option<Frequency>,
    pub snapshot_days: usize,
    pub top_n: usize,
    pub fund_size: f64,
    pub trade_threshold: f64,
    pub transaction_cost_bps: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.95,
            risk_free_rate: 0.0,
            periods_per_year: None,
            drawdown_eps: 0.0,
            lookbacks: vec![None, Some(1), Some(3), Some(5)],
            iron_threshold: 0.02,
            iron_rule: None,
            snapshot_days: 5,
            top_n: 5,
            fund_size: FUND_SIZE,
            trade_threshold: TRADE_THRESHOLD,
            transaction_cost_bps: 0.0,
        }
    }
}

/// Parse a comma-separated lookback list such as `all, 1, 3`.
pub fn parse_lookbacks(value: &str) -> Result<Vec<Option<u32>>, EngineError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.eq_ignore_ascii_case("all") {
                return Ok(None);
            }
            s.trim_end_matches(['Y', 'y'])
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(Some)
                .ok_or_else(|| EngineError::ConfigInvalid {
                    section: "analysis".into(),
                    key: "lookbacks".into(),
                    reason: format!("invalid lookback '{s}'"),
                })
        })
        .collect()
}
