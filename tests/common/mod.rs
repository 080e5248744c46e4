#![allow(dead_code)]

use chrono::NaiveDate;
use navport::domain::error::EngineError;
use navport::domain::frame::Frame;
use navport::ports::data_port::DataPort;
use std::collections::BTreeMap;

pub struct MockDataPort {
    pub prices: Frame,
    pub weights: Option<Frame>,
    pub sectors: BTreeMap<String, String>,
    pub fail: bool,
}

impl MockDataPort {
    pub fn new(prices: Frame) -> Self {
        Self {
            prices,
            weights: None,
            sectors: BTreeMap::new(),
            fail: false,
        }
    }

    pub fn with_weights(mut self, weights: Frame) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_sector(mut self, asset: &str, sector: &str) -> Self {
        self.sectors.insert(asset.to_string(), sector.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self) -> Result<Frame, EngineError> {
        if self.fail {
            return Err(EngineError::Data {
                reason: "mock failure".into(),
            });
        }
        Ok(self.prices.clone())
    }

    fn fetch_weights(&self) -> Result<Option<Frame>, EngineError> {
        Ok(self.weights.clone())
    }

    fn fetch_sector_map(&self) -> Result<BTreeMap<String, String>, EngineError> {
        Ok(self.sectors.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn frame(index: Vec<NaiveDate>, columns: &[&str], rows: Vec<Vec<f64>>) -> Frame {
    Frame::new(
        index,
        columns.iter().map(|c| c.to_string()).collect(),
        rows,
    )
    .unwrap()
}

/// Consecutive calendar days starting at `start`.
pub fn daily_dates(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

/// One asset per column, each growing by its own constant daily rate.
pub fn growth_prices(start: NaiveDate, count: usize, rates: &[(&str, f64)]) -> Frame {
    let index = daily_dates(start, count);
    let rows = (0..count)
        .map(|i| {
            rates
                .iter()
                .map(|(_, r)| 100.0 * (1.0 + r).powi(i as i32))
                .collect()
        })
        .collect();
    let columns: Vec<&str> = rates.iter().map(|(name, _)| *name).collect();
    frame(index, &columns, rows)
}

/// The textbook example: one asset gaining 10% twice, fully invested.
pub fn ten_percent_portfolio() -> (Frame, Frame) {
    let index = vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)];
    let prices = frame(index.clone(), &["A"], vec![vec![1.0], vec![1.1], vec![1.21]]);
    let weights = frame(index, &["A"], vec![vec![1.0], vec![1.0], vec![1.0]]);
    (prices, weights)
}

pub fn write_file(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
