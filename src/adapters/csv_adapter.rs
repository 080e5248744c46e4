//! CSV data and report adapter.
//!
//! Tables are wide: a leading `date` column (`%Y-%m-%d`) followed by one
//! column per asset. Empty cells are missing values. The sector map is a
//! two-column `asset,sector` file.

use crate::domain::error::EngineError;
use crate::domain::frame::Frame;
use crate::domain::portfolio::AssetTable;
use crate::domain::summary::SummaryTable;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    prices: PathBuf,
    weights: Option<PathBuf>,
    sectors: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(prices: PathBuf) -> Self {
        Self {
            prices,
            weights: None,
            sectors: None,
        }
    }

    pub fn with_weights(mut self, weights: PathBuf) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_sectors(mut self, sectors: PathBuf) -> Self {
        self.sectors = Some(sectors);
        self
    }
}

fn read_file(path: &Path) -> Result<String, EngineError> {
    fs::read_to_string(path).map_err(|e| EngineError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_value(cell: &str, date: NaiveDate, column: &str) -> Result<f64, EngineError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|e| EngineError::Data {
        reason: format!("invalid value '{cell}' for {column} at {date}: {e}"),
    })
}

/// Parse a wide date-indexed table. Rows are sorted by date; repeated dates
/// fail when the frame is built.
pub fn read_frame(content: &str) -> Result<Frame, EngineError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(EngineError::Data {
            reason: "missing date column".into(),
        });
    }
    let columns: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut records: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let date_str = record.get(0).ok_or_else(|| EngineError::Data {
            reason: "missing date column".into(),
        })?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            EngineError::Data {
                reason: format!("invalid date '{date_str}': {e}"),
            }
        })?;
        let values = columns
            .iter()
            .enumerate()
            .map(|(j, column)| parse_value(record.get(j + 1).unwrap_or(""), date, column))
            .collect::<Result<Vec<_>, _>>()?;
        records.push((date, values));
    }

    records.sort_by_key(|(date, _)| *date);
    let (index, rows) = records.into_iter().unzip();
    Frame::new(index, columns, rows)
}

pub fn read_sector_map(content: &str) -> Result<BTreeMap<String, String>, EngineError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut map = BTreeMap::new();
    for result in rdr.records() {
        let record = result?;
        match (record.get(0), record.get(1)) {
            (Some(asset), Some(sector)) if !asset.trim().is_empty() => {
                map.insert(asset.trim().to_string(), sector.trim().to_string());
            }
            _ => {
                return Err(EngineError::Data {
                    reason: format!("invalid sector row: {:?}", record),
                })
            }
        }
    }
    Ok(map)
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// CSV writer on a file, or on stdout for `-`.
fn writer(output_path: &str) -> Result<csv::Writer<Box<dyn Write>>, EngineError> {
    let sink: Box<dyn Write> = if output_path == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(fs::File::create(output_path)?)
    };
    Ok(csv::Writer::from_writer(sink))
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self) -> Result<Frame, EngineError> {
        let frame = read_frame(&read_file(&self.prices)?)?;
        tracing::info!(
            path = %self.prices.display(),
            assets = frame.width(),
            dates = frame.len(),
            "loaded prices"
        );
        Ok(frame)
    }

    fn fetch_weights(&self) -> Result<Option<Frame>, EngineError> {
        let Some(path) = &self.weights else {
            return Ok(None);
        };
        let frame = read_frame(&read_file(path)?)?;
        tracing::info!(path = %path.display(), dates = frame.len(), "loaded weights");
        Ok(Some(frame))
    }

    fn fetch_sector_map(&self) -> Result<BTreeMap<String, String>, EngineError> {
        match &self.sectors {
            Some(path) => read_sector_map(&read_file(path)?),
            None => Ok(BTreeMap::new()),
        }
    }
}

impl ReportPort for CsvAdapter {
    fn write_frame(&self, frame: &Frame, output_path: &str) -> Result<(), EngineError> {
        let mut wtr = writer(output_path)?;
        let mut header = vec!["date".to_string()];
        header.extend(frame.columns().iter().cloned());
        wtr.write_record(&header)?;
        for (date, row) in frame.index().iter().zip(frame.rows()) {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(row.iter().map(|v| format_value(*v)));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_table(&self, table: &AssetTable, output_path: &str) -> Result<(), EngineError> {
        let mut wtr = writer(output_path)?;
        let mut header = vec![table.index_name.clone()];
        header.extend(table.columns.iter().cloned());
        wtr.write_record(&header)?;
        for (asset, values) in &table.rows {
            let mut record = vec![asset.clone()];
            record.extend(values.iter().map(|v| format_value(*v)));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_summary(&self, table: &SummaryTable, output_path: &str) -> Result<(), EngineError> {
        let mut wtr = writer(output_path)?;
        let mut header = vec![String::new()];
        header.extend(table.columns.iter().cloned());
        wtr.write_record(&header)?;
        for label in table.labels() {
            let mut record = vec![label.clone()];
            record.extend(table.summaries.iter().map(|s| {
                s.get(&label).map(|v| v.to_string()).unwrap_or_default()
            }));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
