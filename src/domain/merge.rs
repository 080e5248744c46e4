//! Union of overlapping histories where the newer source wins.
//!
//! For every timestamp (and, for frames, every column) the first defined
//! value from `new` is kept, falling back to `old`.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::error::EngineError;
use super::frame::Frame;
use super::series::TimeSeries;

fn first_defined(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(x), _) if !x.is_nan() => x,
        (_, Some(y)) => y,
        _ => f64::NAN,
    }
}

pub fn merge_series(new: Option<&TimeSeries>, old: Option<&TimeSeries>) -> Option<TimeSeries> {
    match (new, old) {
        (Some(new), Some(old)) => {
            let index: BTreeSet<NaiveDate> =
                new.index().iter().chain(old.index()).copied().collect();
            let (index, values) = index
                .into_iter()
                .map(|d| (d, first_defined(new.get(d), old.get(d))))
                .unzip();
            Some(TimeSeries::from_parts_unchecked(index, values))
        }
        (Some(new), None) => Some(new.clone()),
        (None, old) => old.cloned(),
    }
}

pub fn merge_frames(new: Option<&Frame>, old: Option<&Frame>) -> Result<Option<Frame>, EngineError> {
    let (new, old) = match (new, old) {
        (Some(new), Some(old)) => (new, old),
        (Some(new), None) => return Ok(Some(new.clone())),
        (None, old) => return Ok(old.cloned()),
    };

    let index: Vec<NaiveDate> = new
        .index()
        .iter()
        .chain(old.index())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let columns: Vec<String> = new
        .columns()
        .iter()
        .chain(old.columns())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = index
        .iter()
        .map(|&d| {
            columns
                .iter()
                .map(|c| first_defined(new.value(d, c), old.value(d, c)))
                .collect()
        })
        .collect();

    Frame::new(index, columns, rows).map(Some)
}

/// Last date carrying a defined value, or `default`.
pub fn last_index(ts: Option<&TimeSeries>, default: Option<NaiveDate>) -> Option<NaiveDate> {
    ts.and_then(|s| s.iter().rev().find(|(_, v)| !v.is_nan()).map(|(d, _)| d))
        .or(default)
}

/// First date carrying a defined value, or `default`.
pub fn first_index(ts: Option<&TimeSeries>, default: Option<NaiveDate>) -> Option<NaiveDate> {
    ts.and_then(|s| s.iter().find(|(_, v)| !v.is_nan()).map(|(d, _)| d))
        .or(default)
}
