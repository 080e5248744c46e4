//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for navport.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("index is not strictly increasing at position {position}: {current} follows {previous}")]
    NotIncreasing {
        position: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("duplicate timestamp {0}")]
    DuplicateIndex(NaiveDate),

    #[error("duplicate column {0}")]
    DuplicateColumn(String),

    #[error("shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("negative value {value} at {date}")]
    NegativeValue { date: NaiveDate, value: f64 },

    #[error("weight columns not a subset of price columns: {}", missing.join(", "))]
    WeightColumnsNotSubset { missing: Vec<String> },

    #[error("index for prices and weights have to match")]
    IndexMismatch,

    #[error("weights for {asset} have a gap of {gap} periods")]
    WeightGap { asset: String, gap: usize },

    #[error("first drawdown value must be zero, found {0}")]
    DrawdownBaseline(f64),

    #[error("unknown timestamp {0}")]
    UnknownTimestamp(NaiveDate),

    #[error("no timestamp before {0}")]
    NoPriorTimestamp(NaiveDate),

    #[error("unknown asset {0}")]
    UnknownAsset(String),

    #[error("unknown period {0}")]
    UnknownPeriod(String),

    #[error("invalid resample rule {0}")]
    InvalidFrequency(String),

    #[error("portfolio is empty")]
    EmptyPortfolio,

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Data {
            reason: format!("CSV error: {err}"),
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::Data { .. } => 3,
            EngineError::NotIncreasing { .. }
            | EngineError::DuplicateIndex(_)
            | EngineError::DuplicateColumn(_)
            | EngineError::ShapeMismatch { .. }
            | EngineError::NegativeValue { .. }
            | EngineError::WeightColumnsNotSubset { .. }
            | EngineError::IndexMismatch
            | EngineError::WeightGap { .. }
            | EngineError::DrawdownBaseline(_) => 4,
            EngineError::UnknownTimestamp(_)
            | EngineError::NoPriorTimestamp(_)
            | EngineError::UnknownAsset(_)
            | EngineError::UnknownPeriod(_)
            | EngineError::InvalidFrequency(_)
            | EngineError::EmptyPortfolio => 5,
        };
        std::process::ExitCode::from(code)
    }
}
