//! Data access port trait.

use std::collections::BTreeMap;

use crate::domain::error::EngineError;
use crate::domain::frame::Frame;

pub trait DataPort {
    /// Wide price table, one column per asset.
    fn fetch_prices(&self) -> Result<Frame, EngineError>;

    /// Sparse weight table; `None` when no weights are configured.
    fn fetch_weights(&self) -> Result<Option<Frame>, EngineError>;

    /// Asset → sector. Empty when no map is configured.
    fn fetch_sector_map(&self) -> Result<BTreeMap<String, String>, EngineError>;
}
