//! Report output port trait.

use crate::domain::error::EngineError;
use crate::domain::frame::Frame;
use crate::domain::portfolio::AssetTable;
use crate::domain::summary::SummaryTable;

/// Port for writing derived tables. An `output_path` of `-` is stdout.
pub trait ReportPort {
    fn write_frame(&self, frame: &Frame, output_path: &str) -> Result<(), EngineError>;

    fn write_table(&self, table: &AssetTable, output_path: &str) -> Result<(), EngineError>;

    fn write_summary(&self, table: &SummaryTable, output_path: &str) -> Result<(), EngineError>;
}
