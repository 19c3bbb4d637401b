//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratsimError;
use std::path::Path;

/// Port for writing a run's row stream.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), StratsimError>;
}
