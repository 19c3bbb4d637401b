//! CSV report adapter implementing ReportPort.
//!
//! One line per output row, alongside the strategy equity and the
//! buy-and-hold return for the same bar.

use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};
use tracing::info;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratsimError;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 10] = [
    "timestamp",
    "position",
    "trade_price",
    "return",
    "signal",
    "transition",
    "stop_loss",
    "take_profit",
    "equity",
    "benchmark_return",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), StratsimError> {
        let mut writer = csv::Writer::from_path(output_path)?;
        writer.write_record(HEADER)?;

        for (i, row) in result.rows.iter().enumerate() {
            let equity = result.equity.get(i).copied().unwrap_or(1.0);
            let benchmark = result.benchmark.get(i).copied().unwrap_or(0.0);
            writer.write_record([
                format_timestamp(row.timestamp),
                row.position.to_string(),
                row.trade_price.to_string(),
                row.ret.to_string(),
                row.signal.to_string(),
                row.transition.to_string(),
                format_level(row.stop_loss),
                format_level(row.take_profit),
                equity.to_string(),
                benchmark.to_string(),
            ])?;
        }

        writer.flush()?;
        info!(path = %output_path.display(), rows = result.rows.len(), "wrote report");
        Ok(())
    }
}

/// Daily bars print as a bare date.
fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.time() == NaiveTime::MIN {
        ts.date().format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn format_level(level: Option<f64>) -> String {
    level.map(|v| v.to_string()).unwrap_or_default()
}
