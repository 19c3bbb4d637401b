//! CSV file data adapter.
//!
//! Header names are matched case-insensitively. The timestamp column is
//! `timestamp` or `date`, otherwise the first named column that is not a
//! price column. `volume` is optional.

use crate::domain::error::StratsimError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

const PRICE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    /// Relative data paths are resolved against `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

impl DataPort for CsvAdapter {
    fn load_bars(
        &self,
        path: &Path,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, StratsimError> {
        let path = self.resolve(path);
        let file = File::open(&path).map_err(|e| StratsimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let bars = read_bars(file, start_date, end_date)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => info!(
                path = %path.display(),
                bars = bars.len(),
                first = %first.timestamp,
                last = %last.timestamp,
                "loaded bars"
            ),
            _ => info!(path = %path.display(), "no bars in requested range"),
        }
        Ok(bars)
    }
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, StratsimError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| StratsimError::Data {
                reason: format!("missing {} column", name),
            })
        };

        let timestamp = find("timestamp")
            .or_else(|| find("date"))
            .or_else(|| {
                names
                    .iter()
                    .position(|n| !n.is_empty() && !PRICE_COLUMNS.contains(&n.as_str()))
            })
            .ok_or_else(|| StratsimError::Data {
                reason: "missing timestamp column".into(),
            })?;

        Ok(Columns {
            timestamp,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

/// Parse bars from any CSV source, sorted ascending and date-filtered.
pub fn read_bars<R: Read>(
    reader: R,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<Bar>, StratsimError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = Columns::from_headers(rdr.headers()?)?;
    let mut bars = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = line + 2;

        let raw = field(&record, columns.timestamp, "timestamp", row)?;
        let timestamp = parse_timestamp(raw).ok_or_else(|| StratsimError::Data {
            reason: format!("invalid timestamp '{}' on line {}", raw, row),
        })?;

        let date = timestamp.date();
        if start_date.is_some_and(|start| date < start) || end_date.is_some_and(|end| date > end) {
            continue;
        }

        let volume = match columns.volume.and_then(|i| record.get(i)) {
            None | Some("") => None,
            Some(v) => Some(parse_price(v, "volume", row)? as i64),
        };

        bars.push(Bar {
            timestamp,
            open: parse_price(field(&record, columns.open, "open", row)?, "open", row)?,
            high: parse_price(field(&record, columns.high, "high", row)?, "high", row)?,
            low: parse_price(field(&record, columns.low, "low", row)?, "low", row)?,
            close: parse_price(field(&record, columns.close, "close", row)?, "close", row)?,
            volume,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
        return Err(StratsimError::Data {
            reason: format!("duplicate timestamp {}", pair[0].timestamp),
        });
    }
    Ok(bars)
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, StratsimError> {
    record
        .get(index)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StratsimError::Data {
            reason: format!("missing {} value on line {}", name, row),
        })
}

fn parse_price(value: &str, name: &str, row: usize) -> Result<f64, StratsimError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StratsimError::Data {
            reason: format!("invalid {} value '{}' on line {}", name, value, row),
        })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z")
                .or_else(|_| DateTime::parse_from_rfc3339(value))
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
