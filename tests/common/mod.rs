#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
pub use stratsim::domain::ohlcv::Bar;
use std::io::Write;

pub fn day(offset: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::days(offset as i64)
}

/// Daily bar with explicit OHLC.
pub fn make_bar(offset: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: day(offset),
        open,
        high,
        low,
        close,
        volume: Some(1_000),
    }
}

/// Bars with (high, low, close); open equals close.
pub fn make_hlc_bars(hlc: &[(f64, f64, f64)]) -> Vec<Bar> {
    hlc.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| make_bar(i, close, high, low, close))
        .collect()
}

/// Bars from closes with a one-point range either side.
pub fn make_close_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(i, close, close + 1.0, close - 1.0, close))
        .collect()
}

/// A CSV file in the shape the data adapter reads.
pub fn bars_to_csv(bars: &[Bar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for bar in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.date().format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume.unwrap_or(0)
        ));
    }
    out
}

pub fn write_file(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    path
}

/// Gently trending closes with enough swings to trigger every strategy.
pub fn wave_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            100.0 + t * 0.1 + 8.0 * (t / 5.0).sin() + 3.0 * (t / 1.7).cos()
        })
        .collect()
}
