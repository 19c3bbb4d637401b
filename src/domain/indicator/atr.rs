//! Average True Range with Wilder's smoothing.
//!
//! Seed: mean of the first n true ranges (bar 0 uses high - low).
//! Then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//!
//! An exponential average started at TR[0] (alpha = 1/n, no seed window)
//! uses the same recursion but a different starting value, so its early
//! readings differ from these until the seed has decayed.

use super::{lag, Column};
use crate::domain::ohlcv::Bar;

pub fn atr(bars: &[Bar], period: usize) -> Column {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;
    let mut prev: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };

        let value = match prev {
            Some(p) => Some((p * (period - 1) as f64 + tr) / period as f64),
            None => {
                sum += tr;
                if i + 1 == period {
                    Some(sum / period as f64)
                } else {
                    None
                }
            }
        };
        prev = value;
        values.push(value);
    }

    lag(values)
}
