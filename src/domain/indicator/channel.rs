//! Rolling price channel: highest high and lowest low over the prior N bars.

use super::{lag, Column};
use crate::domain::ohlcv::Bar;

pub fn channel_high(bars: &[Bar], period: usize) -> Column {
    lag(rolling(bars, period, |b| b.high, f64::max))
}

pub fn channel_low(bars: &[Bar], period: usize) -> Column {
    lag(rolling(bars, period, |b| b.low, f64::min))
}

fn rolling(
    bars: &[Bar],
    period: usize,
    field: impl Fn(&Bar) -> f64,
    pick: impl Fn(f64, f64) -> f64,
) -> Column {
    if period == 0 {
        return vec![None; bars.len()];
    }
    (0..bars.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            bars[i + 1 - period..=i]
                .iter()
                .map(&field)
                .reduce(&pick)
        })
        .collect()
}
