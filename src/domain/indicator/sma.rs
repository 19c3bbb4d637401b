//! Simple moving average of close.

use super::{lag, Column};
use crate::domain::ohlcv::Bar;

pub fn sma(bars: &[Bar], period: usize) -> Column {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        if i + 1 >= period {
            values.push(Some(sum / period as f64));
        } else {
            values.push(None);
        }
    }
    lag(values)
}
