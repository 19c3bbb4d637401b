//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); 100 when avg_loss == 0.

use super::{lag, Column};
use crate::domain::ohlcv::Bar;

pub fn rsi(bars: &[Bar], period: usize) -> Column {
    if period == 0 || bars.len() < 2 {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(None);

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    let mut averages: Option<(f64, f64)> = None;

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        averages = match averages {
            Some((avg_gain, avg_loss)) => Some((
                (avg_gain * (period - 1) as f64 + gain) / period as f64,
                (avg_loss * (period - 1) as f64 + loss) / period as f64,
            )),
            None => {
                gain_sum += gain;
                loss_sum += loss;
                if i == period {
                    Some((gain_sum / period as f64, loss_sum / period as f64))
                } else {
                    None
                }
            }
        };

        values.push(averages.map(|(avg_gain, avg_loss)| {
            if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
            }
        }));
    }

    lag(values)
}
