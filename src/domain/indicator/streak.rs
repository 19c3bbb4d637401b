//! Consecutive down-close count.
//!
//! A bar is "down" when its close is below the previous close. The count
//! resets to zero on any bar that is not down; bar 0 counts as not down.

use super::{lag, Column};
use crate::domain::ohlcv::Bar;

pub fn down_streak(bars: &[Bar]) -> Column {
    let mut count = 0usize;
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i > 0 && bar.close < bars[i - 1].close {
                count += 1;
            } else {
                count = 0;
            }
            Some(count as f64)
        })
        .collect();
    lag(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: None,
            })
            .collect()
    }

    #[test]
    fn streak_counts_and_resets() {
        let values = down_streak(&make_bars(&[10.0, 9.0, 8.0, 8.0, 7.0, 6.0, 5.0]));
        // same-bar counts: [0, 1, 2, 0, 1, 2, 3] → lagged
        assert_eq!(
            values,
            vec![
                None,
                Some(0.0),
                Some(1.0),
                Some(2.0),
                Some(0.0),
                Some(1.0),
                Some(2.0)
            ]
        );
    }

    #[test]
    fn streak_flat_close_is_not_down() {
        let values = down_streak(&make_bars(&[10.0, 10.0, 10.0]));
        assert_eq!(values, vec![None, Some(0.0), Some(0.0)]);
    }
}
