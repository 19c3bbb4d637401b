//! Triple moving average alignment.
//!
//! Enter when the close sits on the same side of all three averages (at or
//! above for long, strictly below for short). Exit as soon as the close
//! disagrees with any one of them. Fills are at the close.

use crate::domain::bar_series::BarView;
use crate::domain::indicator::IndicatorKey;
use crate::domain::position::{Side, TradeState};
use crate::domain::rule_set::{Entry, Exit, RuleSet};

#[derive(Debug, Clone, PartialEq)]
pub struct TripleAverageParams {
    pub fast: usize,
    pub medium: usize,
    pub slow: usize,
    pub allow_short: bool,
}

impl Default for TripleAverageParams {
    fn default() -> Self {
        TripleAverageParams {
            fast: 20,
            medium: 40,
            slow: 80,
            allow_short: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TripleAverage {
    params: TripleAverageParams,
}

impl TripleAverage {
    pub fn new(params: TripleAverageParams) -> Self {
        Self { params }
    }

    fn keys(&self) -> [IndicatorKey; 3] {
        [
            IndicatorKey::Sma(self.params.fast),
            IndicatorKey::Sma(self.params.medium),
            IndicatorKey::Sma(self.params.slow),
        ]
    }

    /// For each average, whether the close is at or above it. `None` during warm-up.
    fn above(&self, bar: BarView<'_>) -> Option<[bool; 3]> {
        let [a, b, c] = self.keys().map(|k| bar.indicator(k));
        let close = bar.close();
        Some([close >= a?, close >= b?, close >= c?])
    }
}

impl RuleSet for TripleAverage {
    fn name(&self) -> &'static str {
        "triple_average"
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        self.keys().to_vec()
    }

    fn entry_test(&self, bar: BarView<'_>) -> Option<Entry> {
        let above = self.above(bar)?;
        if above.iter().all(|&a| a) {
            Some(Entry::at(Side::Long, bar.close()))
        } else if self.params.allow_short && above.iter().all(|&a| !a) {
            Some(Entry::at(Side::Short, bar.close()))
        } else {
            None
        }
    }

    fn exit_test(&self, bar: BarView<'_>, state: &TradeState) -> Option<Exit> {
        let above = self.above(bar)?;
        let side = state.position.side()?;
        let disagrees = match side {
            Side::Long => above.iter().any(|&a| !a),
            Side::Short => above.iter().any(|&a| a),
        };
        disagrees.then(|| Exit::at(side, bar.close()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar_series::BarSeries;
    use crate::domain::fold::{run, Transition};
    use crate::domain::ohlcv::Bar;
    use crate::domain::position::Position;
    use crate::domain::returns::ReturnConvention;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn params() -> TripleAverageParams {
        TripleAverageParams {
            fast: 2,
            medium: 3,
            slow: 4,
            allow_short: true,
        }
    }

    fn series(closes: &[f64], averages: [Vec<Option<f64>>; 3]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
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
            .collect();
        let [fast, medium, slow] = averages;
        BarSeries::new(bars)
            .unwrap()
            .with_indicator(IndicatorKey::Sma(2), fast)
            .unwrap()
            .with_indicator(IndicatorKey::Sma(3), medium)
            .unwrap()
            .with_indicator(IndicatorKey::Sma(4), slow)
            .unwrap()
    }

    #[test]
    fn all_above_enters_long_and_any_below_exits() {
        let s = series(
            &[100.0, 105.0, 99.0],
            [
                vec![None, Some(100.0), Some(98.0)],
                vec![None, Some(101.0), Some(100.0)],
                vec![None, Some(102.0), Some(97.0)],
            ],
        );
        let rows = run(&s, &TripleAverage::new(params()), ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].position, Position::Long);
        assert_eq!(rows[1].trade_price, 105.0);
        // 99 is below only the medium average
        assert_eq!(rows[2].transition, Transition::Exit);
        assert_eq!(rows[2].position, Position::Flat);
        assert_relative_eq!(rows[2].ret, 99.0 / 105.0 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mixed_alignment_stays_flat() {
        let s = series(
            &[100.0, 100.0],
            [
                vec![None, Some(99.0)],
                vec![None, Some(101.0)],
                vec![None, Some(99.0)],
            ],
        );
        let rows = run(&s, &TripleAverage::new(params()), ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].transition, Transition::StayFlat);
    }

    #[test]
    fn all_below_enters_short_when_allowed() {
        let averages = [
            vec![None, Some(101.0), Some(101.0)],
            vec![None, Some(102.0), Some(99.0)],
            vec![None, Some(103.0), Some(103.0)],
        ];
        let s = series(&[100.0, 100.0, 100.0], averages.clone());
        let rows = run(&s, &TripleAverage::new(params()), ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].position, Position::Short);
        // close at or above the medium average exits the short
        assert_eq!(rows[2].transition, Transition::Exit);

        let long_only = TripleAverage::new(TripleAverageParams {
            allow_short: false,
            ..params()
        });
        let s = series(&[100.0, 100.0, 100.0], averages);
        let rows = run(&s, &long_only, ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].position, Position::Flat);
    }

    #[test]
    fn close_equal_to_average_counts_as_above() {
        let s = series(
            &[100.0, 100.0],
            [
                vec![None, Some(100.0)],
                vec![None, Some(100.0)],
                vec![None, Some(100.0)],
            ],
        );
        let rows = run(&s, &TripleAverage::new(params()), ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].position, Position::Long);
    }

    #[test]
    fn one_missing_average_blocks_entry() {
        let s = series(
            &[100.0, 110.0],
            [
                vec![None, Some(100.0)],
                vec![None, Some(100.0)],
                vec![None, None],
            ],
        );
        let rows = run(&s, &TripleAverage::new(params()), ReturnConvention::Arithmetic).unwrap();
        assert_eq!(rows[1].position, Position::Flat);
    }
}
