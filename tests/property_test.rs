//! Property tests for the fold and the return accumulator.

mod common;

use common::*;
use proptest::prelude::*;
use stratsim::domain::backtest::simulate;
use stratsim::domain::fold::{self, Transition};
use stratsim::domain::position::Position;
use stratsim::domain::returns::{equity_curve, growth_factor, realized_return, ReturnConvention};
use stratsim::domain::rules::{
    BreakoutTrigger, ChannelBreakoutParams, DownStreakParams, OscillatorParams, StreakExit,
    TripleAverageParams,
};
use stratsim::domain::strategy::{StrategyConfig, StrategyParams};

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((10.0..200.0_f64, 0.0..5.0_f64, -2.0..2.0_f64), 0..80).prop_map(
        |points| {
            points
                .into_iter()
                .enumerate()
                .map(|(i, (close, spread, gap))| {
                    let open = close + gap;
                    make_bar(
                        i,
                        open,
                        open.max(close) + spread,
                        open.min(close) - spread,
                        close,
                    )
                })
                .collect()
        },
    )
}

fn arb_strategy() -> impl Strategy<Value = StrategyConfig> {
    prop_oneof![
        (1usize..8, 1usize..8, prop::bool::ANY).prop_map(|(high, low, allow_short)| {
            StrategyConfig::new(StrategyParams::ChannelBreakout(ChannelBreakoutParams {
                high_period: high,
                low_period: low,
                trigger: BreakoutTrigger::Extremes,
                allow_short,
                ..Default::default()
            }))
        }),
        (2usize..6).prop_map(|rsi_period| {
            StrategyConfig::new(StrategyParams::Oscillator(OscillatorParams {
                rsi_period,
                ..Default::default()
            }))
        }),
        (1usize..3, prop::bool::ANY).prop_map(|(fast, allow_short)| {
            StrategyConfig::new(StrategyParams::TripleAverage(TripleAverageParams {
                fast,
                medium: fast + 2,
                slow: fast + 5,
                allow_short,
            }))
        }),
        (1usize..4, prop::bool::ANY).prop_map(|(down_days, same_bar)| {
            StrategyConfig::new(StrategyParams::ConsecutiveDown(DownStreakParams {
                down_days,
                exit: if same_bar {
                    StreakExit::SameBarClose
                } else {
                    StreakExit::NextBarOpen
                },
            }))
        }),
    ]
}

proptest! {
    /// Exactly one row per bar, and bar 0 is a flat seed.
    #[test]
    fn one_row_per_bar(bars in arb_bars(), strategy in arb_strategy()) {
        let rows = simulate(&bars, &strategy).unwrap();
        prop_assert_eq!(rows.len(), bars.len());
        if let Some(first) = rows.first() {
            prop_assert_eq!(first.transition, Transition::Seed);
            prop_assert_eq!(first.position, Position::Flat);
            prop_assert_eq!(first.ret, 0.0);
        }
        for (row, bar) in rows.iter().zip(&bars) {
            prop_assert_eq!(row.timestamp, bar.timestamp);
        }
    }

    /// Same inputs, same output.
    #[test]
    fn runs_are_deterministic(bars in arb_bars(), strategy in arb_strategy()) {
        let first = simulate(&bars, &strategy).unwrap();
        let second = simulate(&bars, &strategy).unwrap();
        prop_assert_eq!(first, second);
    }

    /// A non-zero return only appears on a row that closed a position.
    #[test]
    fn returns_are_realized_only_on_close(bars in arb_bars(), strategy in arb_strategy()) {
        let rows = simulate(&bars, &strategy).unwrap();
        for row in &rows {
            if row.closed.is_none() {
                prop_assert_eq!(row.ret, 0.0);
            }
            if row.transition == Transition::Hold {
                prop_assert!(row.position != Position::Flat);
            }
            if row.transition == Transition::StayFlat {
                prop_assert_eq!(row.position, Position::Flat);
            }
        }
    }

    /// Every closing row books exactly its leg's return; every hold row
    /// repeats the previous trade price, levels and signal.
    #[test]
    fn closes_book_leg_return_and_holds_carry_state(
        bars in arb_bars(),
        strategy in arb_strategy(),
    ) {
        let rows = simulate(&bars, &strategy).unwrap();
        for (i, row) in rows.iter().enumerate() {
            if let Some(leg) = row.closed {
                let expected = realized_return(
                    leg.side,
                    leg.entry_price,
                    leg.exit_price,
                    strategy.convention,
                );
                prop_assert_eq!(row.ret, expected);
                prop_assert!(matches!(
                    row.transition,
                    Transition::Exit | Transition::RoundTrip | Transition::Roll
                ));
            }
            if row.transition == Transition::Hold {
                let prev = &rows[i - 1];
                prop_assert_eq!(row.position, prev.position);
                prop_assert_eq!(row.trade_price, prev.trade_price);
                prop_assert_eq!(row.stop_loss, prev.stop_loss);
                prop_assert_eq!(row.take_profit, prev.take_profit);
                prop_assert_eq!(row.signal, prev.signal);
                prop_assert!(row.closed.is_none());
            }
        }
    }

    /// A later bar never changes an earlier row.
    #[test]
    fn prefix_rows_are_stable(bars in arb_bars(), strategy in arb_strategy(), cut in 0usize..80) {
        let cut = cut.min(bars.len());
        let full = simulate(&bars, &strategy).unwrap();
        let prefix = simulate(&bars[..cut], &strategy).unwrap();
        prop_assert_eq!(&full[..cut], &prefix[..]);
    }

    /// A breakout fill is a level the bar actually crossed.
    #[test]
    fn breakout_fills_at_crossed_level(bars in arb_bars(), high in 1usize..6, low in 1usize..6) {
        let strategy = StrategyConfig::new(StrategyParams::ChannelBreakout(ChannelBreakoutParams {
            high_period: high,
            low_period: low,
            trigger: BreakoutTrigger::Extremes,
            allow_short: true,
            ..Default::default()
        }));
        let rows = simulate(&bars, &strategy).unwrap();
        for (row, bar) in rows.iter().zip(&bars) {
            if row.transition == Transition::Enter {
                match row.position {
                    Position::Long => prop_assert!(row.trade_price < bar.high),
                    Position::Short => prop_assert!(row.trade_price > bar.low),
                    Position::Flat => prop_assert!(false, "entry row left the book flat"),
                }
            }
        }
    }

    /// Arithmetic and log streams describe the same growth.
    #[test]
    fn conventions_agree_on_growth(simple in prop::collection::vec(-0.5..1.0_f64, 0..50)) {
        let log: Vec<f64> = simple.iter().map(|r| (1.0 + r).ln()).collect();
        let a = growth_factor(&simple, ReturnConvention::Arithmetic);
        let l = growth_factor(&log, ReturnConvention::Logarithmic);
        prop_assert!((a - l).abs() <= 1e-9 * a.max(1.0));
    }

    /// The equity curve ends at the growth factor.
    #[test]
    fn equity_curve_ends_at_growth(bars in arb_bars(), strategy in arb_strategy()) {
        let rows = simulate(&bars, &strategy).unwrap();
        let returns = fold::returns(&rows);
        let equity = equity_curve(&returns, strategy.convention);
        prop_assert_eq!(equity.len(), rows.len());
        if let Some(&last) = equity.last() {
            let growth = growth_factor(&returns, strategy.convention);
            prop_assert!((last - growth).abs() <= 1e-9 * growth.max(1.0));
        }
    }
}
