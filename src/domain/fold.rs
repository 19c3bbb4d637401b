//! Simulation core: one left-to-right fold over the bar series.
//!
//! Bar 0 is always a flat seed row. From bar 1 on, [`step`] consumes the
//! previous [`TradeState`] and the current bar and returns the next state
//! plus exactly one [`OutputRow`]. Earlier rows are never revisited.
//!
//! Exit priority while a position is open: stop-loss, then take-profit,
//! then the rule set's own exit signal.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::bar_series::{BarSeries, BarView};
use crate::domain::error::StratsimError;
use crate::domain::position::{ClosedLeg, Position, Side, Signal, TradeState};
use crate::domain::returns::{realized_return, ReturnConvention};
use crate::domain::rule_set::{Entry, Exit, RuleSet};

/// What happened on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Seed,
    StayFlat,
    Enter,
    Hold,
    Exit,
    /// Entered and exited inside the same bar.
    RoundTrip,
    /// Exited at the bar open and re-entered on the same bar.
    Roll,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::Seed => "seed",
            Transition::StayFlat => "stay_flat",
            Transition::Enter => "enter",
            Transition::Hold => "hold",
            Transition::Exit => "exit",
            Transition::RoundTrip => "round_trip",
            Transition::Roll => "roll",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub timestamp: NaiveDateTime,
    pub position: Position,
    pub trade_price: f64,
    pub ret: f64,
    pub signal: Signal,
    pub transition: Transition,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// The position closed on this row, if any.
    pub closed: Option<ClosedLeg>,
}

impl OutputRow {
    fn from_state(
        timestamp: NaiveDateTime,
        state: &TradeState,
        transition: Transition,
        ret: f64,
        closed: Option<ClosedLeg>,
    ) -> Self {
        OutputRow {
            timestamp,
            position: state.position,
            trade_price: state.trade_price,
            ret,
            signal: state.signal,
            transition,
            stop_loss: state.targets.and_then(|t| t.stop_loss),
            take_profit: state.targets.and_then(|t| t.take_profit),
            closed,
        }
    }
}

/// Run a rule set over a series. Fails only if required indicators are absent.
pub fn run(
    series: &BarSeries,
    rule_set: &dyn RuleSet,
    convention: ReturnConvention,
) -> Result<Vec<OutputRow>, StratsimError> {
    series.require(&rule_set.required_indicators())?;
    Ok(simulate(series, rule_set, convention))
}

fn simulate(
    series: &BarSeries,
    rule_set: &dyn RuleSet,
    convention: ReturnConvention,
) -> Vec<OutputRow> {
    if series.is_empty() {
        return Vec::new();
    }

    let seed = TradeState::seed();
    let seed_row = OutputRow::from_state(series.bar(0).timestamp, &seed, Transition::Seed, 0.0, None);

    let rest = (1..series.len()).scan(seed, |state, i| {
        let (next, row) = step(state, series.view(i), rule_set, convention);
        *state = next;
        Some(row)
    });

    std::iter::once(seed_row).chain(rest).collect()
}

/// The per-bar transition function.
pub fn step(
    prev: &TradeState,
    bar: BarView<'_>,
    rule_set: &dyn RuleSet,
    convention: ReturnConvention,
) -> (TradeState, OutputRow) {
    match prev.position.side() {
        None => from_flat(bar, rule_set, convention),
        Some(side) => from_open(prev, side, bar, rule_set, convention),
    }
}

fn from_flat(
    bar: BarView<'_>,
    rule_set: &dyn RuleSet,
    convention: ReturnConvention,
) -> (TradeState, OutputRow) {
    let timestamp = bar.bar().timestamp;

    let Some(entry) = rule_set.entry_test(bar) else {
        let state = TradeState::flat(bar.close(), Signal::None);
        let row = OutputRow::from_state(timestamp, &state, Transition::StayFlat, 0.0, None);
        return (state, row);
    };

    match entry.same_bar_exit {
        Some(exit_price) => {
            let leg = ClosedLeg {
                side: entry.side,
                entry_index: bar.index,
                entry_price: entry.price,
                exit_price,
            };
            let ret = realized_return(entry.side, entry.price, exit_price, convention);
            let state = TradeState::flat(exit_price, Signal::Exit(entry.side));
            let row = OutputRow::from_state(timestamp, &state, Transition::RoundTrip, ret, Some(leg));
            (state, row)
        }
        None => {
            let state = open(&entry, bar.index, rule_set);
            let row = OutputRow::from_state(timestamp, &state, Transition::Enter, 0.0, None);
            (state, row)
        }
    }
}

fn from_open(
    prev: &TradeState,
    side: Side,
    bar: BarView<'_>,
    rule_set: &dyn RuleSet,
    convention: ReturnConvention,
) -> (TradeState, OutputRow) {
    let timestamp = bar.bar().timestamp;

    let Some(exit) = exit_decision(prev, side, bar, rule_set) else {
        let state = prev.clone();
        let row = OutputRow::from_state(timestamp, &state, Transition::Hold, 0.0, None);
        return (state, row);
    };

    let leg = ClosedLeg {
        side,
        entry_index: prev.entry_index,
        entry_price: prev.entry_price,
        exit_price: exit.price,
    };
    let ret = realized_return(side, prev.entry_price, exit.price, convention);

    // An open-priced exit leaves the bar's remaining range to trade.
    if exit.at_open {
        if let Some(entry) = rule_set
            .entry_test(bar)
            .filter(|e| e.same_bar_exit.is_none())
        {
            let state = open(&entry, bar.index, rule_set);
            let row = OutputRow::from_state(timestamp, &state, Transition::Roll, ret, Some(leg));
            return (state, row);
        }
    }

    let state = TradeState::flat(exit.price, exit.signal);
    let row = OutputRow::from_state(timestamp, &state, Transition::Exit, ret, Some(leg));
    (state, row)
}

fn exit_decision(
    prev: &TradeState,
    side: Side,
    bar: BarView<'_>,
    rule_set: &dyn RuleSet,
) -> Option<Exit> {
    if let Some(targets) = prev.targets {
        if let Some(level) = targets.stop_loss.filter(|_| targets.stop_breached(side, bar.bar())) {
            return Some(Exit {
                price: level,
                signal: Signal::StopLoss(side),
                at_open: false,
            });
        }
        if let Some(level) = targets
            .take_profit
            .filter(|_| targets.target_breached(side, bar.bar()))
        {
            return Some(Exit {
                price: level,
                signal: Signal::TakeProfit(side),
                at_open: false,
            });
        }
    }
    rule_set.exit_test(bar, prev)
}

fn open(entry: &Entry, index: usize, rule_set: &dyn RuleSet) -> TradeState {
    TradeState {
        position: entry.side.position(),
        trade_price: entry.price,
        entry_price: entry.price,
        entry_index: index,
        targets: rule_set.compute_targets(entry),
        signal: Signal::Entry(entry.side),
        volatility: entry.volatility,
    }
}

/// Per-bar realized returns of a row stream.
pub fn returns(rows: &[OutputRow]) -> Vec<f64> {
    rows.iter().map(|r| r.ret).collect()
}
