//! Strategy rule set capability consumed by the fold.
//!
//! A rule set answers three questions about the current bar: should a flat
//! book open a position, should an open position close on its own signal,
//! and where do stop-loss/take-profit sit for a fresh entry. The fold owns
//! everything else (state, priority of stop over target over signal, return
//! bookkeeping), so a new strategy is a new implementation of this trait.

use crate::domain::bar_series::BarView;
use crate::domain::indicator::IndicatorKey;
use crate::domain::position::{RiskTargets, Side, Signal, TradeState};

/// An entry decision for the current bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub side: Side,
    /// Fill price: the breached level for breakouts, the close or open otherwise.
    pub price: f64,
    /// Volatility observed at entry, kept for target sizing.
    pub volatility: Option<f64>,
    /// Close the position again inside the entry bar at this price.
    pub same_bar_exit: Option<f64>,
}

impl Entry {
    pub fn at(side: Side, price: f64) -> Self {
        Entry {
            side,
            price,
            volatility: None,
            same_bar_exit: None,
        }
    }
}

/// A rule-defined exit decision for the current bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub price: f64,
    pub signal: Signal,
    /// Filled at the bar open; the rest of the bar may open a new position.
    pub at_open: bool,
}

impl Exit {
    pub fn at(side: Side, price: f64) -> Self {
        Exit {
            price,
            signal: Signal::Exit(side),
            at_open: false,
        }
    }
}

pub trait RuleSet: Send + Sync {
    fn name(&self) -> &'static str;

    /// Indicator columns this rule set reads; checked before the fold starts.
    fn required_indicators(&self) -> Vec<IndicatorKey>;

    fn entry_test(&self, bar: BarView<'_>) -> Option<Entry>;

    fn exit_test(&self, bar: BarView<'_>, state: &TradeState) -> Option<Exit>;

    /// Stop-loss/take-profit for a new entry, fixed until the position closes.
    fn compute_targets(&self, _entry: &Entry) -> Option<RiskTargets> {
        None
    }
}
