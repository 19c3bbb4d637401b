//! Position, trade state and risk levels carried through the fold.

use std::fmt;

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn position(self) -> Position {
        match self {
            Side::Long => Position::Long,
            Side::Short => Position::Short,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

impl Position {
    pub fn side(self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Long => Some(Side::Long),
            Position::Short => Some(Side::Short),
        }
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Flat => write!(f, "flat"),
            Position::Long => write!(f, "long"),
            Position::Short => write!(f, "short"),
        }
    }
}

/// Signal label attached to each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    #[default]
    None,
    Entry(Side),
    StopLoss(Side),
    TakeProfit(Side),
    Exit(Side),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::None => Ok(()),
            Signal::Entry(side) => write!(f, "Entry {}", side),
            Signal::StopLoss(side) => write!(f, "SL {}", side),
            Signal::TakeProfit(side) => write!(f, "TP {}", side),
            Signal::Exit(side) => write!(f, "Exit {}", side),
        }
    }
}

/// Which prices a stop or target is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachBasis {
    /// Close only, inclusive of the level.
    Close,
    /// High/low range, strictly beyond the level.
    Intrabar,
}

/// Stop-loss and take-profit levels fixed at entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskTargets {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub basis: BreachBasis,
}

impl RiskTargets {
    pub fn stop_breached(&self, side: Side, bar: &Bar) -> bool {
        let Some(level) = self.stop_loss else {
            return false;
        };
        match (side, self.basis) {
            (Side::Long, BreachBasis::Close) => bar.close <= level,
            (Side::Long, BreachBasis::Intrabar) => bar.low < level,
            (Side::Short, BreachBasis::Close) => bar.close >= level,
            (Side::Short, BreachBasis::Intrabar) => bar.high > level,
        }
    }

    pub fn target_breached(&self, side: Side, bar: &Bar) -> bool {
        let Some(level) = self.take_profit else {
            return false;
        };
        match (side, self.basis) {
            (Side::Long, BreachBasis::Close) => bar.close >= level,
            (Side::Long, BreachBasis::Intrabar) => bar.high > level,
            (Side::Short, BreachBasis::Close) => bar.close <= level,
            (Side::Short, BreachBasis::Intrabar) => bar.low < level,
        }
    }
}

/// State threaded through the fold. Owned by the step function only.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeState {
    pub position: Position,
    pub trade_price: f64,
    pub entry_price: f64,
    pub entry_index: usize,
    pub targets: Option<RiskTargets>,
    pub signal: Signal,
    /// Volatility measure captured at entry (e.g. ATR), if the rule set used one.
    pub volatility: Option<f64>,
}

impl TradeState {
    pub fn seed() -> Self {
        TradeState {
            position: Position::Flat,
            trade_price: 0.0,
            entry_price: 0.0,
            entry_index: 0,
            targets: None,
            signal: Signal::None,
            volatility: None,
        }
    }

    pub fn flat(trade_price: f64, signal: Signal) -> Self {
        TradeState {
            trade_price,
            signal,
            ..Self::seed()
        }
    }
}

/// A position closed on a given row, with what it was opened at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedLeg {
    pub side: Side,
    pub entry_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
}
