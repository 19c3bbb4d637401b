//! Consecutive down-close reversal.
//!
//! After `down_days` consecutive lower closes, buy at the next bar's open.
//! The position is closed either at that bar's close or at the open of the
//! bar after it.

use std::fmt;
use std::str::FromStr;

use crate::domain::bar_series::BarView;
use crate::domain::indicator::IndicatorKey;
use crate::domain::position::{Side, Signal, TradeState};
use crate::domain::rule_set::{Entry, Exit, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreakExit {
    #[default]
    NextBarOpen,
    SameBarClose,
}

impl FromStr for StreakExit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "next_bar_open" | "next_day_open" => Ok(StreakExit::NextBarOpen),
            "same_bar_close" | "same_day_close" => Ok(StreakExit::SameBarClose),
            other => Err(format!(
                "unknown exit mode '{}', expected next_bar_open or same_bar_close",
                other
            )),
        }
    }
}

impl fmt::Display for StreakExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreakExit::NextBarOpen => write!(f, "next_bar_open"),
            StreakExit::SameBarClose => write!(f, "same_bar_close"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownStreakParams {
    pub down_days: usize,
    pub exit: StreakExit,
}

impl Default for DownStreakParams {
    fn default() -> Self {
        DownStreakParams {
            down_days: 3,
            exit: StreakExit::NextBarOpen,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownStreak {
    params: DownStreakParams,
}

impl DownStreak {
    pub fn new(params: DownStreakParams) -> Self {
        Self { params }
    }
}

impl RuleSet for DownStreak {
    fn name(&self) -> &'static str {
        "consecutive_down"
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        vec![IndicatorKey::DownStreak]
    }

    fn entry_test(&self, bar: BarView<'_>) -> Option<Entry> {
        let streak = bar.indicator(IndicatorKey::DownStreak)?;
        if streak < self.params.down_days as f64 {
            return None;
        }
        let entry = Entry::at(Side::Long, bar.open());
        Some(match self.params.exit {
            StreakExit::NextBarOpen => entry,
            StreakExit::SameBarClose => Entry {
                same_bar_exit: Some(bar.close()),
                ..entry
            },
        })
    }

    fn exit_test(&self, bar: BarView<'_>, state: &TradeState) -> Option<Exit> {
        let side = state.position.side()?;
        Some(Exit {
            price: bar.open(),
            signal: Signal::Exit(side),
            at_open: true,
        })
    }
}
