//! Channel breakout: enter when price crosses a lagged N-bar extreme.
//!
//! Fills are at the breached channel level, not at the bar close. Exits are
//! either the opposite channel, ATR-sized stop/target, or both.

use std::str::FromStr;

use crate::domain::bar_series::BarView;
use crate::domain::indicator::IndicatorKey;
use crate::domain::position::{BreachBasis, RiskTargets, Side, TradeState};
use crate::domain::rule_set::{Entry, Exit, RuleSet};

/// Which price must cross the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakoutTrigger {
    Close,
    /// High above the upper channel, low below the lower channel.
    Extremes,
}

impl FromStr for BreakoutTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "close" => Ok(BreakoutTrigger::Close),
            "extremes" | "high_low" => Ok(BreakoutTrigger::Extremes),
            other => Err(format!(
                "unknown trigger '{}', expected close or extremes",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBreakoutParams {
    pub high_period: usize,
    pub low_period: usize,
    pub trigger: BreakoutTrigger,
    pub allow_short: bool,
    pub channel_exit: bool,
    pub atr_period: usize,
    pub stop_loss_atr: Option<f64>,
    pub take_profit_atr: Option<f64>,
}

impl Default for ChannelBreakoutParams {
    fn default() -> Self {
        ChannelBreakoutParams {
            high_period: 20,
            low_period: 20,
            trigger: BreakoutTrigger::Close,
            allow_short: false,
            channel_exit: true,
            atr_period: 20,
            stop_loss_atr: None,
            take_profit_atr: None,
        }
    }
}

impl ChannelBreakoutParams {
    pub fn uses_atr(&self) -> bool {
        self.stop_loss_atr.is_some() || self.take_profit_atr.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ChannelBreakout {
    params: ChannelBreakoutParams,
}

impl ChannelBreakout {
    pub fn new(params: ChannelBreakoutParams) -> Self {
        Self { params }
    }

    fn upper(&self, bar: BarView<'_>) -> Option<f64> {
        bar.indicator(IndicatorKey::ChannelHigh(self.params.high_period))
    }

    fn lower(&self, bar: BarView<'_>) -> Option<f64> {
        bar.indicator(IndicatorKey::ChannelLow(self.params.low_period))
    }

    fn crossed_above(&self, bar: BarView<'_>, level: f64) -> bool {
        match self.params.trigger {
            BreakoutTrigger::Close => bar.close() > level,
            BreakoutTrigger::Extremes => bar.high() > level,
        }
    }

    fn crossed_below(&self, bar: BarView<'_>, level: f64) -> bool {
        match self.params.trigger {
            BreakoutTrigger::Close => bar.close() < level,
            BreakoutTrigger::Extremes => bar.low() < level,
        }
    }
}

impl RuleSet for ChannelBreakout {
    fn name(&self) -> &'static str {
        "channel_breakout"
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        let mut keys = vec![
            IndicatorKey::ChannelHigh(self.params.high_period),
            IndicatorKey::ChannelLow(self.params.low_period),
        ];
        if self.params.uses_atr() {
            keys.push(IndicatorKey::Atr(self.params.atr_period));
        }
        keys
    }

    fn entry_test(&self, bar: BarView<'_>) -> Option<Entry> {
        let volatility = bar.indicator(IndicatorKey::Atr(self.params.atr_period));
        // Targets cannot be sized without a volatility reading.
        if self.params.uses_atr() && volatility.is_none() {
            return None;
        }

        let entry = if let Some(upper) = self.upper(bar).filter(|&u| self.crossed_above(bar, u)) {
            Entry::at(Side::Long, upper)
        } else if let Some(lower) = self
            .lower(bar)
            .filter(|&l| self.params.allow_short && self.crossed_below(bar, l))
        {
            Entry::at(Side::Short, lower)
        } else {
            return None;
        };

        Some(Entry {
            volatility,
            ..entry
        })
    }

    fn exit_test(&self, bar: BarView<'_>, state: &TradeState) -> Option<Exit> {
        if !self.params.channel_exit {
            return None;
        }
        match state.position.side()? {
            Side::Long => self
                .lower(bar)
                .filter(|&l| self.crossed_below(bar, l))
                .map(|l| Exit::at(Side::Long, l)),
            Side::Short => self
                .upper(bar)
                .filter(|&u| self.crossed_above(bar, u))
                .map(|u| Exit::at(Side::Short, u)),
        }
    }

    fn compute_targets(&self, entry: &Entry) -> Option<RiskTargets> {
        if !self.params.uses_atr() {
            return None;
        }
        let atr = entry.volatility?;
        let offset = |mult: Option<f64>| mult.map(|m| atr * m);
        let (stop_loss, take_profit) = match entry.side {
            Side::Long => (
                offset(self.params.stop_loss_atr).map(|d| entry.price - d),
                offset(self.params.take_profit_atr).map(|d| entry.price + d),
            ),
            Side::Short => (
                offset(self.params.stop_loss_atr).map(|d| entry.price + d),
                offset(self.params.take_profit_atr).map(|d| entry.price - d),
            ),
        };
        Some(RiskTargets {
            stop_loss,
            take_profit,
            basis: BreachBasis::Close,
        })
    }
}
