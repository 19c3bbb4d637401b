//! Oscillator mean reversion with fixed percentage stop-loss/take-profit.
//!
//! Long when RSI is at or below `lower`, filled at the close. While long,
//! the stop and target are tested against the bar's low/high; otherwise RSI
//! at or above `upper` exits at the close.

use crate::domain::bar_series::BarView;
use crate::domain::indicator::IndicatorKey;
use crate::domain::position::{BreachBasis, RiskTargets, Side, TradeState};
use crate::domain::rule_set::{Entry, Exit, RuleSet};

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorParams {
    pub rsi_period: usize,
    pub lower: f64,
    pub upper: f64,
    /// Fraction above entry, e.g. 0.05 for +5%.
    pub take_profit: f64,
    /// Fraction below entry, e.g. 0.02 for -2%.
    pub stop_loss: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        OscillatorParams {
            rsi_period: 14,
            lower: 30.0,
            upper: 70.0,
            take_profit: 0.05,
            stop_loss: 0.02,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    params: OscillatorParams,
}

impl Oscillator {
    pub fn new(params: OscillatorParams) -> Self {
        Self { params }
    }

    fn rsi(&self, bar: BarView<'_>) -> Option<f64> {
        bar.indicator(IndicatorKey::Rsi(self.params.rsi_period))
    }
}

impl RuleSet for Oscillator {
    fn name(&self) -> &'static str {
        "oscillator"
    }

    fn required_indicators(&self) -> Vec<IndicatorKey> {
        vec![IndicatorKey::Rsi(self.params.rsi_period)]
    }

    fn entry_test(&self, bar: BarView<'_>) -> Option<Entry> {
        self.rsi(bar)
            .filter(|&rsi| rsi <= self.params.lower)
            .map(|_| Entry::at(Side::Long, bar.close()))
    }

    fn exit_test(&self, bar: BarView<'_>, _state: &TradeState) -> Option<Exit> {
        self.rsi(bar)
            .filter(|&rsi| rsi >= self.params.upper)
            .map(|_| Exit::at(Side::Long, bar.close()))
    }

    fn compute_targets(&self, entry: &Entry) -> Option<RiskTargets> {
        Some(RiskTargets {
            stop_loss: Some(entry.price * (1.0 - self.params.stop_loss)),
            take_profit: Some(entry.price * (1.0 + self.params.take_profit)),
            basis: BreachBasis::Intrabar,
        })
    }
}
