//! Strategy configuration: which rule set to run and with what parameters.
//!
//! Every parameter is set through [`StrategyConfig::with_param`], both when
//! reading the INI section of the chosen strategy and when the optimizer
//! applies one grid combination.

use tracing::debug;

use crate::domain::bar_series::BarSeries;
use crate::domain::config_validation::validate_strategy;
use crate::domain::error::StratsimError;
use crate::domain::indicator;
use crate::domain::ohlcv::Bar;
use crate::domain::returns::ReturnConvention;
use crate::domain::rule_set::RuleSet;
use crate::domain::rules::{
    ChannelBreakout, ChannelBreakoutParams, DownStreak, DownStreakParams, Oscillator,
    OscillatorParams, TripleAverage, TripleAverageParams,
};
use crate::ports::config_port::ConfigPort;

pub const STRATEGY_NAMES: [&str; 4] = [
    "channel_breakout",
    "oscillator",
    "triple_average",
    "consecutive_down",
];

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyParams {
    ChannelBreakout(ChannelBreakoutParams),
    Oscillator(OscillatorParams),
    TripleAverage(TripleAverageParams),
    ConsecutiveDown(DownStreakParams),
}

impl StrategyParams {
    /// Default parameters for a strategy by name.
    pub fn defaults_for(name: &str) -> Result<Self, StratsimError> {
        match name.trim().to_lowercase().as_str() {
            "channel_breakout" => Ok(StrategyParams::ChannelBreakout(Default::default())),
            "oscillator" => Ok(StrategyParams::Oscillator(Default::default())),
            "triple_average" => Ok(StrategyParams::TripleAverage(Default::default())),
            "consecutive_down" => Ok(StrategyParams::ConsecutiveDown(Default::default())),
            _ => Err(StratsimError::UnknownStrategy {
                name: name.to_string(),
            }),
        }
    }

    /// Strategy name, also the INI section holding its parameters.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyParams::ChannelBreakout(_) => "channel_breakout",
            StrategyParams::Oscillator(_) => "oscillator",
            StrategyParams::TripleAverage(_) => "triple_average",
            StrategyParams::ConsecutiveDown(_) => "consecutive_down",
        }
    }

    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            StrategyParams::ChannelBreakout(_) => &[
                "high_period",
                "low_period",
                "trigger",
                "allow_short",
                "channel_exit",
                "atr_period",
                "stop_loss_atr",
                "take_profit_atr",
            ],
            StrategyParams::Oscillator(_) => {
                &["rsi_period", "lower", "upper", "take_profit", "stop_loss"]
            }
            StrategyParams::TripleAverage(_) => &["fast", "medium", "slow", "allow_short"],
            StrategyParams::ConsecutiveDown(_) => &["down_days", "exit"],
        }
    }

    /// Oscillator and down-streak runs accumulate log returns; price-level
    /// strategies compound simple returns.
    pub fn default_convention(&self) -> ReturnConvention {
        match self {
            StrategyParams::Oscillator(_) | StrategyParams::ConsecutiveDown(_) => {
                ReturnConvention::Logarithmic
            }
            StrategyParams::ChannelBreakout(_) | StrategyParams::TripleAverage(_) => {
                ReturnConvention::Arithmetic
            }
        }
    }

    pub fn build_rule_set(&self) -> Box<dyn RuleSet> {
        match self {
            StrategyParams::ChannelBreakout(p) => Box::new(ChannelBreakout::new(p.clone())),
            StrategyParams::Oscillator(p) => Box::new(Oscillator::new(p.clone())),
            StrategyParams::TripleAverage(p) => Box::new(TripleAverage::new(p.clone())),
            StrategyParams::ConsecutiveDown(p) => Box::new(DownStreak::new(p.clone())),
        }
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), StratsimError> {
        let section = self.name();
        match self {
            StrategyParams::ChannelBreakout(p) => match name {
                "high_period" => p.high_period = parse_period(section, name, value)?,
                "low_period" => p.low_period = parse_period(section, name, value)?,
                "trigger" => p.trigger = parse_with(section, name, value)?,
                "allow_short" => p.allow_short = parse_bool(section, name, value)?,
                "channel_exit" => p.channel_exit = parse_bool(section, name, value)?,
                "atr_period" => p.atr_period = parse_period(section, name, value)?,
                "stop_loss_atr" => p.stop_loss_atr = parse_optional_f64(section, name, value)?,
                "take_profit_atr" => {
                    p.take_profit_atr = parse_optional_f64(section, name, value)?
                }
                _ => return Err(unknown_param(section, name)),
            },
            StrategyParams::Oscillator(p) => match name {
                "rsi_period" => p.rsi_period = parse_period(section, name, value)?,
                "lower" => p.lower = parse_f64(section, name, value)?,
                "upper" => p.upper = parse_f64(section, name, value)?,
                "take_profit" => p.take_profit = parse_f64(section, name, value)?,
                "stop_loss" => p.stop_loss = parse_f64(section, name, value)?,
                _ => return Err(unknown_param(section, name)),
            },
            StrategyParams::TripleAverage(p) => match name {
                "fast" => p.fast = parse_period(section, name, value)?,
                "medium" => p.medium = parse_period(section, name, value)?,
                "slow" => p.slow = parse_period(section, name, value)?,
                "allow_short" => p.allow_short = parse_bool(section, name, value)?,
                _ => return Err(unknown_param(section, name)),
            },
            StrategyParams::ConsecutiveDown(p) => match name {
                "down_days" => p.down_days = parse_period(section, name, value)?,
                "exit" => p.exit = parse_with(section, name, value)?,
                _ => return Err(unknown_param(section, name)),
            },
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub params: StrategyParams,
    pub convention: ReturnConvention,
}

impl StrategyConfig {
    /// Wrap parameters with their family's default return convention.
    pub fn new(params: StrategyParams) -> Self {
        let convention = params.default_convention();
        Self { params, convention }
    }

    /// Read `[backtest] strategy`/`return_convention` and the strategy's own
    /// section, then validate the result.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratsimError> {
        let name = config
            .get_string("backtest", "strategy")
            .ok_or_else(|| StratsimError::missing("backtest", "strategy"))?;
        let mut strategy = StrategyConfig::new(StrategyParams::defaults_for(&name)?);

        if let Some(value) = config.get_string("backtest", "return_convention") {
            strategy.convention = value
                .parse()
                .map_err(|reason: String| StratsimError::invalid("backtest", "return_convention", reason))?;
        }

        let section = strategy.params.name();
        for key in config.keys(section) {
            if let Some(value) = config.get_string(section, &key) {
                strategy.params.set(&key, &value)?;
            }
        }

        validate_strategy(&strategy)?;
        Ok(strategy)
    }

    /// Copy with one parameter replaced. Parses but does not range-check.
    pub fn with_param(&self, name: &str, value: &str) -> Result<Self, StratsimError> {
        let mut next = self.clone();
        next.params.set(name, value)?;
        Ok(next)
    }

    pub fn name(&self) -> &'static str {
        self.params.name()
    }

    pub fn build_rule_set(&self) -> Box<dyn RuleSet> {
        self.params.build_rule_set()
    }
}

/// Build a bar series carrying exactly the indicators the strategy reads.
pub fn prepare_series(bars: &[Bar], strategy: &StrategyConfig) -> Result<BarSeries, StratsimError> {
    let mut series = BarSeries::new(bars.to_vec())?;
    let rule_set = strategy.build_rule_set();
    for key in rule_set.required_indicators() {
        let column = indicator::produce(key, series.bars());
        series.attach(key, column)?;
    }
    debug!(
        rule_set = rule_set.name(),
        bars = series.len(),
        "prepared bar series"
    );
    Ok(series)
}

fn unknown_param(section: &str, name: &str) -> StratsimError {
    StratsimError::invalid(section, name, "unknown parameter")
}

fn parse_period(section: &str, key: &str, value: &str) -> Result<usize, StratsimError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| StratsimError::invalid(section, key, format!("expected a whole number, got '{}'", value)))
}

fn parse_f64(section: &str, key: &str, value: &str) -> Result<f64, StratsimError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StratsimError::invalid(section, key, format!("expected a number, got '{}'", value)))
}

fn parse_optional_f64(section: &str, key: &str, value: &str) -> Result<Option<f64>, StratsimError> {
    match value.trim().to_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        _ => parse_f64(section, key, value).map(Some),
    }
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, StratsimError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(StratsimError::invalid(
            section,
            key,
            format!("expected true or false, got '{}'", value),
        )),
    }
}

fn parse_with<T>(section: &str, key: &str, value: &str) -> Result<T, StratsimError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|reason: String| StratsimError::invalid(section, key, reason))
}
