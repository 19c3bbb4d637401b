//! Configuration validation.
//!
//! Runs before any data is loaded; a run that passes never fails on a
//! parameter mid-fold.

use chrono::NaiveDate;

use crate::domain::error::StratsimError;
use crate::domain::rules::{
    ChannelBreakoutParams, DownStreakParams, OscillatorParams, TripleAverageParams,
};
use crate::domain::strategy::{StrategyConfig, StrategyParams};
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    validate_data_path(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy(strategy: &StrategyConfig) -> Result<(), StratsimError> {
    match &strategy.params {
        StrategyParams::ChannelBreakout(p) => validate_channel_breakout(p),
        StrategyParams::Oscillator(p) => validate_oscillator(p),
        StrategyParams::TripleAverage(p) => validate_triple_average(p),
        StrategyParams::ConsecutiveDown(p) => validate_down_streak(p),
    }
}

/// Parse an optional `YYYY-MM-DD` value.
pub(crate) fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, StratsimError> {
    config
        .get_string(section, key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                StratsimError::invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            })
        })
        .transpose()
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    match config.get_string("data", "path") {
        Some(_) => Ok(()),
        None => Err(StratsimError::missing("data", "path")),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratsimError> {
    let start_date = parse_date(config, "data", "start_date")?;
    let end_date = parse_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(StratsimError::invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn validate_period(section: &str, key: &str, value: usize) -> Result<(), StratsimError> {
    if value == 0 {
        return Err(StratsimError::invalid(
            section,
            key,
            format!("{} must be at least 1", key),
        ));
    }
    Ok(())
}

fn validate_positive(section: &str, key: &str, value: f64) -> Result<(), StratsimError> {
    if value <= 0.0 {
        return Err(StratsimError::invalid(
            section,
            key,
            format!("{} must be positive", key),
        ));
    }
    Ok(())
}

fn validate_channel_breakout(p: &ChannelBreakoutParams) -> Result<(), StratsimError> {
    let section = "channel_breakout";
    validate_period(section, "high_period", p.high_period)?;
    validate_period(section, "low_period", p.low_period)?;
    if p.uses_atr() {
        validate_period(section, "atr_period", p.atr_period)?;
    }
    if let Some(m) = p.stop_loss_atr {
        validate_positive(section, "stop_loss_atr", m)?;
    }
    if let Some(m) = p.take_profit_atr {
        validate_positive(section, "take_profit_atr", m)?;
    }
    if !p.channel_exit && !p.uses_atr() {
        return Err(StratsimError::invalid(
            section,
            "channel_exit",
            "no exit rule: enable channel_exit or set stop_loss_atr/take_profit_atr",
        ));
    }
    Ok(())
}

fn validate_oscillator(p: &OscillatorParams) -> Result<(), StratsimError> {
    let section = "oscillator";
    validate_period(section, "rsi_period", p.rsi_period)?;
    if !(0.0..=100.0).contains(&p.lower) {
        return Err(StratsimError::invalid(
            section,
            "lower",
            "lower must be between 0 and 100",
        ));
    }
    if !(0.0..=100.0).contains(&p.upper) {
        return Err(StratsimError::invalid(
            section,
            "upper",
            "upper must be between 0 and 100",
        ));
    }
    if p.lower >= p.upper {
        return Err(StratsimError::invalid(
            section,
            "lower",
            "lower must be below upper",
        ));
    }
    validate_positive(section, "take_profit", p.take_profit)?;
    validate_positive(section, "stop_loss", p.stop_loss)?;
    if p.stop_loss >= 1.0 {
        return Err(StratsimError::invalid(
            section,
            "stop_loss",
            "stop_loss is a fraction of the entry price and must be below 1",
        ));
    }
    Ok(())
}

fn validate_triple_average(p: &TripleAverageParams) -> Result<(), StratsimError> {
    let section = "triple_average";
    validate_period(section, "fast", p.fast)?;
    validate_period(section, "medium", p.medium)?;
    validate_period(section, "slow", p.slow)?;
    if p.fast >= p.medium {
        return Err(StratsimError::invalid(
            section,
            "fast",
            "fast must be shorter than medium",
        ));
    }
    if p.medium >= p.slow {
        return Err(StratsimError::invalid(
            section,
            "medium",
            "medium must be shorter than slow",
        ));
    }
    Ok(())
}

fn validate_down_streak(p: &DownStreakParams) -> Result<(), StratsimError> {
    validate_period("consecutive_down", "down_days", p.down_days)
}
