//! Core domain types and logic.

pub mod backtest;
pub mod bar_series;
pub mod config_validation;
pub mod error;
pub mod fold;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod optimizer;
pub mod position;
pub mod returns;
pub mod rule_set;
pub mod rules;
pub mod strategy;
