//! Backtest run: configuration, series preparation, fold and reduction.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::config_validation::{parse_date, validate_data_config};
use crate::domain::error::StratsimError;
use crate::domain::fold::{self, OutputRow};
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::Bar;
use crate::domain::returns::{benchmark_returns, equity_curve, total_return};
use crate::domain::strategy::{prepare_series, StrategyConfig};
use crate::ports::config_port::ConfigPort;

/// Everything one run needs, read from the `[data]` and `[backtest]` sections.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub data_path: PathBuf,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub output: Option<PathBuf>,
    pub strategy: StrategyConfig,
}

impl BacktestConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratsimError> {
        validate_data_config(config)?;
        let data_path = config
            .get_string("data", "path")
            .map(PathBuf::from)
            .ok_or_else(|| StratsimError::missing("data", "path"))?;
        Ok(BacktestConfig {
            data_path,
            start_date: parse_date(config, "data", "start_date")?,
            end_date: parse_date(config, "data", "end_date")?,
            output: config.get_string("backtest", "output").map(PathBuf::from),
            strategy: StrategyConfig::from_config(config)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub rows: Vec<OutputRow>,
    /// Growth of one unit after each row.
    pub equity: Vec<f64>,
    /// Buy-and-hold per-bar returns under the run's convention.
    pub benchmark: Vec<f64>,
    pub benchmark_return: f64,
    pub metrics: Metrics,
}

/// Prepare the series and run the fold.
pub fn simulate(bars: &[Bar], strategy: &StrategyConfig) -> Result<Vec<OutputRow>, StratsimError> {
    let series = prepare_series(bars, strategy)?;
    let rule_set = strategy.build_rule_set();
    fold::run(&series, rule_set.as_ref(), strategy.convention)
}

pub fn run_backtest(bars: &[Bar], strategy: &StrategyConfig) -> Result<BacktestResult, StratsimError> {
    info!(
        strategy = strategy.name(),
        convention = %strategy.convention,
        bars = bars.len(),
        "starting backtest"
    );
    let rows = simulate(bars, strategy)?;
    let equity = equity_curve(&fold::returns(&rows), strategy.convention);
    let benchmark = benchmark_returns(bars, strategy.convention);
    let benchmark_return = total_return(&benchmark, strategy.convention);
    let metrics = Metrics::compute(&rows, strategy.convention);
    info!(
        total_return = metrics.total_return,
        trades = metrics.total_trades,
        "backtest finished"
    );
    Ok(BacktestResult {
        rows,
        equity,
        benchmark,
        benchmark_return,
        metrics,
    })
}
