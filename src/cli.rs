//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::error::StratsimError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::Bar;
use crate::domain::optimizer::{self, ParamGrid};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratsim", about = "Sequential strategy backtester")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Row export path, overrides `[backtest] output`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a parameter grid search over the `[optimize]` section
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration without loading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest { config, output } => run_backtest(&config, output.as_ref()),
        Command::Optimize { config } => run_optimize(&config),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StratsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn report(err: StratsimError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Relative data paths are taken from the config file's directory.
fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn load_run(config_path: &Path) -> Result<(FileConfigAdapter, BacktestConfig, Vec<Bar>), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let bt_config = BacktestConfig::from_config(&adapter).map_err(report)?;

    let data_port = CsvAdapter::new(config_dir(config_path));
    let bars = data_port
        .load_bars(&bt_config.data_path, bt_config.start_date, bt_config.end_date)
        .map_err(report)?;
    eprintln!(
        "Loaded {} bars from {}",
        bars.len(),
        bt_config.data_path.display()
    );
    Ok((adapter, bt_config, bars))
}

fn run_backtest(config_path: &Path, output_override: Option<&PathBuf>) -> ExitCode {
    let (_adapter, bt_config, bars) = match load_run(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    eprintln!(
        "Running backtest: {} ({} returns)",
        bt_config.strategy.name(),
        bt_config.strategy.convention
    );
    let result = match backtest_engine::run_backtest(&bars, &bt_config.strategy) {
        Ok(r) => r,
        Err(e) => return report(e),
    };

    print_metrics(&result.metrics, result.benchmark_return);

    let output = output_override
        .cloned()
        .or_else(|| bt_config.output.map(|p| config_dir(config_path).join(p)));
    if let Some(output) = output {
        if let Err(e) = CsvReportAdapter::new().write(&result, &output) {
            return report(e);
        }
        eprintln!("\nRows written to: {}", output.display());
    }
    ExitCode::SUCCESS
}

fn print_metrics(metrics: &Metrics, benchmark_return: f64) {
    eprintln!("\n=== Results ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Buy and Hold:     {:.2}%", benchmark_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        metrics.annualized_return * 100.0
    );
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!(
        "Max Drawdown:     -{:.1}% ({} bars)",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    );
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Bars Held:    {:.1}", metrics.avg_bars_held);
}

fn run_optimize(config_path: &Path) -> ExitCode {
    let (adapter, bt_config, bars) = match load_run(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let grid = match ParamGrid::from_config(&adapter, &bt_config.strategy) {
        Ok(g) => g,
        Err(e) => return report(e),
    };

    eprintln!(
        "Optimizing {}: {} combinations",
        bt_config.strategy.name(),
        grid.size()
    );
    let result = match optimizer::optimize(&bars, &bt_config.strategy, &grid) {
        Ok(r) => r,
        Err(e) => return report(e),
    };

    eprintln!("\n=== Grid ===");
    for (key, value) in &result.results {
        eprintln!("  {key}: {value:.4}");
    }
    if !result.skipped.is_empty() {
        eprintln!("\nSkipped {} invalid combinations:", result.skipped.len());
        for key in &result.skipped {
            eprintln!("  {key}");
        }
    }

    match result.best_value {
        Some(best) => {
            eprintln!("\nBest growth factor: {best:.4}");
            for key in &result.best_keys {
                eprintln!("  {key}");
            }
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("error: no combination produced a score");
            ExitCode::from(2)
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match BacktestConfig::from_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(e),
    };
    let grid = match ParamGrid::from_config(&adapter, &bt_config.strategy) {
        Ok(g) => g,
        Err(e) => return report(e),
    };

    eprintln!("\nStrategy: {}", bt_config.strategy.name());
    eprintln!("  return convention: {}", bt_config.strategy.convention);
    eprintln!(
        "  parameters: {}",
        bt_config.strategy.params.param_names().join(", ")
    );
    eprintln!("\nData: {}", bt_config.data_path.display());
    if let Some(start) = bt_config.start_date {
        eprintln!("  from {start}");
    }
    if let Some(end) = bt_config.end_date {
        eprintln!("  to   {end}");
    }
    if !grid.is_empty() {
        eprintln!("\nOptimize grid: {} combinations", grid.size());
        for axis in grid.axes() {
            eprintln!("  {} = {}", axis.name, axis.values.join(", "));
        }
    }

    eprintln!("\nConfig is valid");
    ExitCode::SUCCESS
}
