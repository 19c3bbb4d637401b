//! Performance metrics over a fold's output rows.

use crate::domain::fold::OutputRow;
use crate::domain::position::Side;
use crate::domain::returns::{equity_curve, realized_return, total_return, ReturnConvention};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One round trip reconstructed from the row stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Simple return of the trade, sign-adjusted for side.
    pub ret: f64,
}

impl ClosedTrade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Every closed leg in row order.
pub fn extract_trades(rows: &[OutputRow]) -> Vec<ClosedTrade> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let leg = row.closed?;
            Some(ClosedTrade {
                side: leg.side,
                entry_index: leg.entry_index,
                exit_index: i,
                entry_price: leg.entry_price,
                exit_price: leg.exit_price,
                ret: realized_return(
                    leg.side,
                    leg.entry_price,
                    leg.exit_price,
                    ReturnConvention::Arithmetic,
                ),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior equity peak.
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_bars_held: f64,
}

impl Metrics {
    pub fn compute(rows: &[OutputRow], convention: ReturnConvention) -> Self {
        let returns: Vec<f64> = rows.iter().map(|r| r.ret).collect();
        let total_return = total_return(&returns, convention);

        let years = rows.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return.is_finite() && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let equity = equity_curve(&returns, convention);
        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&equity);

        let simple: Vec<f64> = returns.iter().map(|&r| convention.to_simple(r)).collect();
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&simple);

        let trades = extract_trades(rows);
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_bars_held = 0usize;

        for trade in &trades {
            let ret = trade.ret;
            if ret > 0.0 {
                trades_won += 1;
                total_wins += ret;
                largest_win = largest_win.max(ret);
            } else if ret < 0.0 {
                trades_lost += 1;
                total_losses += ret.abs();
                largest_loss = largest_loss.max(ret.abs());
            } else {
                trades_breakeven += 1;
            }
            total_bars_held += trade.bars_held();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_bars_held = if total_trades > 0 {
            total_bars_held as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_return,
            annualized_return,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_bars_held,
        }
    }
}

fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    let Some(&first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0usize;
    let mut current_dd_duration = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

/// Annualized Sharpe and Sortino of per-bar simple returns.
fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let sharpe = if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum();
    let downside_stddev = (downside / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (mean / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
