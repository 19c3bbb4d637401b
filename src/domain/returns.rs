//! Return accumulator: pure folds over per-bar returns.
//!
//! Arithmetic: cumulative = Π(1 + r) - 1.
//! Logarithmic: cumulative = exp(Σ r) - 1, so both conventions report the
//! same simple-return scale.

use std::fmt;
use std::str::FromStr;

use crate::domain::ohlcv::Bar;
use crate::domain::position::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReturnConvention {
    #[default]
    Arithmetic,
    Logarithmic,
}

impl FromStr for ReturnConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "arithmetic" | "simple" => Ok(ReturnConvention::Arithmetic),
            "log" | "logarithmic" => Ok(ReturnConvention::Logarithmic),
            other => Err(format!(
                "unknown return convention '{}', expected arithmetic or log",
                other
            )),
        }
    }
}

impl fmt::Display for ReturnConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnConvention::Arithmetic => write!(f, "arithmetic"),
            ReturnConvention::Logarithmic => write!(f, "log"),
        }
    }
}

impl ReturnConvention {
    /// Return of moving from `from` to `to`, unsigned by side.
    pub fn price_return(self, from: f64, to: f64) -> f64 {
        match self {
            ReturnConvention::Arithmetic => to / from - 1.0,
            ReturnConvention::Logarithmic => (to / from).ln(),
        }
    }

    /// Convert one per-bar return in this convention to a simple return.
    pub fn to_simple(self, r: f64) -> f64 {
        match self {
            ReturnConvention::Arithmetic => r,
            ReturnConvention::Logarithmic => r.exp() - 1.0,
        }
    }
}

/// Realized return of a closed leg. Shorts earn the negated price return.
pub fn realized_return(side: Side, entry: f64, exit: f64, convention: ReturnConvention) -> f64 {
    let raw = convention.price_return(entry, exit);
    match side {
        Side::Long => raw,
        Side::Short => -raw,
    }
}

/// Cumulative simple return of a per-bar return stream.
pub fn total_return(returns: &[f64], convention: ReturnConvention) -> f64 {
    growth_factor(returns, convention) - 1.0
}

/// Growth of one unit over the stream (`1 + total_return`).
pub fn growth_factor(returns: &[f64], convention: ReturnConvention) -> f64 {
    match convention {
        ReturnConvention::Arithmetic => returns.iter().map(|r| 1.0 + r).product(),
        ReturnConvention::Logarithmic => returns.iter().sum::<f64>().exp(),
    }
}

/// Growth-of-one value after each bar.
pub fn equity_curve(returns: &[f64], convention: ReturnConvention) -> Vec<f64> {
    match convention {
        ReturnConvention::Arithmetic => returns
            .iter()
            .scan(1.0, |equity, r| {
                *equity *= 1.0 + r;
                Some(*equity)
            })
            .collect(),
        ReturnConvention::Logarithmic => returns
            .iter()
            .scan(0.0, |sum, r| {
                *sum += r;
                Some(sum.exp())
            })
            .collect(),
    }
}

/// Close-to-close buy-and-hold returns; bar 0 has no prior close and is zero.
pub fn benchmark_returns(bars: &[Bar], convention: ReturnConvention) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                0.0
            } else {
                convention.price_return(bars[i - 1].close, bar.close)
            }
        })
        .collect()
}
