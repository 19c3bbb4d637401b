//! Indicator producers feeding the bar series.
//!
//! Every producer returns a [`Column`] aligned with its input bars and lagged
//! by one bar: the value at index `i` is computed from bars `< i` only.
//! Warm-up bars are `None`, never a numeric placeholder.

pub mod atr;
pub mod channel;
pub mod rsi;
pub mod sma;
pub mod streak;

use std::fmt;

use crate::domain::ohlcv::Bar;

/// One indicator value per bar; `None` while the indicator is unavailable.
pub type Column = Vec<Option<f64>>;

/// Indicator identity plus parameters, used as the bar series column key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKey {
    ChannelHigh(usize),
    ChannelLow(usize),
    Atr(usize),
    Rsi(usize),
    Sma(usize),
    DownStreak,
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::ChannelHigh(period) => write!(f, "CHANNEL_HIGH({})", period),
            IndicatorKey::ChannelLow(period) => write!(f, "CHANNEL_LOW({})", period),
            IndicatorKey::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKey::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKey::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKey::DownStreak => write!(f, "DOWN_STREAK"),
        }
    }
}

/// Compute the column identified by `key`.
pub fn produce(key: IndicatorKey, bars: &[Bar]) -> Column {
    match key {
        IndicatorKey::ChannelHigh(period) => channel::channel_high(bars, period),
        IndicatorKey::ChannelLow(period) => channel::channel_low(bars, period),
        IndicatorKey::Atr(period) => atr::atr(bars, period),
        IndicatorKey::Rsi(period) => rsi::rsi(bars, period),
        IndicatorKey::Sma(period) => sma::sma(bars, period),
        IndicatorKey::DownStreak => streak::down_streak(bars),
    }
}

/// Shift a same-bar column one bar later so index `i` only sees bars `< i`.
pub fn lag(column: Column) -> Column {
    if column.is_empty() {
        return column;
    }
    let mut lagged = Vec::with_capacity(column.len());
    lagged.push(None);
    lagged.extend_from_slice(&column[..column.len() - 1]);
    lagged
}
