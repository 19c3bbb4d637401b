//! Bar series: ordered bars plus their attached indicator columns.

use std::collections::BTreeMap;

use crate::domain::error::StratsimError;
use crate::domain::indicator::{Column, IndicatorKey};
use crate::domain::ohlcv::Bar;

/// An ordered, read-only bar collection for one simulation run.
///
/// Timestamps are strictly increasing. Indicator columns are aligned with
/// `bars` and must already be lagged by their producer.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
    indicators: BTreeMap<IndicatorKey, Column>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Result<Self, StratsimError> {
        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(StratsimError::UnorderedBars { index: i + 1 });
        }
        Ok(Self {
            bars,
            indicators: BTreeMap::new(),
        })
    }

    /// Attach a column. Fails if its length differs from the bar count.
    pub fn attach(&mut self, key: IndicatorKey, column: Column) -> Result<(), StratsimError> {
        if column.len() != self.bars.len() {
            return Err(StratsimError::Data {
                reason: format!(
                    "indicator {} has {} values for {} bars",
                    key,
                    column.len(),
                    self.bars.len()
                ),
            });
        }
        self.indicators.insert(key, column);
        Ok(())
    }

    pub fn with_indicator(mut self, key: IndicatorKey, column: Column) -> Result<Self, StratsimError> {
        self.attach(key, column)?;
        Ok(self)
    }

    /// Check that every listed indicator is present.
    pub fn require(&self, keys: &[IndicatorKey]) -> Result<(), StratsimError> {
        match keys.iter().find(|k| !self.indicators.contains_key(*k)) {
            Some(&key) => Err(StratsimError::MissingIndicator { key }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> &Bar {
        &self.bars[index]
    }

    /// Indicator value at `index`; `None` when missing or still warming up.
    pub fn indicator(&self, key: IndicatorKey, index: usize) -> Option<f64> {
        self.indicators
            .get(&key)
            .and_then(|column| column.get(index).copied().flatten())
    }

    pub fn view(&self, index: usize) -> BarView<'_> {
        BarView {
            index,
            series: self,
        }
    }
}

/// A cursor onto one bar of a series, handed to rule sets by the fold.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    pub index: usize,
    series: &'a BarSeries,
}

impl<'a> BarView<'a> {
    pub fn bar(&self) -> &'a Bar {
        self.series.bar(self.index)
    }

    pub fn indicator(&self, key: IndicatorKey) -> Option<f64> {
        self.series.indicator(key, self.index)
    }

    pub fn open(&self) -> f64 {
        self.bar().open
    }

    pub fn high(&self) -> f64 {
        self.bar().high
    }

    pub fn low(&self) -> f64 {
        self.bar().low
    }

    pub fn close(&self) -> f64 {
        self.bar().close
    }
}
