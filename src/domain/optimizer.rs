//! Parameter grid search.
//!
//! Each grid combination is an independent run over the same bars; runs are
//! executed in parallel and reduced to one growth factor each.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::backtest::simulate;
use crate::domain::config_validation::validate_strategy;
use crate::domain::error::StratsimError;
use crate::domain::fold;
use crate::domain::ohlcv::Bar;
use crate::domain::returns::growth_factor;
use crate::domain::strategy::StrategyConfig;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "optimize";

/// Upper bound on the values one range may expand to.
pub const MAX_RANGE_VALUES: usize = 10_000;

/// One parameter and the values to try for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamAxis {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<ParamAxis>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis(mut self, name: &str, values: &[&str]) -> Self {
        self.axes.push(ParamAxis {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Read the `[optimize]` section. Every key must name a parameter of the
    /// base strategy and every value must parse for it.
    pub fn from_config(
        config: &dyn ConfigPort,
        base: &StrategyConfig,
    ) -> Result<Self, StratsimError> {
        let mut axes = Vec::new();
        for name in config.keys(SECTION) {
            if !base.params.param_names().contains(&name.as_str()) {
                return Err(StratsimError::invalid(
                    SECTION,
                    &name,
                    format!("not a parameter of {}", base.name()),
                ));
            }
            let raw = config
                .get_string(SECTION, &name)
                .ok_or_else(|| StratsimError::missing(SECTION, &name))?;
            let values = parse_values(&name, &raw)?;
            for value in &values {
                base.with_param(&name, value)?;
            }
            axes.push(ParamAxis { name, values });
        }
        Ok(Self { axes })
    }

    pub fn axes(&self) -> &[ParamAxis] {
        &self.axes
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Number of combinations before validation.
    pub fn size(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Cartesian product of the axes, first axis varying slowest.
    pub fn combinations(&self) -> Vec<Vec<(&str, &str)>> {
        self.axes.iter().fold(vec![Vec::new()], |acc, axis| {
            acc.iter()
                .flat_map(|prefix| {
                    axis.values.iter().map(move |value| {
                        let mut combo = prefix.clone();
                        combo.push((axis.name.as_str(), value.as_str()));
                        combo
                    })
                })
                .collect()
        })
    }
}

/// Parse `a,b,c` or an inclusive `start..end:step` range (step defaults to 1).
pub fn parse_values(name: &str, raw: &str) -> Result<Vec<String>, StratsimError> {
    let raw = raw.trim();
    if let Some((start, rest)) = raw.split_once("..") {
        let (end, step) = rest.split_once(':').unwrap_or((rest, "1"));
        return expand_range(name, start.trim(), end.trim(), step.trim());
    }

    let values: Vec<String> = raw
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(StratsimError::invalid(SECTION, name, "no values given"));
    }
    Ok(values)
}

fn expand_range(name: &str, start: &str, end: &str, step: &str) -> Result<Vec<String>, StratsimError> {
    let bad = |what: &str| {
        StratsimError::invalid(
            SECTION,
            name,
            format!("{} in range '{}..{}:{}'", what, start, end, step),
        )
    };
    let parse = |s: &str| s.parse::<f64>().ok().filter(|v| v.is_finite());
    let (Some(lo), Some(hi), Some(by)) = (parse(start), parse(end), parse(step)) else {
        return Err(bad("non-numeric bound"));
    };
    if by <= 0.0 {
        return Err(bad("step must be positive"));
    }
    if hi < lo {
        return Err(bad("end before start"));
    }

    let decimals = [start, end, step]
        .iter()
        .map(|s| s.split_once('.').map_or(0, |(_, frac)| frac.len()))
        .max()
        .unwrap_or(0);
    let steps = ((hi - lo) / by + 1e-9).floor();
    if steps.is_nan() || steps >= MAX_RANGE_VALUES as f64 {
        return Err(bad(&format!("more than {} values", MAX_RANGE_VALUES)));
    }
    let count = steps as usize + 1;
    Ok((0..count)
        .map(|k| format!("{:.*}", decimals, lo + k as f64 * by))
        .collect())
}

/// Stable name of a combination, e.g. `high_period20_low_period10`.
pub fn combination_key(combo: &[(&str, &str)]) -> String {
    if combo.is_empty() {
        return "base".to_string();
    }
    combo
        .iter()
        .map(|(name, value)| format!("{}{}", name, value))
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone)]
pub struct Candidate {
    pub key: String,
    pub strategy: StrategyConfig,
}

/// Apply every combination to `base`; combinations that fail validation are
/// returned separately by key.
pub fn generate_candidates(
    grid: &ParamGrid,
    base: &StrategyConfig,
) -> Result<(Vec<Candidate>, Vec<String>), StratsimError> {
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();
    for combo in grid.combinations() {
        let key = combination_key(&combo);
        let mut strategy = base.clone();
        for (name, value) in &combo {
            strategy = strategy.with_param(name, value)?;
        }
        match validate_strategy(&strategy) {
            Ok(()) => candidates.push(Candidate { key, strategy }),
            Err(e) => {
                warn!(combination = %key, error = %e, "skipping invalid combination");
                skipped.push(key);
            }
        }
    }
    Ok((candidates, skipped))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Growth factor per combination key.
    pub results: BTreeMap<String, f64>,
    pub skipped: Vec<String>,
    pub best_value: Option<f64>,
    /// Every key scoring exactly `best_value`, in key order.
    pub best_keys: Vec<String>,
}

impl OptimizationResult {
    fn from_scores(results: BTreeMap<String, f64>, skipped: Vec<String>) -> Self {
        let best_value = results
            .values()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))));
        let best_keys = match best_value {
            Some(best) => results
                .iter()
                .filter(|&(_, &v)| v == best)
                .map(|(k, _)| k.clone())
                .collect(),
            None => Vec::new(),
        };
        OptimizationResult {
            results,
            skipped,
            best_value,
            best_keys,
        }
    }
}

pub fn optimize(
    bars: &[Bar],
    base: &StrategyConfig,
    grid: &ParamGrid,
) -> Result<OptimizationResult, StratsimError> {
    let (candidates, skipped) = generate_candidates(grid, base)?;
    info!(
        strategy = base.name(),
        combinations = candidates.len(),
        skipped = skipped.len(),
        "starting grid search"
    );

    let scores = candidates
        .par_iter()
        .map(|candidate| -> Result<(String, f64), StratsimError> {
            let rows = simulate(bars, &candidate.strategy)?;
            let score = growth_factor(&fold::returns(&rows), candidate.strategy.convention);
            debug!(combination = %candidate.key, score, "evaluated combination");
            Ok((candidate.key.clone(), score))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let result = OptimizationResult::from_scores(scores, skipped);
    if let Some(best) = result.best_value {
        info!(best = best, keys = ?result.best_keys, "grid search finished");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::rules::TripleAverageParams;
    use crate::domain::strategy::StrategyParams;
    use chrono::NaiveDate;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: None,
            })
            .collect()
    }

    fn channel_base() -> StrategyConfig {
        StrategyConfig::new(StrategyParams::ChannelBreakout(Default::default()))
    }

    #[test]
    fn parses_value_lists() {
        assert_eq!(parse_values("x", "10, 20,30").unwrap(), vec!["10", "20", "30"]);
        assert!(parse_values("x", " , ").is_err());
    }

    #[test]
    fn parses_inclusive_ranges() {
        assert_eq!(parse_values("x", "10..25:5").unwrap(), vec!["10", "15", "20", "25"]);
        assert_eq!(parse_values("x", "2..4").unwrap(), vec!["2", "3", "4"]);
        assert_eq!(parse_values("x", "10..24:5").unwrap(), vec!["10", "15", "20"]);
        assert_eq!(
            parse_values("x", "0.01..0.03:0.01").unwrap(),
            vec!["0.01", "0.02", "0.03"]
        );
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(parse_values("x", "10..5:1").is_err());
        assert!(parse_values("x", "1..5:0").is_err());
        assert!(parse_values("x", "a..5").is_err());
    }

    #[test]
    fn oversized_ranges_are_config_errors() {
        let err = parse_values("high_period", "0..1e30:1").unwrap_err();
        assert!(matches!(err, StratsimError::ConfigInvalid { ref key, .. } if key == "high_period"));
        assert!(parse_values("high_period", "1..1e10").is_err());
        assert!(parse_values("x", "0.1..1e300:1e-300").is_err());

        let largest = format!("1..{}", MAX_RANGE_VALUES);
        assert_eq!(parse_values("x", &largest).unwrap().len(), MAX_RANGE_VALUES);
        assert!(parse_values("x", &format!("0..{}", MAX_RANGE_VALUES)).is_err());
    }

    #[test]
    fn combinations_are_cartesian_in_axis_order() {
        let grid = ParamGrid::new()
            .with_axis("high_period", &["10", "20"])
            .with_axis("low_period", &["5", "10", "15"]);
        assert_eq!(grid.size(), 6);
        let combos = grid.combinations();
        assert_eq!(combos.len(), 6);
        assert_eq!(combos[0], vec![("high_period", "10"), ("low_period", "5")]);
        assert_eq!(combos[5], vec![("high_period", "20"), ("low_period", "15")]);
        assert_eq!(combination_key(&combos[1]), "high_period10_low_period10");
    }

    #[test]
    fn empty_grid_runs_base_once() {
        let grid = ParamGrid::new();
        assert_eq!(grid.combinations().len(), 1);
        assert_eq!(combination_key(&grid.combinations()[0]), "base");
    }

    #[test]
    fn grid_from_config_rejects_foreign_parameters() {
        let config = FileConfigAdapter::from_string("[optimize]\nrsi_period = 10,14\n").unwrap();
        let err = ParamGrid::from_config(&config, &channel_base()).unwrap_err();
        assert!(matches!(err, StratsimError::ConfigInvalid { key, .. } if key == "rsi_period"));
    }

    #[test]
    fn grid_from_config_rejects_unparseable_values() {
        let config = FileConfigAdapter::from_string("[optimize]\ntrigger = close,sideways\n").unwrap();
        assert!(ParamGrid::from_config(&config, &channel_base()).is_err());
    }

    #[test]
    fn grid_from_config_reads_axes() {
        let config = FileConfigAdapter::from_string(
            "[optimize]\nlow_period = 10,20\nhigh_period = 20..40:10\n",
        )
        .unwrap();
        let grid = ParamGrid::from_config(&config, &channel_base()).unwrap();
        assert_eq!(grid.axes()[0].name, "high_period");
        assert_eq!(grid.axes()[0].values, vec!["20", "30", "40"]);
        assert_eq!(grid.size(), 6);
    }

    #[test]
    fn invalid_combinations_are_skipped() {
        let base = StrategyConfig::new(StrategyParams::TripleAverage(TripleAverageParams {
            fast: 2,
            medium: 4,
            slow: 8,
            allow_short: false,
        }));
        let grid = ParamGrid::new().with_axis("fast", &["2", "4", "6"]);
        let (candidates, skipped) = generate_candidates(&grid, &base).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(skipped, vec!["fast4", "fast6"]);
    }

    #[test]
    fn reports_best_and_ties() {
        let scores: BTreeMap<String, f64> = [("a", 1.1), ("b", 1.3), ("c", 1.3), ("d", f64::NAN)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let result = OptimizationResult::from_scores(scores, Vec::new());
        assert_eq!(result.best_value, Some(1.3));
        assert_eq!(result.best_keys, vec!["b", "c"]);
    }

    #[test]
    fn optimize_scores_every_valid_combination() {
        let mut closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..30).map(|i| 130.0 - i as f64));
        let data = bars(&closes);
        let grid = ParamGrid::new()
            .with_axis("high_period", &["5", "10"])
            .with_axis("low_period", &["5", "10"]);

        let result = optimize(&data, &channel_base(), &grid).unwrap();
        assert_eq!(result.results.len(), 4);
        assert!(result.skipped.is_empty());
        assert!(!result.best_keys.is_empty());
        let best = result.best_value.unwrap();
        for key in &result.best_keys {
            assert_eq!(result.results[key], best);
        }

        // parallel and repeated runs agree
        let again = optimize(&data, &channel_base(), &grid).unwrap();
        assert_eq!(result, again);
    }
}
