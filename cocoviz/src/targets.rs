//! Functions to generate targets for specific indicators.
//!
//! All generators pool the indicator values of every result on the same problem
//! and return one target sequence per problem. Sequences are ordered from the
//! easiest to the hardest target, which is the order the crossing search in
//! [`BenchmarkResult::at_indicator`](crate::result::BenchmarkResult::at_indicator)
//! expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Error;
use crate::indicator::{self, Indicator, IndicatorRef};
use crate::problem::ProblemDescription;
use crate::result_set::ResultSet;
use crate::table::Table;

/// Target values for each problem.
pub type Targets = BTreeMap<ProblemDescription, Vec<f64>>;

/// Number of orders of magnitude spanned by [`log_targets`].
const LOG_TARGET_DECADES: f64 = 16.0;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[clap(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetStrategy {
    #[default]
    Linear,
    Log,
    Full,
}

impl TargetStrategy {
    pub fn generate(
        self,
        results: &ResultSet,
        indicator: &Indicator,
        number_of_targets: usize,
    ) -> Result<Targets, Error> {
        match self {
            TargetStrategy::Linear => linear_targets_for(results, indicator, number_of_targets),
            TargetStrategy::Log => log_targets_for(results, indicator, number_of_targets),
            TargetStrategy::Full => full_targets_for(results, indicator),
        }
    }
}

/// Stacks the `indicator` column of every result in `results`.
fn pooled(results: &ResultSet, indicator: &Indicator) -> Result<Table, Error> {
    let name = indicator.name.as_str();
    let mut columns = Vec::with_capacity(results.len());
    for result in results {
        // Reports a missing indicator as such rather than as a missing column
        result.indicator(name)?;
        columns.push(result.data().select(&[name])?);
    }
    Table::concat(&columns)
}

fn pooled_range(results: &ResultSet, indicator: &Indicator) -> Result<Option<(f64, f64)>, Error> {
    let pooled = pooled(results, indicator)?;
    if !pooled.contains(&indicator.name) {
        return Ok(None);
    }
    let low = pooled.min(&indicator.name)?;
    let high = pooled.max(&indicator.name)?;
    Ok(low.zip(high))
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// `n` values spaced evenly on a log scale from `10^start` to `10^stop`.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    linspace(start, stop, n)
        .into_iter()
        .map(|exponent| 10f64.powf(exponent))
        .collect()
}

/// Generates `number_of_targets` linearly spaced targets between the smallest
/// and the largest observed indicator value of each problem.
///
/// If the indicator is constant on a problem only a single target is generated.
/// Indicator names are resolved against the process-wide registry.
pub fn linear_targets<'a>(
    results: &ResultSet,
    indicator: impl Into<IndicatorRef<'a>>,
    number_of_targets: usize,
) -> Result<Targets, Error> {
    linear_targets_for(results, &indicator::resolve(indicator)?, number_of_targets)
}

#[instrument(skip_all, fields(indicator = %indicator.name, number_of_targets = number_of_targets))]
fn linear_targets_for(
    results: &ResultSet,
    indicator: &Indicator,
    number_of_targets: usize,
) -> Result<Targets, Error> {
    let mut targets = Targets::new();
    for (problem, problem_results) in results.by_problem() {
        let problem_targets = match pooled_range(&problem_results, indicator)? {
            None => Vec::new(),
            Some((low, high)) if low == high => vec![low],
            Some((low, high)) if indicator.larger_is_better => {
                linspace(low, high, number_of_targets)
            }
            Some((low, high)) => linspace(high, low, number_of_targets),
        };
        debug!(problem = %problem, count = problem_targets.len(), "Generated linear targets");
        targets.insert(problem, problem_targets);
    }
    Ok(targets)
}

/// Generates `number_of_targets` targets that get denser towards the best
/// observed indicator value of each problem.
///
/// The distance to the best value shrinks geometrically from the full observed
/// range down to `1e-16` of it.
pub fn log_targets<'a>(
    results: &ResultSet,
    indicator: impl Into<IndicatorRef<'a>>,
    number_of_targets: usize,
) -> Result<Targets, Error> {
    log_targets_for(results, &indicator::resolve(indicator)?, number_of_targets)
}

#[instrument(skip_all, fields(indicator = %indicator.name, number_of_targets = number_of_targets))]
fn log_targets_for(
    results: &ResultSet,
    indicator: &Indicator,
    number_of_targets: usize,
) -> Result<Targets, Error> {
    let factors = logspace(0.0, -LOG_TARGET_DECADES, number_of_targets);
    let mut targets = Targets::new();
    for (problem, problem_results) in results.by_problem() {
        let problem_targets = match pooled_range(&problem_results, indicator)? {
            None => Vec::new(),
            Some((low, high)) if low == high => vec![low],
            Some((low, high)) => {
                let range = high - low;
                factors
                    .iter()
                    .map(|factor| {
                        if indicator.larger_is_better {
                            high - range * factor
                        } else {
                            low + range * factor
                        }
                    })
                    .collect()
            }
        };
        debug!(problem = %problem, count = problem_targets.len(), "Generated log targets");
        targets.insert(problem, problem_targets);
    }
    Ok(targets)
}

/// Uses every distinct observed indicator value of a problem as a target.
///
/// Values are sorted ascending, or descending when smaller values are better.
pub fn full_targets<'a>(
    results: &ResultSet,
    indicator: impl Into<IndicatorRef<'a>>,
) -> Result<Targets, Error> {
    full_targets_for(results, &indicator::resolve(indicator)?)
}

#[instrument(skip_all, fields(indicator = %indicator.name))]
fn full_targets_for(results: &ResultSet, indicator: &Indicator) -> Result<Targets, Error> {
    let mut targets = Targets::new();
    for (problem, problem_results) in results.by_problem() {
        let pooled = pooled(&problem_results, indicator)?;
        let mut values = if pooled.contains(&indicator.name) {
            pooled.distinct_sorted(&indicator.name)?
        } else {
            Vec::new()
        };
        if !indicator.larger_is_better {
            values.reverse();
        }
        debug!(problem = %problem, count = values.len(), "Generated full targets");
        targets.insert(problem, values);
    }
    Ok(targets)
}
