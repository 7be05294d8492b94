//! Runtime profile calculations.
//!
//! A runtime profile shows, for each algorithm, which fraction of the targets
//! was reached after a given number of function evaluations per dimension.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument};

use crate::ecdf::{CensoredSample, Ecdf};
use crate::error::{Error, ErrorDetails};
use crate::indicator::{self, IndicatorRef};
use crate::result::{FEVALS_DIM_COLUMN, TARGET_HIT_COLUMN};
use crate::result_set::ResultSet;
use crate::table::Table;
use crate::targets::{TargetStrategy, Targets};

pub const DEFAULT_NUMBER_OF_TARGETS: usize = 101;

#[derive(Clone, Debug)]
pub struct RuntimeProfileOptions {
    /// Polarity of the indicator if it is not registered.
    pub maximize_indicator: bool,
    /// Number of target values to generate for each problem if `targets` is missing.
    pub number_of_targets: usize,
    /// Target values, indexed by problem.
    /// If missing or empty, targets are generated with `target_strategy`.
    pub targets: Option<Targets>,
    pub target_strategy: TargetStrategy,
}

impl Default for RuntimeProfileOptions {
    fn default() -> Self {
        Self {
            maximize_indicator: true,
            number_of_targets: DEFAULT_NUMBER_OF_TARGETS,
            targets: None,
            target_strategy: TargetStrategy::default(),
        }
    }
}

fn bad_runtime_profile(message: String) -> Error {
    Error::new(ErrorDetails::BadRuntimeProfile { message })
}

fn check_preconditions(results: &ResultSet) -> Result<(), Error> {
    if results.is_empty() {
        return Err(bad_runtime_profile(
            "No results to derive a runtime profile from.".to_string(),
        ));
    }
    if results.number_of_variables().len() > 1 {
        return Err(bad_runtime_profile(format!(
            "Cannot derive runtime profile for problems with different number of variables: {:?}",
            results.number_of_variables()
        )));
    }
    if results.number_of_objectives().len() > 1 {
        return Err(bad_runtime_profile(format!(
            "Cannot derive runtime profile for problems with different number of objectives: {:?}",
            results.number_of_objectives()
        )));
    }
    Ok(())
}

/// Compute a runtime profile for each algorithm in `results`.
///
/// Every result is reduced to the number of function evaluations per dimension
/// needed to reach each target of its problem. The reduced results of an
/// algorithm are pooled, with unreached targets treated as right-censored, and
/// turned into an empirical CDF.
///
/// Returns the profile of each algorithm, keyed by algorithm name. The map has
/// no defined iteration order.
#[instrument(
    skip_all,
    fields(results = results.len(), number_of_targets = options.number_of_targets)
)]
pub fn runtime_profiles<'a>(
    results: &ResultSet,
    indicator: impl Into<IndicatorRef<'a>>,
    options: &RuntimeProfileOptions,
) -> Result<HashMap<String, Ecdf>, Error> {
    check_preconditions(results)?;

    let indicator = indicator::resolve_or_adhoc(indicator, options.maximize_indicator);

    let generated;
    let targets = match options.targets.as_ref().filter(|targets| !targets.is_empty()) {
        Some(targets) => targets,
        None => {
            generated =
                options
                    .target_strategy
                    .generate(results, &indicator, options.number_of_targets)?;
            &generated
        }
    };

    // Get (approximate) runtime to reach each target of indicator
    let mut indicator_results = ResultSet::new();
    for result in results {
        let problem_targets = targets.get(result.problem()).ok_or_else(|| {
            bad_runtime_profile(format!("No targets given for {}", result.problem()))
        })?;
        indicator_results.append(result.at_resolved_indicator(&indicator, problem_targets)?)?;
    }

    let by_algorithm = indicator_results.by_algorithm();
    let repetitions: BTreeMap<&str, usize> = by_algorithm
        .iter()
        .map(|(algorithm, algorithm_results)| (algorithm.as_str(), algorithm_results.len()))
        .collect();
    let mut counts = repetitions.values();
    if let Some(first) = counts.next()
        && counts.any(|count| count != first)
    {
        return Err(bad_runtime_profile(format!(
            "Algorithms have different numbers of results: {repetitions:?}"
        )));
    }

    let mut profiles = HashMap::with_capacity(by_algorithm.len());
    for (algorithm, algorithm_results) in &by_algorithm {
        let runtimes = algorithm_results
            .iter()
            .map(|result| result.data().select(&[FEVALS_DIM_COLUMN, TARGET_HIT_COLUMN]))
            .collect::<Result<Vec<Table>, Error>>()?;
        let runtimes = Table::concat(&runtimes)?;
        let sample = censored_sample(&runtimes);
        debug!(
            algorithm = %algorithm,
            hits = sample.uncensored.len(),
            misses = sample.right.len(),
            "Pooled runtimes"
        );
        profiles.insert(algorithm.clone(), Ecdf::from_censored(&sample));
    }

    info!(algorithms = profiles.len(), "Computed runtime profiles");
    Ok(profiles)
}

/// Splits pooled `(__fevals_dim, __target_hit)` rows into hits (exact) and
/// misses (right-censored).
fn censored_sample(runtimes: &Table) -> CensoredSample {
    let fevals_dim = runtimes.column(FEVALS_DIM_COLUMN).unwrap_or_default();
    let hits = runtimes.column(TARGET_HIT_COLUMN).unwrap_or_default();
    let mut sample = CensoredSample::default();
    for (&runtime, &hit) in fevals_dim.iter().zip(hits) {
        if hit > 0.0 {
            sample.uncensored.push(runtime);
        } else {
            sample.right.push(runtime);
        }
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::Indicator;
    use crate::problem::ProblemDescription;
    use crate::result::BenchmarkResult;

    const FEVALS: [f64; 7] = [1.0, 2.0, 3.0, 10.0, 20.0, 50.0, 100.0];
    const HV_A1: [f64; 7] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0];
    const HV_A2: [f64; 7] = [12.0, 22.0, 32.0, 42.0, 52.0, 62.0, 72.0];

    fn result(algorithm: &str, problem: &ProblemDescription, hv: &[f64]) -> BenchmarkResult {
        BenchmarkResult::from_records(
            algorithm,
            problem.clone(),
            [("fevals", FEVALS.to_vec()), ("hypervolume", hv.to_vec())],
            "fevals",
        )
        .unwrap()
    }

    #[test]
    fn test_aggregate_over_objectives() {
        let pd_f1_d2 = ProblemDescription::new("f1", "i1", 10, 2);
        let pd_f1_d3 = ProblemDescription::new("f1", "i1", 10, 3);
        let rs = ResultSet::try_from_results([
            result("a1", &pd_f1_d2, &HV_A1),
            result("a1", &pd_f1_d3, &HV_A1),
        ])
        .unwrap();
        let err =
            runtime_profiles(&rs, "hypervolume", &RuntimeProfileOptions::default()).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::BadRuntimeProfile { message } if message.contains("objectives")
        ));
    }

    #[test]
    fn test_aggregate_over_variables() {
        let pd_f1_d2 = ProblemDescription::new("f1", "i1", 10, 2);
        let pd_f1_d3 = ProblemDescription::new("f1", "i1", 20, 2);
        let rs = ResultSet::try_from_results([
            result("a1", &pd_f1_d2, &HV_A1),
            result("a1", &pd_f1_d3, &HV_A1),
        ])
        .unwrap();
        let err =
            runtime_profiles(&rs, "hypervolume", &RuntimeProfileOptions::default()).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::BadRuntimeProfile { message } if message.contains("variables")
        ));
    }

    #[test]
    fn test_unequal_repetitions() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([
            result("a1", &f1, &HV_A1),
            result("a1", &f1, &HV_A1),
            result("a2", &f1, &HV_A2),
        ])
        .unwrap();
        let err =
            runtime_profiles(&rs, "hypervolume", &RuntimeProfileOptions::default()).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::BadRuntimeProfile { message } if message.contains("\"a1\": 2")
        ));
    }

    #[test]
    fn test_empty_result_set() {
        let err = runtime_profiles(
            &ResultSet::new(),
            "hypervolume",
            &RuntimeProfileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::BadRuntimeProfile { .. }
        ));
    }

    #[test]
    fn test_profiles_with_explicit_targets() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([
            result("a1", &f1, &HV_A1),
            result("a2", &f1, &HV_A2),
        ])
        .unwrap();
        let options = RuntimeProfileOptions {
            targets: Some(Targets::from([(f1.clone(), vec![15.0, 25.0, 35.0, 120.0])])),
            ..Default::default()
        };
        let profiles = runtime_profiles(&rs, "hypervolume", &options).unwrap();
        assert_eq!(profiles.len(), 2);

        // a1 reaches 15/25/35 after 2/3/10 evaluations and misses 120
        let a1 = &profiles["a1"];
        assert_eq!(a1.quantiles, vec![0.2, 0.3, 1.0, 10.0]);
        for (actual, expected) in a1.probabilities.iter().zip([0.25, 0.5, 0.75, 0.75]) {
            assert!((actual - expected).abs() < 1e-12, "{:?}", a1.probabilities);
        }

        let a2 = &profiles["a2"];
        assert_eq!(a2.quantiles, vec![0.2, 0.3, 1.0, 10.0]);
    }

    #[test]
    fn test_missing_targets_for_problem() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let f2 = ProblemDescription::new("f2", "i1", 10, 2);
        let rs = ResultSet::try_from_results([result("a1", &f1, &HV_A1)]).unwrap();
        let options = RuntimeProfileOptions {
            targets: Some(Targets::from([(f2, vec![15.0])])),
            ..Default::default()
        };
        let err = runtime_profiles(&rs, "hypervolume", &options).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::BadRuntimeProfile { message } if message.contains("No targets")
        ));
    }

    #[test]
    fn test_generated_targets_reach_full_probability() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([
            result("a1", &f1, &HV_A1),
            result("a2", &f1, &HV_A2),
        ])
        .unwrap();
        let profiles =
            runtime_profiles(&rs, "hypervolume", &RuntimeProfileOptions::default()).unwrap();
        // a2 dominates a1 and attains the best value, so it reaches every target
        let a2 = &profiles["a2"];
        assert_eq!(a2.probabilities.last().copied(), Some(1.0));
        let a1 = &profiles["a1"];
        assert!(a1.probabilities.last().copied().unwrap() < 1.0);
        for ecdf in profiles.values() {
            assert!(ecdf.probabilities.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_unregistered_indicator_uses_polarity_option() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([BenchmarkResult::from_records(
            "a1",
            f1.clone(),
            [
                ("fevals", vec![1.0, 2.0, 3.0]),
                ("test_rtp_error", vec![3.0, 2.0, 1.0]),
            ],
            "fevals",
        )
        .unwrap()])
        .unwrap();
        let options = RuntimeProfileOptions {
            maximize_indicator: false,
            number_of_targets: 3,
            ..Default::default()
        };
        let profiles = runtime_profiles(&rs, "test_rtp_error", &options).unwrap();
        // Targets 3, 2, 1 are hit after 1, 2, 3 evaluations
        let a1 = &profiles["a1"];
        assert_eq!(a1.quantiles, vec![0.1, 0.2, 0.3]);
        assert_eq!(a1.probabilities.last().copied(), Some(1.0));

        // An explicit indicator is used as given: maximizing, the first value
        // already reaches every target
        let maximize = Indicator::new("test_rtp_error", true);
        let profiles = runtime_profiles(&rs, &maximize, &options).unwrap();
        assert_eq!(profiles["a1"].quantiles, vec![0.1]);
        assert_eq!(profiles["a1"].probabilities, vec![1.0]);
    }

    #[test]
    fn test_empty_targets_are_generated() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([
            result("a1", &f1, &HV_A1),
            result("a2", &f1, &HV_A2),
        ])
        .unwrap();
        let options = RuntimeProfileOptions {
            targets: Some(Targets::new()),
            ..Default::default()
        };
        let profiles = runtime_profiles(&rs, "hypervolume", &options).unwrap();
        let generated =
            runtime_profiles(&rs, "hypervolume", &RuntimeProfileOptions::default()).unwrap();
        assert_eq!(profiles, generated);
    }

    #[test]
    fn test_all_nan_indicator() {
        let f1 = ProblemDescription::new("f1", "i1", 10, 2);
        let rs = ResultSet::try_from_results([result("a1", &f1, &[f64::NAN; 7])]).unwrap();

        // Nothing observed, so no targets are generated
        for target_strategy in [TargetStrategy::Linear, TargetStrategy::Log, TargetStrategy::Full] {
            let options = RuntimeProfileOptions {
                target_strategy,
                ..Default::default()
            };
            let profiles = runtime_profiles(&rs, "hypervolume", &options).unwrap();
            assert!(profiles["a1"].is_empty(), "{target_strategy:?}");
        }

        // Explicit targets are never reached
        let options = RuntimeProfileOptions {
            targets: Some(Targets::from([(f1.clone(), vec![15.0, 25.0])])),
            ..Default::default()
        };
        let profiles = runtime_profiles(&rs, "hypervolume", &options).unwrap();
        assert_eq!(profiles["a1"].quantiles, vec![10.0]);
        assert_eq!(profiles["a1"].probabilities, vec![0.0]);
    }
}
