//! Evaluation traces of a single algorithm on a single problem instance.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, ErrorDetails};
use crate::indicator::{self, Indicator, IndicatorRef};
use crate::problem::ProblemDescription;
use crate::table::{Table, running_best};

/// Reserved name of the (sorted) function evaluation column.
pub const FEVALS_COLUMN: &str = "__fevals";
/// Reserved name of the function evaluations divided by the number of variables.
pub const FEVALS_DIM_COLUMN: &str = "__fevals_dim";
/// Reserved name of the hit flag produced by [`BenchmarkResult::at_indicator`].
pub const TARGET_HIT_COLUMN: &str = "__target_hit";
/// Column name callers use for function evaluations unless told otherwise.
pub const DEFAULT_FEVALS_COLUMN: &str = "fevals";

/// Results of a single algorithm's run on a single problem.
///
/// The trace is sorted by the number of function evaluations when the result is
/// constructed. Every column except the reserved `__`-prefixed ones holds the
/// values of one performance indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkResult {
    algorithm: String,
    problem: Arc<ProblemDescription>,
    data: Table,
    indicators: BTreeSet<String>,
}

impl BenchmarkResult {
    /// Creates a result from a table whose evaluation counts are stored in
    /// `fevals_column`.
    ///
    /// If `fevals_column` is missing, the first column is assumed to hold the
    /// evaluation counts and a warning is logged.
    pub fn new(
        algorithm: impl Into<String>,
        problem: impl Into<Arc<ProblemDescription>>,
        mut data: Table,
        fevals_column: &str,
    ) -> Result<Self, Error> {
        let algorithm = algorithm.into();
        let problem = problem.into();

        if problem.number_of_variables == 0 {
            return Err(Error::new(ErrorDetails::InvalidProblem {
                message: format!(
                    "`{}` has zero variables, so evaluations per dimension are undefined",
                    problem.name
                ),
            }));
        }

        if fevals_column != FEVALS_COLUMN && !data.rename(fevals_column, FEVALS_COLUMN) {
            let Some(first) = data.first_column_name().map(str::to_string) else {
                return Err(Error::new(ErrorDetails::EmptyTable));
            };
            warn!(
                "Assuming first column ('{first}') contains the number of function evaluations."
            );
            data.rename(&first, FEVALS_COLUMN);
        }
        if !data.contains(FEVALS_COLUMN) {
            return Err(Error::new(ErrorDetails::ColumnNotFound {
                column: FEVALS_COLUMN.to_string(),
            }));
        }

        if let Some((row, &value)) = data
            .column(FEVALS_COLUMN)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .find(|(_, fevals)| !fevals.is_finite())
        {
            return Err(Error::new(ErrorDetails::InvalidFevals { row, value }));
        }

        data.sort_by(FEVALS_COLUMN)?;

        let dimension = problem.number_of_variables as f64;
        let fevals_dim = data
            .column(FEVALS_COLUMN)
            .unwrap_or_default()
            .iter()
            .map(|fevals| fevals / dimension)
            .collect();
        let data = data.with_column(FEVALS_DIM_COLUMN, fevals_dim)?;

        let indicators = data
            .column_names()
            .filter(|name| *name != FEVALS_COLUMN && *name != FEVALS_DIM_COLUMN)
            .map(str::to_string)
            .collect();

        Ok(Self {
            algorithm,
            problem,
            data,
            indicators,
        })
    }

    /// Creates a result from in-memory `(column name, values)` records.
    pub fn from_records<I, S>(
        algorithm: impl Into<String>,
        problem: impl Into<Arc<ProblemDescription>>,
        records: I,
        fevals_column: &str,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        Self::new(algorithm, problem, Table::from_columns(records)?, fevals_column)
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn problem(&self) -> &ProblemDescription {
        &self.problem
    }

    pub fn problem_arc(&self) -> &Arc<ProblemDescription> {
        &self.problem
    }

    /// Names of all indicator columns.
    pub fn indicators(&self) -> &BTreeSet<String> {
        &self.indicators
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.height()
    }

    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    pub fn fevals(&self) -> &[f64] {
        self.data.column(FEVALS_COLUMN).unwrap_or_default()
    }

    pub fn fevals_per_dimension(&self) -> &[f64] {
        self.data.column(FEVALS_DIM_COLUMN).unwrap_or_default()
    }

    /// Values of indicator `name`, in evaluation order.
    pub fn indicator(&self, name: &str) -> Result<&[f64], Error> {
        if !self.indicators.contains(name) {
            return Err(self.no_such_indicator(name));
        }
        Ok(self.data.column(name).unwrap_or_default())
    }

    /// Adds or replaces an indicator column. `values` must be in evaluation order.
    pub fn insert_indicator(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), Error> {
        let name = name.into();
        if name == FEVALS_COLUMN || name == FEVALS_DIM_COLUMN {
            return Err(Error::new(ErrorDetails::ReservedColumn { column: name }));
        }
        self.data.insert_column(name.clone(), values)?;
        self.indicators.insert(name);
        Ok(())
    }

    fn no_such_indicator(&self, name: &str) -> Error {
        Error::new(ErrorDetails::NoSuchIndicator {
            indicator: name.to_string(),
            available: self.indicators.clone(),
        })
    }

    /// Computes, for each target, the first number of function evaluations at
    /// which the best indicator value seen so far reaches that target.
    ///
    /// Targets are processed in order with a single forward cursor, so they are
    /// expected to become harder to reach (increasing for indicators where
    /// larger is better, decreasing otherwise). Targets that are never reached
    /// are recorded at the largest number of evaluations in the trace with a hit
    /// flag of `0.0`.
    ///
    /// Returns a new result with the columns `__fevals`, the indicator (holding
    /// the target values) and `__target_hit`.
    pub fn at_indicator<'a>(
        &self,
        indicator: impl Into<IndicatorRef<'a>>,
        targets: &[f64],
    ) -> Result<BenchmarkResult, Error> {
        let indicator = indicator::resolve(indicator)?;
        self.at_resolved_indicator(&indicator, targets)
    }

    /// Same as [`BenchmarkResult::at_indicator`] for an already resolved indicator.
    pub fn at_resolved_indicator(
        &self,
        indicator: &Indicator,
        targets: &[f64],
    ) -> Result<BenchmarkResult, Error> {
        let values = self.indicator(&indicator.name)?;
        let fevals = self.fevals();
        let best = running_best(values, indicator.larger_is_better);
        let max_fevals = fevals.last().copied().unwrap_or(0.0);

        let mut target_fevals = vec![max_fevals; targets.len()];
        let mut target_hit = vec![0.0; targets.len()];

        let reached = |value: f64, target: f64| {
            if indicator.larger_is_better {
                value >= target
            } else {
                value <= target
            }
        };

        let mut cursor = 0;
        for (i, &target) in targets.iter().enumerate() {
            while cursor < best.len() && !reached(best[cursor], target) {
                cursor += 1;
            }
            if cursor == best.len() {
                // Every later target is censored as well
                break;
            }
            target_fevals[i] = fevals[cursor];
            target_hit[i] = 1.0;
        }

        let table = Table::from_columns([
            (FEVALS_COLUMN.to_string(), target_fevals),
            (indicator.name.clone(), targets.to_vec()),
            (TARGET_HIT_COLUMN.to_string(), target_hit),
        ])?;
        BenchmarkResult::new(self.algorithm.clone(), self.problem.clone(), table, FEVALS_COLUMN)
    }

    /// Hit flags of a result produced by [`BenchmarkResult::at_indicator`].
    pub fn target_hits(&self) -> Option<&[f64]> {
        self.data.column(TARGET_HIT_COLUMN)
    }
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Results for {} on instance {} of {} in {} dimensions with {} objectives",
            self.algorithm,
            self.problem.instance,
            self.problem.name,
            self.problem.number_of_variables,
            self.problem.number_of_objectives
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn hv_a1() -> Vec<(&'static str, Vec<f64>)> {
        vec![
            ("fevals", vec![1.0, 2.0, 3.0, 10.0, 20.0, 50.0, 100.0]),
            ("hypervolume", vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]),
            ("r2", vec![20.0, 40.0, 60.0, 80.0, 100.0, 120.0, 140.0]),
        ]
    }

    fn pd_f1() -> ProblemDescription {
        ProblemDescription::new("f1", "i1", 10, 2)
    }

    #[test]
    fn test_construction_normalizes_columns() {
        let res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        assert_eq!(res.len(), 7);
        assert_eq!(
            res.indicators().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["hypervolume", "r2"]
        );
        assert_eq!(res.fevals()[3], 10.0);
        assert_eq!(res.fevals_per_dimension()[3], 1.0);
        assert!(res.indicator(FEVALS_COLUMN).is_err());
    }

    #[test]
    fn test_construction_sorts_by_fevals() {
        let res = BenchmarkResult::from_records(
            "a1",
            pd_f1(),
            [
                ("fevals", vec![30.0, 10.0, 20.0]),
                ("hypervolume", vec![3.0, 1.0, 2.0]),
            ],
            "fevals",
        )
        .unwrap();
        assert_eq!(res.fevals(), &[10.0, 20.0, 30.0]);
        assert_eq!(res.indicator("hypervolume").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    #[traced_test]
    fn test_fevals_column_fallback() {
        let mut records = hv_a1();
        records[0].0 = "nofevals";
        let res = BenchmarkResult::from_records("a1", pd_f1(), records, "fevals").unwrap();
        assert!(logs_contain("Assuming first column"));
        assert_eq!(res.fevals()[6], 100.0);
        assert!(!res.indicators().contains("nofevals"));
    }

    #[test]
    fn test_zero_variables_is_rejected() {
        let err = BenchmarkResult::from_records(
            "a1",
            ProblemDescription::new("f1", "i1", 0, 2),
            hv_a1(),
            "fevals",
        )
        .unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::InvalidProblem { .. }
        ));
    }

    #[test]
    fn test_non_finite_fevals_are_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let err = BenchmarkResult::from_records(
                "a1",
                pd_f1(),
                [("fevals", vec![1.0, bad]), ("hypervolume", vec![1.0, 2.0])],
                "fevals",
            )
            .unwrap_err();
            assert!(matches!(
                err.get_details(),
                ErrorDetails::InvalidFevals { row: 1, .. }
            ));
        }
    }

    #[test]
    fn test_at_indicator() {
        let res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        let ind = res
            .at_indicator("hypervolume", &[15.0, 25.0, 35.0, 120.0])
            .unwrap();

        assert_eq!(ind.fevals(), &[2.0, 3.0, 10.0, 100.0]);
        assert_eq!(
            ind.indicator("hypervolume").unwrap(),
            &[15.0, 25.0, 35.0, 120.0]
        );
        assert_eq!(ind.target_hits().unwrap(), &[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(ind.fevals_per_dimension(), &[0.2, 0.3, 1.0, 10.0]);
        assert_eq!(ind.algorithm(), "a1");
        assert_eq!(ind.problem(), &pd_f1());
        // The receiver is untouched
        assert_eq!(res.len(), 7);
    }

    #[test]
    fn test_at_indicator_minimize() {
        let res = BenchmarkResult::from_records(
            "a1",
            pd_f1(),
            [
                ("fevals", vec![1.0, 2.0, 4.0, 8.0]),
                ("igd+", vec![5.0, 6.0, 2.0, 3.0]),
            ],
            "fevals",
        )
        .unwrap();
        let ind = res.at_indicator("igd+", &[5.5, 5.0, 2.5, 1.0]).unwrap();
        assert_eq!(ind.fevals(), &[1.0, 1.0, 4.0, 8.0]);
        assert_eq!(ind.target_hits().unwrap(), &[1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_at_indicator_cursor_never_resets() {
        let res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        // 80 is out of reach, so the easy target after it is censored too
        let ind = res.at_indicator("hypervolume", &[80.0, 15.0]).unwrap();
        assert_eq!(ind.fevals(), &[100.0, 100.0]);
        assert_eq!(ind.target_hits().unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_at_indicator_edge_cases() {
        let res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        let empty = res.at_indicator("hypervolume", &[]).unwrap();
        assert!(empty.is_empty());

        let constant = BenchmarkResult::from_records(
            "a1",
            pd_f1(),
            [("fevals", vec![1.0, 5.0]), ("hypervolume", vec![3.0, 3.0])],
            "fevals",
        )
        .unwrap();
        let ind = constant.at_indicator("hypervolume", &[3.0, 4.0]).unwrap();
        assert_eq!(ind.fevals(), &[1.0, 5.0]);
        assert_eq!(ind.target_hits().unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_at_indicator_missing_column() {
        let records = vec![
            ("fevals", vec![1.0, 2.0]),
            ("hypervolume", vec![1.0, 2.0]),
        ];
        let res = BenchmarkResult::from_records("a1", pd_f1(), records, "fevals").unwrap();
        let err = res.at_indicator("r2", &[1.0]).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::NoSuchIndicator { indicator, .. } if indicator == "r2"
        ));
    }

    #[test]
    fn test_insert_indicator_registers_name() {
        let mut res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        res.insert_indicator("time", vec![0.0; 7]).unwrap();
        assert!(res.indicators().contains("time"));
        assert!(res.insert_indicator(FEVALS_DIM_COLUMN, vec![0.0; 7]).is_err());
    }

    #[test]
    fn test_rejected_insert_keeps_data() {
        let mut res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        let err = res.insert_indicator("time", vec![0.0; 3]).unwrap_err();
        assert!(matches!(
            err.get_details(),
            ErrorDetails::ColumnLengthMismatch { .. }
        ));
        assert_eq!(res.len(), 7);
        assert_eq!(res.fevals()[6], 100.0);
        assert_eq!(
            res.indicator("hypervolume").unwrap(),
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]
        );
        assert!(!res.indicators().contains("time"));
    }

    #[test]
    fn test_display() {
        let res = BenchmarkResult::from_records("a1", pd_f1(), hv_a1(), "fevals").unwrap();
        assert_eq!(
            res.to_string(),
            "Results for a1 on instance i1 of f1 in 10 dimensions with 2 objectives"
        );
    }
}
