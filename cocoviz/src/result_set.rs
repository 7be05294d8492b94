//! Collections of benchmark results.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, ErrorDetails};
use crate::problem::ProblemDescription;
use crate::result::BenchmarkResult;

/// An ordered collection of [`BenchmarkResult`]s that all share the same set of
/// indicators.
#[derive(Clone, Debug, Default)]
pub struct ResultSet {
    results: Vec<BenchmarkResult>,
    algorithms: BTreeSet<String>,
    problems: BTreeSet<ProblemDescription>,
    number_of_variables: BTreeSet<u64>,
    number_of_objectives: BTreeSet<u64>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set by appending every result in order.
    pub fn try_from_results(
        results: impl IntoIterator<Item = BenchmarkResult>,
    ) -> Result<Self, Error> {
        let mut set = Self::new();
        for result in results {
            set.append(result)?;
        }
        Ok(set)
    }

    /// Appends `result`.
    ///
    /// Fails without modifying the set if the indicators of `result` differ from
    /// those of the results already in the set.
    pub fn append(&mut self, result: BenchmarkResult) -> Result<&mut Self, Error> {
        if let Some(first) = self.results.first()
            && first.indicators() != result.indicators()
        {
            return Err(Error::new(ErrorDetails::IndicatorMismatch {
                expected: first.indicators().clone(),
                actual: result.indicators().clone(),
            }));
        }
        self.push_unchecked(result);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BenchmarkResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkResult> {
        self.results.iter()
    }

    pub fn algorithms(&self) -> &BTreeSet<String> {
        &self.algorithms
    }

    pub fn problems(&self) -> &BTreeSet<ProblemDescription> {
        &self.problems
    }

    pub fn number_of_variables(&self) -> &BTreeSet<u64> {
        &self.number_of_variables
    }

    pub fn number_of_objectives(&self) -> &BTreeSet<u64> {
        &self.number_of_objectives
    }

    /// Indicators shared by every result, or `None` for an empty set.
    pub fn indicators(&self) -> Option<&BTreeSet<String>> {
        self.results.first().map(BenchmarkResult::indicators)
    }

    /// Returns a new set holding the results for which `predicate` returns `true`.
    pub fn filter(&self, mut predicate: impl FnMut(&BenchmarkResult) -> bool) -> ResultSet {
        let mut filtered = ResultSet::new();
        for result in self.results.iter().filter(|result| predicate(result)) {
            filtered.push_unchecked(result.clone());
        }
        filtered
    }

    /// Members of a valid set already share one indicator set, so subsets can
    /// skip the check.
    fn push_unchecked(&mut self, result: BenchmarkResult) {
        let problem = result.problem();
        self.algorithms.insert(result.algorithm().to_string());
        self.number_of_variables.insert(problem.number_of_variables);
        self.number_of_objectives
            .insert(problem.number_of_objectives);
        self.problems.insert(problem.clone());
        self.results.push(result);
    }

    /// Partitions the set by `key` in a single pass. Groups come back in
    /// ascending key order and keep the insertion order of their members.
    fn group_by<K: Ord>(&self, key: impl Fn(&BenchmarkResult) -> K) -> Vec<(K, ResultSet)> {
        let mut groups: BTreeMap<K, ResultSet> = BTreeMap::new();
        for result in &self.results {
            groups
                .entry(key(result))
                .or_default()
                .push_unchecked(result.clone());
        }
        groups.into_iter().collect()
    }

    pub fn by_algorithm(&self) -> Vec<(String, ResultSet)> {
        self.group_by(|result| result.algorithm().to_string())
    }

    pub fn by_problem(&self) -> Vec<(ProblemDescription, ResultSet)> {
        self.group_by(|result| result.problem().clone())
    }

    pub fn by_problem_name(&self) -> Vec<(String, ResultSet)> {
        self.group_by(|result| result.problem().name.clone())
    }

    pub fn by_problem_instance(&self) -> Vec<(String, ResultSet)> {
        self.group_by(|result| result.problem().instance.clone())
    }

    pub fn by_number_of_variables(&self) -> Vec<(u64, ResultSet)> {
        self.group_by(|result| result.problem().number_of_variables)
    }

    pub fn by_number_of_objectives(&self) -> Vec<(u64, ResultSet)> {
        self.group_by(|result| result.problem().number_of_objectives)
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a BenchmarkResult;
    type IntoIter = std::slice::Iter<'a, BenchmarkResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = BenchmarkResult;
    type IntoIter = std::vec::IntoIter<BenchmarkResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
