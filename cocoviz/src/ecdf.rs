//! Empirical distribution of right-censored samples.

use serde::{Deserialize, Serialize};

/// A sample where some observations are only known to be larger than the
/// recorded value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CensoredSample {
    /// Exactly observed values.
    pub uncensored: Vec<f64>,
    /// Right-censored values: the true value is larger than the recorded one.
    pub right: Vec<f64>,
}

impl CensoredSample {
    pub fn new(uncensored: Vec<f64>, right: Vec<f64>) -> Self {
        Self { uncensored, right }
    }

    pub fn len(&self) -> usize {
        self.uncensored.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Empirical cumulative distribution function as a step function.
///
/// `probabilities[i]` is the estimated probability of a value `<= quantiles[i]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ecdf {
    pub quantiles: Vec<f64>,
    pub probabilities: Vec<f64>,
}

impl Ecdf {
    /// Kaplan–Meier estimate of the CDF of a right-censored sample.
    ///
    /// Quantiles are all distinct observed values (censored or not) in
    /// ascending order. Without censored observations this is the ordinary
    /// empirical CDF.
    pub fn from_censored(sample: &CensoredSample) -> Self {
        let mut observations: Vec<(f64, bool)> = sample
            .uncensored
            .iter()
            .map(|&value| (value, true))
            .chain(sample.right.iter().map(|&value| (value, false)))
            .collect();
        observations.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = observations.len();
        let mut quantiles = Vec::new();
        let mut probabilities = Vec::new();
        let mut survival = 1.0;
        let mut start = 0;
        while start < total {
            let time = observations[start].0;
            let mut end = start;
            let mut events = 0usize;
            while end < total && observations[end].0.total_cmp(&time).is_eq() {
                if observations[end].1 {
                    events += 1;
                }
                end += 1;
            }
            let at_risk = (total - start) as f64;
            survival *= (at_risk - events as f64) / at_risk;
            quantiles.push(time);
            probabilities.push(1.0 - survival);
            start = end;
        }

        Self {
            quantiles,
            probabilities,
        }
    }

    pub fn len(&self) -> usize {
        self.quantiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantiles.is_empty()
    }

    /// Evaluates the (right-continuous) step function at `x`.
    pub fn probability_at(&self, x: f64) -> f64 {
        let index = self.quantiles.partition_point(|&q| q <= x);
        if index == 0 {
            0.0
        } else {
            self.probabilities[index - 1]
        }
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.quantiles, self.probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_uncensored_is_plain_ecdf() {
        let ecdf = Ecdf::from_censored(&CensoredSample::new(vec![3.0, 1.0, 2.0, 2.0], vec![]));
        assert_eq!(ecdf.quantiles, vec![1.0, 2.0, 3.0]);
        assert_close(&ecdf.probabilities, &[0.25, 0.75, 1.0]);
    }

    #[test]
    fn test_kaplan_meier_with_censoring() {
        // Times 1 (event), 2 (censored), 3 (event), 4 (censored)
        // S(1) = 3/4, S(2) = 3/4, S(3) = 3/4 * 1/2 = 3/8, S(4) = 3/8
        let ecdf = Ecdf::from_censored(&CensoredSample::new(vec![1.0, 3.0], vec![2.0, 4.0]));
        assert_eq!(ecdf.quantiles, vec![1.0, 2.0, 3.0, 4.0]);
        assert_close(&ecdf.probabilities, &[0.25, 0.25, 0.625, 0.625]);
    }

    #[test]
    fn test_ties_between_events_and_censoring() {
        // At t = 10: 4 at risk, 1 event, 1 censored -> S = 3/4
        // At t = 20: 2 at risk, 1 event -> S = 3/8
        let ecdf = Ecdf::from_censored(&CensoredSample::new(
            vec![10.0, 20.0],
            vec![10.0, 30.0],
        ));
        assert_eq!(ecdf.quantiles, vec![10.0, 20.0, 30.0]);
        assert_close(&ecdf.probabilities, &[0.25, 0.625, 0.625]);
    }

    #[test]
    fn test_probabilities_are_monotone_and_bounded() {
        let ecdf = Ecdf::from_censored(&CensoredSample::new(
            vec![5.0, 1.0, 7.0, 1.0, 9.0],
            vec![2.0, 8.0, 9.0],
        ));
        assert!(ecdf.quantiles.windows(2).all(|w| w[0] < w[1]));
        assert!(ecdf.probabilities.windows(2).all(|w| w[0] <= w[1]));
        assert!(
            ecdf.probabilities
                .iter()
                .all(|p| (0.0..=1.0).contains(p))
        );
    }

    #[test]
    fn test_all_censored_and_empty() {
        let ecdf = Ecdf::from_censored(&CensoredSample::new(vec![], vec![4.0, 4.0]));
        assert_eq!(ecdf.quantiles, vec![4.0]);
        assert_eq!(ecdf.probabilities, vec![0.0]);

        let empty = Ecdf::from_censored(&CensoredSample::default());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_nan_observations_terminate() {
        let ecdf = Ecdf::from_censored(&CensoredSample::new(
            vec![1.0, f64::NAN],
            vec![f64::NAN, 2.0],
        ));
        assert_eq!(ecdf.len(), 3);
        assert_eq!(&ecdf.quantiles[..2], &[1.0, 2.0]);
        assert!(ecdf.quantiles[2].is_nan());
        assert!(ecdf.probabilities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_probability_at() {
        let ecdf = Ecdf::from_censored(&CensoredSample::new(vec![1.0, 2.0], vec![]));
        assert_eq!(ecdf.probability_at(0.5), 0.0);
        assert_eq!(ecdf.probability_at(1.0), 0.5);
        assert_eq!(ecdf.probability_at(1.5), 0.5);
        assert_eq!(ecdf.probability_at(10.0), 1.0);
    }
}
