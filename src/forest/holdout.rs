//! Train/test split fitting with a quality report.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{ForestConfig, ForestError, IsolationForest};
use crate::models::FeatureVector;

/// Share of rows held out for testing by default.
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

/// Held-out evaluation of a fitted forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub n_train: usize,
    pub n_test: usize,
    /// Test rows with decision ≥ 0.
    pub test_inliers: usize,
    /// Test rows with decision < 0.
    pub test_outliers: usize,
    pub score_min: f64,
    pub score_max: f64,
    pub score_mean: f64,
}

impl FitReport {
    /// Share of test rows flagged as anomalies.
    pub fn outlier_rate(&self) -> f64 {
        if self.n_test == 0 {
            0.0
        } else {
            self.test_outliers as f64 / self.n_test as f64
        }
    }
}

/// Shuffles `rows` with the config seed, holds out `ceil(n * test_fraction)`
/// rows, fits on the rest, and reports decision scores on the held-out part.
///
/// # Errors
/// `test_fraction` outside `(0, 1)`, a split that leaves no training rows,
/// or any [`IsolationForest::fit`] error.
pub fn fit_with_holdout(
    rows: &[FeatureVector],
    test_fraction: f64,
    config: &ForestConfig,
) -> Result<(IsolationForest, FitReport), ForestError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ForestError::InvalidConfig(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    if rows.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }

    let n_test = (rows.len() as f64 * test_fraction).ceil() as usize;
    if n_test >= rows.len() {
        return Err(ForestError::EmptyTrainingSet);
    }

    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(config.seed));
    let (test_idx, train_idx) = order.split_at(n_test);

    let train: Vec<FeatureVector> = train_idx.iter().map(|&i| rows[i]).collect();
    let forest = IsolationForest::fit(&train, config)?;

    let scores: Vec<f64> = test_idx
        .iter()
        .map(|&i| forest.decision_function(&rows[i]))
        .collect();
    let test_inliers = scores.iter().filter(|&&s| s >= 0.0).count();
    let report = FitReport {
        n_train: train.len(),
        n_test,
        test_inliers,
        test_outliers: n_test - test_inliers,
        score_min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        score_max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        score_mean: scores.iter().sum::<f64>() / n_test as f64,
    };

    tracing::info!(
        n_train = report.n_train,
        n_test = report.n_test,
        test_outliers = report.test_outliers,
        "holdout evaluation complete"
    );
    Ok((forest, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tests::healthy_rows;

    #[test]
    fn test_split_sizes() {
        let rows = healthy_rows(100, 4);
        let config = ForestConfig::default().with_estimators(30);
        let (forest, report) = fit_with_holdout(&rows, DEFAULT_TEST_FRACTION, &config).unwrap();
        assert_eq!(report.n_test, 30);
        assert_eq!(report.n_train, 70);
        assert_eq!(report.test_inliers + report.test_outliers, 30);
        assert_eq!(forest.max_samples(), 70);
        assert!(report.score_min <= report.score_mean);
        assert!(report.score_mean <= report.score_max);
    }

    #[test]
    fn test_healthy_holdout_mostly_inliers() {
        let rows = healthy_rows(500, 8);
        let (_, report) =
            fit_with_holdout(&rows, DEFAULT_TEST_FRACTION, &ForestConfig::default()).unwrap();
        assert!(report.outlier_rate() < 0.1, "rate {}", report.outlier_rate());
    }

    #[test]
    fn test_holdout_deterministic() {
        let rows = healthy_rows(120, 4);
        let config = ForestConfig::default().with_estimators(20);
        let (a, ra) = fit_with_holdout(&rows, 0.25, &config).unwrap();
        let (b, rb) = fit_with_holdout(&rows, 0.25, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_invalid_fraction() {
        let rows = healthy_rows(10, 4);
        for f in [0.0, 1.0, -0.5, f64::NAN] {
            let err = fit_with_holdout(&rows, f, &ForestConfig::default()).unwrap_err();
            assert!(matches!(err, ForestError::InvalidConfig(_)), "fraction {f}");
        }
    }

    #[test]
    fn test_too_few_rows() {
        let rows = healthy_rows(1, 4);
        let err = fit_with_holdout(&rows, 0.3, &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ForestError::EmptyTrainingSet));
    }

    #[test]
    fn test_report_serializes() {
        let report = FitReport {
            n_train: 7,
            n_test: 3,
            test_inliers: 2,
            test_outliers: 1,
            score_min: -0.1,
            score_max: 0.2,
            score_mean: 0.05,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["n_test"], 3);
        assert_eq!(json["test_outliers"], 1);
        assert!((report.outlier_rate() - 1.0 / 3.0).abs() < 1e-12);
    }
}
