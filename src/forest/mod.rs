//! Isolation forest anomaly scorer.
//!
//! A reference [`DecisionScorer`]: an ensemble of random isolation trees
//! fitted on healthy-fleet readings. Points that isolate quickly score low.
//!
//! # Algorithm
//!
//! 1. For each tree, draw `ψ = min(max_samples, n)` rows without replacement.
//! 2. Grow the tree to depth `⌈log2 ψ⌉` (see `tree`).
//! 3. `score_samples(x) = -2^(-E[h(x)] / c(ψ))`, in `[-1, 0)`.
//! 4. `decision(x) = score_samples(x) - offset`; negative means anomaly.
//!
//! The offset is `-0.5` for [`Contamination::Auto`], or the `100·p`
//! percentile of training scores for [`Contamination::Fraction`], so that
//! roughly a fraction `p` of the training data falls below zero.
//!
//! # Determinism
//! All randomness comes from a `StdRng` seeded with [`ForestConfig::seed`].
//! The same rows and config always produce the same forest.
//!
//! # Reference
//! Liu, Ting & Zhou (2008), "Isolation Forest", ICDM

mod holdout;
mod tree;

pub use holdout::{fit_with_holdout, FitReport, DEFAULT_TEST_FRACTION};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ScorerError;
use crate::health::{DecisionScore, DecisionScorer};
use crate::models::{Channel, FeatureVector};
use tree::{average_path_length, IsolationTree};

/// Errors from fitting, saving, or loading a forest.
#[derive(Debug, Error)]
pub enum ForestError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training row {index} contains a non-finite value")]
    NonFiniteSample { index: usize },

    #[error("Invalid forest config: {0}")]
    InvalidConfig(String),

    /// A persisted model failed structural checks.
    #[error("Corrupt model: {0}")]
    Corrupt(String),

    #[error("Model I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model JSON failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Expected share of anomalies in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Contamination {
    /// Fixed offset of `-0.5`.
    Auto,
    /// Offset placed at this quantile of training scores, in `(0, 0.5]`.
    Fraction(f64),
}

impl Default for Contamination {
    fn default() -> Self {
        Contamination::Fraction(0.01)
    }
}

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the number of rows).
    pub max_samples: usize,
    /// Offset selection.
    pub contamination: Contamination,
    /// RNG seed for subsampling and splits.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: Contamination::default(),
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Sets the number of trees.
    pub fn with_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Sets the per-tree subsample size.
    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n;
        self
    }

    /// Sets the contamination.
    pub fn with_contamination(mut self, contamination: Contamination) -> Self {
        self.contamination = contamination;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks hyperparameter ranges.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidConfig(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.max_samples == 0 {
            return Err(ForestError::InvalidConfig(
                "max_samples must be at least 1".into(),
            ));
        }
        if let Contamination::Fraction(p) = self.contamination {
            if !(p > 0.0 && p <= 0.5) {
                return Err(ForestError::InvalidConfig(format!(
                    "contamination must be in (0, 0.5], got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Fitted isolation forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Channel names in feature order at fit time.
    channels: Vec<String>,
    trees: Vec<IsolationTree>,
    /// Effective subsample size ψ.
    max_samples: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fits a forest on `rows`.
    ///
    /// # Errors
    /// Empty or non-finite training data, or an invalid config.
    pub fn fit(rows: &[FeatureVector], config: &ForestConfig) -> Result<Self, ForestError> {
        config.validate()?;
        if rows.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if let Some(index) = rows.iter().position(|r| r.check_finite().is_err()) {
            return Err(ForestError::NonFiniteSample { index });
        }

        let psi = config.max_samples.min(rows.len());
        let max_depth = (psi.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.n_estimators)
            .map(|_| {
                let sample: Vec<&FeatureVector> =
                    rand::seq::index::sample(&mut rng, rows.len(), psi)
                        .iter()
                        .map(|i| &rows[i])
                        .collect();
                IsolationTree::grow(sample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            channels: channel_names(),
            trees,
            max_samples: psi,
            offset: -0.5,
        };

        if let Contamination::Fraction(p) = config.contamination {
            let mut scores: Vec<f64> = rows.iter().map(|r| forest.score_samples(r)).collect();
            forest.offset = percentile(&mut scores, 100.0 * p);
        }

        tracing::info!(
            trees = config.n_estimators,
            rows = rows.len(),
            max_samples = psi,
            offset = forest.offset,
            "isolation forest fitted"
        );
        Ok(forest)
    }

    /// Opposite of the anomaly score, in `[-1, 0)`. Lower is more abnormal.
    pub fn score_samples(&self, x: &FeatureVector) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.max_samples);
        if norm == 0.0 {
            return -1.0;
        }
        -(2f64).powf(-mean_path / norm)
    }

    /// Shifted score; negative means anomaly.
    pub fn decision_function(&self, x: &FeatureVector) -> f64 {
        self.score_samples(x) - self.offset
    }

    /// Whether `x` is an inlier (decision ≥ 0).
    pub fn is_inlier(&self, x: &FeatureVector) -> bool {
        self.decision_function(x) >= 0.0
    }

    /// Offset subtracted from `score_samples`.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Number of trees.
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Effective subsample size.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Serializes the forest to JSON.
    pub fn to_json(&self) -> Result<String, ForestError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and checks a forest from JSON.
    pub fn from_json(json: &str) -> Result<Self, ForestError> {
        let forest: Self = serde_json::from_str(json)?;
        forest.check()?;
        Ok(forest)
    }

    /// Writes the forest to `path` as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Reads and checks a forest from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let reader = BufReader::new(File::open(path)?);
        let forest: Self = serde_json::from_reader(reader)?;
        forest.check()?;
        Ok(forest)
    }

    fn check(&self) -> Result<(), ForestError> {
        if self.channels != channel_names() {
            return Err(ForestError::Corrupt(format!(
                "channel order mismatch: model has [{}]",
                self.channels.join(", ")
            )));
        }
        if self.trees.is_empty() {
            return Err(ForestError::Corrupt("model has no trees".into()));
        }
        if self.max_samples == 0 {
            return Err(ForestError::Corrupt("max_samples is zero".into()));
        }
        if !self.offset.is_finite() {
            return Err(ForestError::Corrupt("offset is not finite".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check()
                .map_err(|msg| ForestError::Corrupt(format!("tree {i}: {msg}")))?;
        }
        Ok(())
    }
}

impl DecisionScorer for IsolationForest {
    fn name(&self) -> &'static str {
        "isolation-forest"
    }

    fn decision_score(&self, features: &FeatureVector) -> Result<DecisionScore, ScorerError> {
        Ok(self.decision_function(features))
    }
}

/// Loads a persisted forest as a shared scorer.
///
/// Returns `None`, with a warning, if the model is missing or invalid.
/// Readings are then recorded with status `Unknown`.
pub fn load_scorer(path: impl AsRef<Path>) -> Option<Arc<dyn DecisionScorer>> {
    let path = path.as_ref();
    match IsolationForest::load(path) {
        Ok(forest) => {
            tracing::info!(
                path = %path.display(),
                trees = forest.tree_count(),
                "anomaly model loaded"
            );
            Some(Arc::new(forest))
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "anomaly model unavailable; readings will be marked unknown"
            );
            None
        }
    }
}

fn channel_names() -> Vec<String> {
    Channel::ALL.iter().map(|c| c.name().to_string()).collect()
}

/// Percentile with linear interpolation between closest ranks.
fn percentile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = q / 100.0 * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::Rng;

    /// Healthy-looking rows: analog channels jittered around a baseline,
    /// digital channels fixed.
    pub(crate) fn healthy_rows(n: usize, seed: u64) -> Vec<FeatureVector> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                FeatureVector::from_fn(|c| match c {
                    Channel::Tp2 => rng.random_range(-0.02..0.02),
                    Channel::Tp3 => 9.0 + rng.random_range(-0.3..0.3),
                    Channel::H1 => 9.0 + rng.random_range(-0.3..0.3),
                    Channel::DvPressure => rng.random_range(-0.02..0.02),
                    Channel::Reservoirs => 9.0 + rng.random_range(-0.3..0.3),
                    Channel::OilTemperature => 60.0 + rng.random_range(-2.0..2.0),
                    Channel::MotorCurrent => 4.0 + rng.random_range(-0.2..0.2),
                    _ => 1.0,
                })
            })
            .collect()
    }

    fn outlier() -> FeatureVector {
        FeatureVector::from_fn(|c| match c {
            Channel::Tp2 => 8.0,
            Channel::Tp3 => 2.0,
            Channel::H1 => 0.5,
            Channel::DvPressure => 3.0,
            Channel::Reservoirs => 2.0,
            Channel::OilTemperature => 95.0,
            Channel::MotorCurrent => 9.0,
            _ => 0.0,
        })
    }

    fn baseline() -> FeatureVector {
        FeatureVector::from_fn(|c| match c {
            Channel::Tp3 | Channel::H1 | Channel::Reservoirs => 9.0,
            Channel::OilTemperature => 60.0,
            Channel::MotorCurrent => 4.0,
            Channel::Tp2 | Channel::DvPressure => 0.0,
            _ => 1.0,
        })
    }

    fn small_config() -> ForestConfig {
        ForestConfig::default().with_estimators(50)
    }

    #[test]
    fn test_config_defaults() {
        let config = ForestConfig::default();
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_samples, 256);
        assert_eq!(config.contamination, Contamination::Fraction(0.01));
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(ForestConfig::default().with_estimators(0).validate().is_err());
        assert!(ForestConfig::default().with_max_samples(0).validate().is_err());
        for p in [0.0, -0.1, 0.6, f64::NAN] {
            let config = ForestConfig::default().with_contamination(Contamination::Fraction(p));
            assert!(config.validate().is_err(), "p = {p}");
        }
        let config = ForestConfig::default().with_contamination(Contamination::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fit_empty() {
        let err = IsolationForest::fit(&[], &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ForestError::EmptyTrainingSet));
    }

    #[test]
    fn test_fit_non_finite() {
        let mut rows = healthy_rows(10, 1);
        rows.push(FeatureVector::from_fn(|_| f64::NAN));
        let err = IsolationForest::fit(&rows, &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, ForestError::NonFiniteSample { index: 10 }));
    }

    #[test]
    fn test_fit_extreme_values() {
        let mut rows = healthy_rows(50, 1);
        rows.push(FeatureVector::from_fn(|_| 1e308));
        rows.push(FeatureVector::from_fn(|_| -1e308));
        let forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        assert!(forest.decision_function(&rows[0]).is_finite());
    }

    #[test]
    fn test_max_samples_capped() {
        let rows = healthy_rows(40, 1);
        let forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        assert_eq!(forest.max_samples(), 40);
        assert_eq!(forest.tree_count(), 50);
    }

    #[test]
    fn test_deterministic() {
        let rows = healthy_rows(300, 3);
        let a = IsolationForest::fit(&rows, &small_config()).unwrap();
        let b = IsolationForest::fit(&rows, &small_config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.decision_function(&outlier()), b.decision_function(&outlier()));
    }

    #[test]
    fn test_seed_changes_forest() {
        let rows = healthy_rows(300, 3);
        let a = IsolationForest::fit(&rows, &small_config()).unwrap();
        let b = IsolationForest::fit(&rows, &small_config().with_seed(7)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_outlier_scores_lower() {
        let rows = healthy_rows(500, 5);
        let forest = IsolationForest::fit(&rows, &ForestConfig::default()).unwrap();

        let normal = forest.decision_function(&baseline());
        let anomaly = forest.decision_function(&outlier());
        assert!(anomaly < normal, "anomaly {anomaly} vs normal {normal}");
        assert!(anomaly < 0.0);
        assert!(forest.is_inlier(&baseline()));
        assert!(!forest.is_inlier(&outlier()));
    }

    #[test]
    fn test_score_samples_range() {
        let rows = healthy_rows(200, 5);
        let forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        for x in rows.iter().chain([outlier()].iter()) {
            let s = forest.score_samples(x);
            assert!((-1.0..0.0).contains(&s), "score {s}");
        }
    }

    #[test]
    fn test_contamination_fraction() {
        let rows = healthy_rows(400, 9);
        let config = small_config().with_contamination(Contamination::Fraction(0.1));
        let forest = IsolationForest::fit(&rows, &config).unwrap();

        let below = rows
            .iter()
            .filter(|r| forest.decision_function(r) < 0.0)
            .count();
        // 10% of 400, allowing for tied scores
        assert!((25..=55).contains(&below), "below zero: {below}");
    }

    #[test]
    fn test_auto_offset() {
        let rows = healthy_rows(100, 9);
        let config = small_config().with_contamination(Contamination::Auto);
        let forest = IsolationForest::fit(&rows, &config).unwrap();
        assert_eq!(forest.offset(), -0.5);
    }

    #[test]
    fn test_percentile_interpolates() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&mut values, 0.0), 1.0);
        assert_eq!(percentile(&mut values, 100.0), 4.0);
        assert!((percentile(&mut values, 50.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let rows = healthy_rows(100, 2);
        let forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        let restored = IsolationForest::from_json(&forest.to_json().unwrap()).unwrap();
        for r in &rows {
            assert_eq!(forest.decision_function(r), restored.decision_function(r));
        }
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let rows = healthy_rows(100, 2);
        let forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        forest.save(&path).unwrap();

        let loaded = IsolationForest::load(&path).unwrap();
        assert_eq!(loaded, forest);
        assert_eq!(
            loaded.decision_function(&outlier()),
            forest.decision_function(&outlier())
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = IsolationForest::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ForestError::Io(_)));
        assert!(load_scorer(dir.path().join("absent.json")).is_none());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = IsolationForest::from_json("{\"trees\": 3}").unwrap_err();
        assert!(matches!(err, ForestError::Json(_)));
    }

    #[test]
    fn test_load_rejects_channel_mismatch() {
        let rows = healthy_rows(50, 2);
        let mut forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        forest.channels.swap(0, 1);
        let err = IsolationForest::from_json(&forest.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, ForestError::Corrupt(_)));
    }

    #[test]
    fn test_load_rejects_empty_forest() {
        let rows = healthy_rows(50, 2);
        let mut forest = IsolationForest::fit(&rows, &small_config()).unwrap();
        forest.trees.clear();
        let err = IsolationForest::from_json(&forest.to_json().unwrap()).unwrap_err();
        assert!(err.to_string().contains("no trees"));
    }

    #[test]
    fn test_load_scorer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let rows = healthy_rows(100, 2);
        IsolationForest::fit(&rows, &small_config())
            .unwrap()
            .save(&path)
            .unwrap();

        let scorer = load_scorer(&path).expect("model should load");
        assert_eq!(scorer.name(), "isolation-forest");
        assert!(scorer.decision_score(&outlier()).unwrap() < 0.0);
    }
}
