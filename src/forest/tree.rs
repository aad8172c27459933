//! Isolation tree.
//!
//! # Algorithm
//!
//! Grow a binary tree on a subsample by repeatedly choosing a random feature
//! that still varies within the node, and a uniform threshold between its
//! minimum and maximum. Anomalies are isolated in fewer splits, so their
//! path length is short.
//!
//! Nodes are stored in a flat vector in pre-order; children always have a
//! higher index than their parent.
//!
//! # Reference
//! Liu, Ting & Zhou (2008), "Isolation Forest", ICDM

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{FeatureVector, FEATURE_COUNT};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Average path length of an unsuccessful BST search over `n` points.
///
/// `c(n) = 2H(n-1) - 2(n-1)/n`, with `c(1) = 0` and `c(2) = 1`.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grows a tree on `samples`, splitting until `max_depth` or until a
    /// node holds a single point or only identical points.
    pub(crate) fn grow<R: Rng + ?Sized>(
        samples: Vec<&FeatureVector>,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.build(samples, 0, max_depth, rng);
        tree
    }

    fn build<R: Rng + ?Sized>(
        &mut self,
        samples: Vec<&FeatureVector>,
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: samples.len(),
        });
        if depth >= max_depth || samples.len() <= 1 {
            return idx;
        }

        let candidates: Vec<(usize, f64, f64)> = (0..FEATURE_COUNT)
            .filter_map(|f| {
                let (lo, hi) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, x| {
                    (acc.0.min(x.at(f)), acc.1.max(x.at(f)))
                });
                // a span that overflows cannot be sampled uniformly
                (hi > lo && (hi - lo).is_finite()).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return idx;
        }

        let (feature, lo, hi) = candidates[rng.random_range(0..candidates.len())];
        let threshold = rng.random_range(lo..hi);
        let (left, right): (Vec<&FeatureVector>, Vec<&FeatureVector>) = samples
            .into_iter()
            .partition(|x| x.at(feature) <= threshold);

        let left = self.build(left, depth + 1, max_depth, rng);
        let right = self.build(right, depth + 1, max_depth, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    /// Path length of `x`: edges to its leaf plus the expected depth of the
    /// unsplit points left in that leaf.
    pub(crate) fn path_length(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0;
        let mut depth = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x.at(*feature) <= *threshold { *left } else { *right };
                    depth += 1;
                }
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
            }
        }
    }

    /// Number of nodes.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural check for trees read from outside the process.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {i} splits on unknown feature {feature}"));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {i} has a non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i} points to invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}
