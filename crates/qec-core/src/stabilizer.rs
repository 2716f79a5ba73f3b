//! Stabilizer checks: named, weighted, scored validation checks.
//!
//! Scoring is a strategy behind the per-check contract
//! `(name, weight) -> (outcome, confidence)`. The reference strategy is a
//! seeded simulation; a real analyzer can replace it without touching the
//! runner or the synthesizer.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::types::{Outcome, StabilizerResult, StabilizerSpec};
use crate::AnalysisError;

/// Reference probability that a simulated check passes.
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.8;

/// Ordered list of configured stabilizers.
///
/// An empty set is representable; certificate synthesis rejects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerSet {
    stabilizers: Vec<StabilizerSpec>,
}

impl StabilizerSet {
    /// Build a set, rejecting blank names and weights outside [0, 1].
    pub fn new(stabilizers: Vec<StabilizerSpec>) -> Result<Self, AnalysisError> {
        for spec in &stabilizers {
            if spec.name.trim().is_empty() {
                return Err(AnalysisError::InvalidConfiguration(
                    "stabilizer name must not be blank".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(&spec.weight) {
                return Err(AnalysisError::InvalidConfiguration(format!(
                    "stabilizer '{}' weight {} outside [0, 1]",
                    spec.name, spec.weight
                )));
            }
        }
        Ok(Self { stabilizers })
    }

    /// The five reference stabilizers.
    pub fn reference() -> Self {
        Self {
            stabilizers: vec![
                StabilizerSpec::new("syntax_validation", 0.8),
                StabilizerSpec::new("semantic_consistency", 1.0),
                StabilizerSpec::new("security_analysis", 0.9),
                StabilizerSpec::new("performance_check", 0.7),
                StabilizerSpec::new("compliance_audit", 0.95),
            ],
        }
    }

    /// Parse a set from YAML of the form `stabilizers: [{name, weight}, ...]`.
    pub fn from_yaml(yaml: &str) -> Result<Self, AnalysisError> {
        let raw: StabilizerSet = serde_yaml::from_str(yaml)
            .map_err(|e| AnalysisError::InvalidConfiguration(e.to_string()))?;
        Self::new(raw.stabilizers)
    }

    pub fn specs(&self) -> &[StabilizerSpec] {
        &self.stabilizers
    }

    pub fn len(&self) -> usize {
        self.stabilizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stabilizers.is_empty()
    }
}

impl Default for StabilizerSet {
    fn default() -> Self {
        Self::reference()
    }
}

/// Outcome and confidence for one check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerScore {
    pub outcome: Outcome,
    pub confidence: f64,
}

impl StabilizerScore {
    pub fn new(outcome: Outcome, confidence: f64) -> Self {
        Self {
            outcome,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Pluggable scoring for a single stabilizer.
pub trait ScoringStrategy: Send + Sync {
    fn score(&self, spec: &StabilizerSpec) -> StabilizerScore;

    /// Strategy name for logs.
    fn name(&self) -> &str;
}

/// Seeded pseudo-random scoring.
///
/// Each check passes with `success_probability`; confidence is drawn from
/// [0.7, 0.95] on a pass and [0.3, 0.6] on a failure.
pub struct SimulatedScoring {
    rng: Mutex<StdRng>,
    success_probability: f64,
    pass_confidence: RangeInclusive<f64>,
    fail_confidence: RangeInclusive<f64>,
}

impl SimulatedScoring {
    /// Seeded when `seed` is given, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            success_probability: DEFAULT_SUCCESS_PROBABILITY,
            pass_confidence: 0.7..=0.95,
            fail_confidence: 0.3..=0.6,
        }
    }

    /// Override `p_success`; clamped to [0, 1].
    pub fn with_success_probability(mut self, probability: f64) -> Self {
        self.success_probability = if probability.is_nan() {
            DEFAULT_SUCCESS_PROBABILITY
        } else {
            probability.clamp(0.0, 1.0)
        };
        self
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }
}

impl ScoringStrategy for SimulatedScoring {
    fn score(&self, _spec: &StabilizerSpec) -> StabilizerScore {
        let mut rng = self.rng.lock();
        let outcome = if rng.gen_bool(self.success_probability) {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        let range = match outcome {
            Outcome::Pass => self.pass_confidence.clone(),
            Outcome::Fail => self.fail_confidence.clone(),
        };
        StabilizerScore::new(outcome, rng.gen_range(range))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

/// Deterministic scoring: a default score with per-stabilizer overrides.
#[derive(Debug, Clone)]
pub struct FixedScoring {
    default: StabilizerScore,
    overrides: BTreeMap<String, StabilizerScore>,
}

impl FixedScoring {
    /// Every check gets the same outcome and confidence.
    pub fn uniform(outcome: Outcome, confidence: f64) -> Self {
        Self {
            default: StabilizerScore::new(outcome, confidence),
            overrides: BTreeMap::new(),
        }
    }

    /// Override the score of one named stabilizer.
    pub fn with(mut self, name: impl Into<String>, outcome: Outcome, confidence: f64) -> Self {
        self.overrides
            .insert(name.into(), StabilizerScore::new(outcome, confidence));
        self
    }
}

impl ScoringStrategy for FixedScoring {
    fn score(&self, spec: &StabilizerSpec) -> StabilizerScore {
        self.overrides
            .get(&spec.name)
            .copied()
            .unwrap_or(self.default)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Run every configured stabilizer, in configuration order.
pub fn run_stabilizer_checks(
    stabilizers: &StabilizerSet,
    strategy: &dyn ScoringStrategy,
) -> Vec<StabilizerResult> {
    stabilizers
        .specs()
        .iter()
        .map(|spec| {
            let score = strategy.score(spec);
            tracing::debug!(
                stabilizer = %spec.name,
                strategy = strategy.name(),
                outcome = score.outcome.value(),
                confidence = score.confidence,
                "Stabilizer check scored"
            );
            StabilizerResult {
                name: spec.name.clone(),
                outcome: score.outcome,
                confidence: score.confidence,
                weight: spec.weight,
                description: format!("Enhanced {} check", spec.name.replace('_', " ")),
            }
        })
        .collect()
}
