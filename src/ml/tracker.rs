use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Category, PendingPrediction};

/// Running prediction scorecard, stored as JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionStats {
    pub total_predictions: u64,
    pub correct_predictions: u64,
}

impl PredictionStats {
    /// Rounded hit rate in percent, 0 before any prediction was scored
    pub fn accuracy_percent(&self) -> u64 {
        if self.total_predictions == 0 {
            return 0;
        }
        (self.correct_predictions as f64 * 100.0 / self.total_predictions as f64).round() as u64
    }

    /// Clamp hand-edited data back to `correct <= total`
    pub fn normalized(self) -> Self {
        Self {
            total_predictions: self.total_predictions,
            correct_predictions: self.correct_predictions.min(self.total_predictions),
        }
    }
}

/// What happens to the pending prediction once it has been scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Leave it live; it is scored again on the next result
    #[default]
    Keep,
    /// Score a prediction exactly once
    Clear,
}

/// Scores the live prediction against each new result
#[derive(Debug, Clone)]
pub struct PredictionTracker {
    stats: PredictionStats,
    policy: ScoringPolicy,
}

impl PredictionTracker {
    pub fn new(stats: PredictionStats, policy: ScoringPolicy) -> Self {
        Self {
            stats: stats.normalized(),
            policy,
        }
    }

    /// Score `pending` against the realized category.
    /// Returns whether it was correct, or None when nothing was pending.
    pub fn record(&mut self, pending: &mut Option<PendingPrediction>, actual: Category) -> Option<bool> {
        let prediction = pending.as_ref()?;
        let correct = prediction.category == actual;

        self.stats.total_predictions += 1;
        if correct {
            self.stats.correct_predictions += 1;
        }
        debug!(
            "Scored {} prediction {} against {}: {}/{}",
            prediction.source,
            prediction.category,
            actual,
            self.stats.correct_predictions,
            self.stats.total_predictions
        );

        if self.policy == ScoringPolicy::Clear {
            *pending = None;
        }
        Some(correct)
    }

    pub fn stats(&self) -> PredictionStats {
        self.stats
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }
}
