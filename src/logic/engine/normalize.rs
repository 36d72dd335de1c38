//! Anomaly Normalizer
//!
//! Converts raw model scores into the common anomaly metric used for rule
//! gating. The two sources normalize differently; see each function.

use super::rules::RuleThresholds;
use super::types::SomRecord;

/// Metric for a sequence-model record, bounded to [0, 1].
///
/// A score of exactly 0.0 means MAXIMAL anomaly: the upstream Markov model
/// emits 0.0 for degenerate/impossible transitions, so the scale is
/// inverted at that point. Do not "fix" this.
pub fn markov_anomaly_metric(score: Option<f64>, thresholds: &RuleThresholds) -> f64 {
    match score {
        None => 0.0,
        Some(s) if s == 0.0 => 1.0,
        Some(s) if s > 0.0 => (s / thresholds.score_divisor).min(1.0),
        // Negative scores are outside the model's documented range
        Some(_) => 0.0,
    }
}

/// Metric for a SOM record: attack flags per evaluation epoch.
///
/// Deliberately uncapped; callers must tolerate values above 1.0 when
/// attack_score exceeds the epoch count.
pub fn som_anomaly_metric(record: &SomRecord) -> f64 {
    record.attack_score() / record.epochs_for_rate()
}

// ============================================================================
// TESTS
// ============================================================================
