//! Technique Rule Engine
//!
//! Maps normalized anomaly records onto ATT&CK technique matches by
//! driving the fixed rule-order arrays in `rules`. Pure functions: no
//! shared state, no cross-record memory.

pub mod normalize;
pub mod rules;
pub mod types;

use self::normalize::{markov_anomaly_metric, som_anomaly_metric};
use self::rules::{RuleThresholds, MARKOV_RULES, SOM_RULES};
use self::types::{SequenceRecord, SomRecord, TechniqueMatch};

/// Evaluate the sequence-source rule set against one record.
///
/// Records below the anomaly gate produce no matches regardless of their
/// action content.
pub fn evaluate_markov(
    record: &SequenceRecord,
    thresholds: &RuleThresholds,
) -> Vec<TechniqueMatch> {
    let metric = markov_anomaly_metric(record.score(), thresholds);
    if metric < thresholds.markov_gate {
        return Vec::new();
    }

    let actions = record.actions();
    let mut matches = Vec::new();
    for rule in MARKOV_RULES {
        if let Some(m) = rule.evaluate(&actions, metric, &matches, thresholds) {
            matches.push(m);
        }
    }
    matches
}

/// Evaluate the map-source rule set against one record. No gate; every
/// rule is checked independently.
pub fn evaluate_som(record: &SomRecord, thresholds: &RuleThresholds) -> Vec<TechniqueMatch> {
    let rate = som_anomaly_metric(record);
    let mut matches = Vec::new();
    for rule in SOM_RULES {
        if let Some(m) = rule.evaluate(record, rate, thresholds) {
            matches.push(m);
        }
    }
    matches
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t() -> RuleThresholds {
        RuleThresholds::default()
    }

    #[test]
    fn zero_score_login_sequence_fires_valid_accounts_only() {
        let rec = SequenceRecord::from_value(json!({
            "user_id": "u1",
            "actions": ["login", "compress_data"],
            "score": 0.0
        }))
        .unwrap();

        let matches = evaluate_markov(&rec, &t());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "T1078");
        assert_eq!(matches[0].confidence, 0.7);
        // Another rule fired, so the TA0009 fallback must stay silent
        assert!(matches.iter().all(|m| m.id != "TA0009"));
    }

    #[test]
    fn below_gate_sequence_yields_nothing() {
        let rec = SequenceRecord::from_value(json!({
            "user_id": "u2",
            "actions": ["foo", "foo", "foo"],
            "score": 0.5
        }))
        .unwrap();

        // metric = 0.125, far below the 0.9 gate
        assert!(evaluate_markov(&rec, &t()).is_empty());
    }

    #[test]
    fn below_gate_even_with_login_token() {
        let rec = SequenceRecord::from_value(json!({
            "user_id": "u2",
            "actions": ["login"],
            "score": 1.0
        }))
        .unwrap();
        assert!(evaluate_markov(&rec, &t()).is_empty());
    }

    #[test]
    fn fallback_fires_when_no_pattern_matches_at_max_anomaly() {
        let rec = SequenceRecord::from_value(json!({
            "user_id": "u3",
            "actions": ["read_file"],
            "score": 0.0
        }))
        .unwrap();

        let matches = evaluate_markov(&rec, &t());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "TA0009");
        assert_eq!(matches[0].confidence, 0.55);
    }

    #[test]
    fn transition_string_is_parsed_before_evaluation() {
        let rec = SequenceRecord::from_value(json!({
            "user_id": "u4",
            "sequence": "auth_login -> export -> export -> export",
            "score": 0.0
        }))
        .unwrap();

        let matches = evaluate_markov(&rec, &t());
        // login substring in auth_login plus a dominant repeated action
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["T1078", "T1041"]);
    }

    #[test]
    fn som_record_can_fire_multiple_independent_rules() {
        let rec = SomRecord::from_value(json!({
            "user_id": "u3",
            "attack_score": 5,
            "benign_score": 1,
            "total_epochs": 10,
            "flagged_epochs": 10
        }))
        .unwrap();

        let matches = evaluate_som(&rec, &t());
        let ids: Vec<_> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["T1070.004", "T1078"]);
        assert_eq!(matches[0].confidence, 0.9);
        assert_eq!(matches[1].confidence, 0.8);
    }

    #[test]
    fn quiet_som_record_yields_nothing() {
        let rec = SomRecord::from_value(json!({
            "user_id": "u5",
            "attack_score": 0,
            "benign_score": 4,
            "total_epochs": 10,
            "flagged_epochs": 2
        }))
        .unwrap();
        assert!(evaluate_som(&rec, &t()).is_empty());
    }
}
