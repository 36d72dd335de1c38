//! Technique Mapping Rules & Thresholds
//!
//! The closed rule set mapping normalized anomaly records onto ATT&CK
//! technique identifiers. Each rule is one enum variant carrying its own
//! predicate and confidence formula; evaluation order is the fixed order
//! of the `MARKOV_RULES` / `SOM_RULES` arrays.

use serde_json::{json, Map, Value};

use super::types::{SomRecord, TechniqueMatch};

// ============================================================================
// THRESHOLDS (Constants - calibrated against the upstream models)
// ============================================================================

/// Sequence records below this metric produce no matches at all
pub const MARKOV_GATE_THRESHOLD: f64 = 0.9;

/// An action dominating this share of a sequence counts as repetitive
pub const REPETITION_RATIO: f64 = 0.6;

/// Divisor scaling positive Markov scores onto [0, 1]
pub const SCORE_DIVISOR: f64 = 4.0;

/// Minimum attack rate (attack_score / epochs) for the SOM high-attack rule
pub const SOM_ATTACK_RATE_MIN: f64 = 0.3;

/// Expected/noise actions excluded from repetition counting
pub const NOISE_ACTIONS: [&str; 3] = ["auth_login", "auth_logout", "sys_windows_event"];

/// Thresholds for rule evaluation (overridable in tests)
#[derive(Debug, Clone)]
pub struct RuleThresholds {
    /// Gate below which no sequence rule runs
    pub markov_gate: f64,
    /// Dominance ratio for the repetitive-action rule
    pub repetition_ratio: f64,
    /// Positive-score scaling divisor
    pub score_divisor: f64,
    /// Attack-rate floor for the SOM high-attack rule
    pub som_attack_rate_min: f64,
    /// Actions ignored by the repetition counter
    pub noise_actions: &'static [&'static str],
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            markov_gate: MARKOV_GATE_THRESHOLD,
            repetition_ratio: REPETITION_RATIO,
            score_divisor: SCORE_DIVISOR,
            som_attack_rate_min: SOM_ATTACK_RATE_MIN,
            noise_actions: &NOISE_ACTIONS,
        }
    }
}

// ============================================================================
// SEQUENCE-SOURCE RULES
// ============================================================================

/// Rules applied to gated sequence-model records, in order
pub const MARKOV_RULES: [MarkovRule; 3] = [
    MarkovRule::SuspiciousLoginPattern,
    MarkovRule::RepetitiveActionPattern,
    MarkovRule::MaxAnomalyFallback,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkovRule {
    /// Any action token containing "login" -> T1078 Valid Accounts
    SuspiciousLoginPattern,
    /// One non-noise action dominating the sequence -> T1041
    RepetitiveActionPattern,
    /// Maximal anomaly but no specific pattern -> TA0009 Collection
    MaxAnomalyFallback,
}

impl MarkovRule {
    pub fn name(&self) -> &'static str {
        match self {
            MarkovRule::SuspiciousLoginPattern => "markov_suspicious_login_pattern",
            MarkovRule::RepetitiveActionPattern => "markov_repetitive_action_pattern",
            MarkovRule::MaxAnomalyFallback => "markov_max_anomaly_score_fallback",
        }
    }

    /// Evaluate this rule against one gated record.
    ///
    /// `prior` holds the matches already produced for this record; only the
    /// fallback rule depends on it (it fires solely when nothing else did).
    pub fn evaluate(
        &self,
        actions: &[String],
        metric: f64,
        prior: &[TechniqueMatch],
        thresholds: &RuleThresholds,
    ) -> Option<TechniqueMatch> {
        match self {
            MarkovRule::SuspiciousLoginPattern => {
                if actions.iter().any(|a| a.to_lowercase().contains("login")) {
                    Some(TechniqueMatch {
                        id: "T1078".to_string(),
                        name: "Valid Accounts".to_string(),
                        confidence: metric.min(0.7),
                        rule_matched: self.name().to_string(),
                        description: "Suspicious login activity detected (Markov)".to_string(),
                        evidence: markov_evidence(metric),
                    })
                } else {
                    None
                }
            }

            MarkovRule::RepetitiveActionPattern => {
                if actions.len() < 3 {
                    return None;
                }

                // Case-insensitive counts in first-seen order; the first
                // action reaching the dominance threshold fires the rule.
                let mut counts: Vec<(String, usize)> = Vec::new();
                for action in actions {
                    let key = action.to_lowercase();
                    if thresholds.noise_actions.contains(&key.as_str()) {
                        continue;
                    }
                    match counts.iter_mut().find(|(a, _)| *a == key) {
                        Some((_, n)) => *n += 1,
                        None => counts.push((key, 1)),
                    }
                }

                let dominance = actions.len() as f64 * thresholds.repetition_ratio;
                counts
                    .iter()
                    .find(|(_, n)| *n as f64 >= dominance)
                    .map(|_| TechniqueMatch {
                        id: "T1041".to_string(),
                        name: "Exfiltration Over Command and Control Channel".to_string(),
                        confidence: metric.min(0.6),
                        rule_matched: self.name().to_string(),
                        description: "Highly repetitive action pattern (Markov)".to_string(),
                        evidence: markov_evidence(metric),
                    })
            }

            MarkovRule::MaxAnomalyFallback => {
                if metric == 1.0 && prior.is_empty() {
                    Some(TechniqueMatch {
                        id: "TA0009".to_string(),
                        name: "Collection".to_string(),
                        confidence: 0.55,
                        rule_matched: self.name().to_string(),
                        description:
                            "Sequence had maximum anomaly (score 0.0) but matched no specific pattern."
                                .to_string(),
                        evidence: markov_evidence(metric),
                    })
                } else {
                    None
                }
            }
        }
    }
}

fn markov_evidence(metric: f64) -> Map<String, Value> {
    let mut evidence = Map::new();
    evidence.insert("anomaly_score".to_string(), json!(metric));
    evidence.insert("source".to_string(), json!("markov"));
    evidence
}

// ============================================================================
// MAP-SOURCE RULES
// ============================================================================

/// Rules applied to every SOM record, in order; no gate, no interdependence
pub const SOM_RULES: [SomRule; 3] = [
    SomRule::HighAttackScore,
    SomRule::AlwaysFlaggedNoAttackScore,
    SomRule::MixedAttackDominant,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SomRule {
    /// Sustained high attack rate -> T1070.004 File Deletion
    HighAttackScore,
    /// Every epoch flagged yet zero attack score -> T1090 Proxy
    AlwaysFlaggedNoAttackScore,
    /// Attack and benign signals both present, attack dominant -> T1078
    MixedAttackDominant,
}

impl SomRule {
    pub fn name(&self) -> &'static str {
        match self {
            SomRule::HighAttackScore => "som_high_attack_score",
            SomRule::AlwaysFlaggedNoAttackScore => "som_always_flagged_no_attack_score",
            SomRule::MixedAttackDominant => "som_mixed_high_attack_score",
        }
    }

    /// Evaluate this rule against one SOM record; `rate` is the record's
    /// (uncapped) anomaly metric.
    pub fn evaluate(
        &self,
        record: &SomRecord,
        rate: f64,
        thresholds: &RuleThresholds,
    ) -> Option<TechniqueMatch> {
        match self {
            SomRule::HighAttackScore => {
                if rate >= thresholds.som_attack_rate_min {
                    let mut evidence = Map::new();
                    evidence.insert("attack_score".to_string(), raw_field(record, "attack_score"));
                    evidence.insert("anomaly_metric".to_string(), json!(rate));
                    evidence.insert("source".to_string(), json!("som"));
                    Some(TechniqueMatch {
                        id: "T1070.004".to_string(),
                        name: "Indicator Removal: File Deletion".to_string(),
                        confidence: (0.5 + rate).min(0.9),
                        rule_matched: self.name().to_string(),
                        description: format!(
                            "SOM flagged high attack-like behavior ({:.2}) over time.",
                            rate
                        ),
                        evidence,
                    })
                } else {
                    None
                }
            }

            SomRule::AlwaysFlaggedNoAttackScore => {
                if record.flagged_epochs() == record.total_epochs() && record.attack_score() == 0.0
                {
                    let mut evidence = Map::new();
                    evidence
                        .insert("flagged_epochs".to_string(), raw_field(record, "flagged_epochs"));
                    evidence.insert("source".to_string(), json!("som"));
                    Some(TechniqueMatch {
                        id: "T1090".to_string(),
                        name: "Proxy".to_string(),
                        confidence: 0.65,
                        rule_matched: self.name().to_string(),
                        description:
                            "User consistently flagged, but low attack score, suggesting an unusual persistent process."
                                .to_string(),
                        evidence,
                    })
                } else {
                    None
                }
            }

            SomRule::MixedAttackDominant => {
                let attack = record.attack_score();
                let benign = record.benign_score();
                if attack > 0.0 && benign > 0.0 && attack > benign {
                    let mut evidence = Map::new();
                    evidence.insert("attack_score".to_string(), raw_field(record, "attack_score"));
                    evidence.insert("benign_score".to_string(), raw_field(record, "benign_score"));
                    evidence.insert("source".to_string(), json!("som"));
                    Some(TechniqueMatch {
                        id: "T1078".to_string(),
                        name: "Valid Accounts".to_string(),
                        confidence: (0.5 + rate).min(0.8),
                        rule_matched: self.name().to_string(),
                        description:
                            "Mixed normal and attack activity, hinting at legitimate credential misuse."
                                .to_string(),
                        evidence,
                    })
                } else {
                    None
                }
            }
        }
    }
}

/// Echo a raw record field into evidence without re-encoding its number type
fn raw_field(record: &SomRecord, field: &str) -> Value {
    record.raw().get(field).cloned().unwrap_or(json!(0))
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

    fn actions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn som(value: Value) -> SomRecord {
        SomRecord::from_value(value).unwrap()
    }

    #[test]
    fn login_rule_is_case_insensitive_substring() {
        let acts = actions(&["AUTH_LOGIN", "read_file"]);
        let m = MarkovRule::SuspiciousLoginPattern
            .evaluate(&acts, 1.0, &[], &t())
            .unwrap();
        assert_eq!(m.id, "T1078");
        assert_eq!(m.confidence, 0.7);
        assert_eq!(m.rule_matched, "markov_suspicious_login_pattern");
    }

    #[test]
    fn login_rule_confidence_caps_at_metric() {
        let acts = actions(&["login"]);
        // Metric below the 0.7 cap is passed through unchanged
        let m = MarkovRule::SuspiciousLoginPattern
            .evaluate(&acts, 0.65, &[], &t())
            .unwrap();
        assert_eq!(m.confidence, 0.65);
    }

    #[test]
    fn repetitive_rule_requires_three_actions() {
        let acts = actions(&["scan", "scan"]);
        assert!(MarkovRule::RepetitiveActionPattern
            .evaluate(&acts, 1.0, &[], &t())
            .is_none());
    }

    #[test]
    fn repetitive_rule_fires_on_dominant_action() {
        let acts = actions(&["upload", "upload", "upload", "read"]);
        let m = MarkovRule::RepetitiveActionPattern
            .evaluate(&acts, 1.0, &[], &t())
            .unwrap();
        assert_eq!(m.id, "T1041");
        assert_eq!(m.confidence, 0.6);
    }

    #[test]
    fn repetitive_rule_ignores_noise_actions() {
        // auth_login dominates but is noise; remaining counts stay below 60%
        let acts = actions(&["auth_login", "auth_login", "auth_login", "read"]);
        assert!(MarkovRule::RepetitiveActionPattern
            .evaluate(&acts, 1.0, &[], &t())
            .is_none());
    }

    #[test]
    fn repetitive_rule_counts_against_full_sequence_length() {
        // 3 of 5 total = 60% even though noise shrinks the counted set
        let acts = actions(&["copy", "copy", "copy", "auth_logout", "read"]);
        assert!(MarkovRule::RepetitiveActionPattern
            .evaluate(&acts, 1.0, &[], &t())
            .is_some());
    }

    #[test]
    fn fallback_requires_exact_max_metric_and_no_prior_match() {
        let acts = actions(&["odd_action"]);
        let m = MarkovRule::MaxAnomalyFallback
            .evaluate(&acts, 1.0, &[], &t())
            .unwrap();
        assert_eq!(m.id, "TA0009");
        assert_eq!(m.confidence, 0.55);

        assert!(MarkovRule::MaxAnomalyFallback
            .evaluate(&acts, 0.95, &[], &t())
            .is_none());

        let prior = vec![m];
        assert!(MarkovRule::MaxAnomalyFallback
            .evaluate(&acts, 1.0, &prior, &t())
            .is_none());
    }

    #[test]
    fn high_attack_rule_thresholds_on_rate() {
        let rec = som(json!({"attack_score": 3, "total_epochs": 10}));
        let m = SomRule::HighAttackScore.evaluate(&rec, 0.3, &t()).unwrap();
        assert_eq!(m.id, "T1070.004");
        assert_eq!(m.confidence, 0.8);

        assert!(SomRule::HighAttackScore.evaluate(&rec, 0.29, &t()).is_none());
    }

    #[test]
    fn high_attack_confidence_caps_at_09() {
        let rec = som(json!({"attack_score": 9, "total_epochs": 10}));
        let m = SomRule::HighAttackScore.evaluate(&rec, 0.9, &t()).unwrap();
        assert_eq!(m.confidence, 0.9);
    }

    #[test]
    fn proxy_rule_fires_iff_always_flagged_with_zero_attack() {
        let rec = som(json!({"flagged_epochs": 10, "total_epochs": 10, "attack_score": 0}));
        let m = SomRule::AlwaysFlaggedNoAttackScore
            .evaluate(&rec, 0.0, &t())
            .unwrap();
        assert_eq!(m.id, "T1090");
        assert_eq!(m.confidence, 0.65);

        let partial = som(json!({"flagged_epochs": 9, "total_epochs": 10, "attack_score": 0}));
        assert!(SomRule::AlwaysFlaggedNoAttackScore
            .evaluate(&partial, 0.0, &t())
            .is_none());

        let with_attack =
            som(json!({"flagged_epochs": 10, "total_epochs": 10, "attack_score": 1}));
        assert!(SomRule::AlwaysFlaggedNoAttackScore
            .evaluate(&with_attack, 0.1, &t())
            .is_none());
    }

    #[test]
    fn mixed_rule_requires_both_signals_attack_dominant() {
        let rec = som(json!({"attack_score": 5, "benign_score": 1, "total_epochs": 10}));
        let m = SomRule::MixedAttackDominant.evaluate(&rec, 0.5, &t()).unwrap();
        assert_eq!(m.id, "T1078");
        assert_eq!(m.confidence, 0.8);

        let benign_dominant =
            som(json!({"attack_score": 1, "benign_score": 5, "total_epochs": 10}));
        assert!(SomRule::MixedAttackDominant
            .evaluate(&benign_dominant, 0.1, &t())
            .is_none());

        let no_benign = som(json!({"attack_score": 5, "benign_score": 0, "total_epochs": 10}));
        assert!(SomRule::MixedAttackDominant
            .evaluate(&no_benign, 0.5, &t())
            .is_none());
    }

    #[test]
    fn evidence_echoes_raw_number_types() {
        let rec = som(json!({"attack_score": 5, "total_epochs": 10}));
        let m = SomRule::HighAttackScore.evaluate(&rec, 0.5, &t()).unwrap();
        assert_eq!(m.evidence["attack_score"], json!(5));
        assert_eq!(m.evidence["source"], json!("som"));
    }
}
