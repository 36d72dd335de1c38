//! Detection Types
//!
//! Data structures for the rule engine and the merged report.
//! No rule logic here - only types and raw-record field access.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// MODEL SOURCES
// ============================================================================

/// Which behavioral model produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Sequence/transition model over user action histories
    Markov,
    /// Self-organizing-map model, scored per evaluation epoch
    Som,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Markov => "markov",
            Source::Som => "som",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RAW RECORD VIEWS
// ============================================================================

/// One line of the Markov model's JSONL output.
///
/// The raw JSON object is kept verbatim so the report can echo it back
/// unchanged; accessors apply presence checks and neutral defaults only.
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    raw: Value,
}

impl SequenceRecord {
    /// Accepts only JSON objects; anything else counts as malformed.
    pub fn from_value(raw: Value) -> Option<Self> {
        raw.is_object().then(|| Self { raw })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn user_id(&self) -> Option<&str> {
        self.raw.get("user_id").and_then(Value::as_str)
    }

    /// Model score, absent when the field is missing or non-numeric.
    pub fn score(&self) -> Option<f64> {
        self.raw.get("score").and_then(Value::as_f64)
    }

    /// Action tokens: a non-empty `"a->b->c"` transition string wins over
    /// an explicit `actions` array.
    pub fn actions(&self) -> Vec<String> {
        if let Some(seq) = self.raw.get("sequence").and_then(Value::as_str) {
            if !seq.is_empty() {
                return seq.split("->").map(|a| a.trim().to_string()).collect();
            }
        }
        self.raw
            .get("actions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One element of the SOM model's results array.
#[derive(Debug, Clone)]
pub struct SomRecord {
    raw: Value,
}

impl SomRecord {
    pub fn from_value(raw: Value) -> Option<Self> {
        raw.is_object().then(|| Self { raw })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn user_id(&self) -> Option<&str> {
        self.raw.get("user_id").and_then(Value::as_str)
    }

    fn number(&self, field: &str, default: f64) -> f64 {
        self.raw.get(field).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn attack_score(&self) -> f64 {
        self.number("attack_score", 0.0)
    }

    pub fn benign_score(&self) -> f64 {
        self.number("benign_score", 0.0)
    }

    /// Raw epoch count, defaulting to 1 when absent. Used for the
    /// flagged-epochs equality check; NOT zero-guarded.
    pub fn total_epochs(&self) -> f64 {
        self.number("total_epochs", 1.0)
    }

    pub fn flagged_epochs(&self) -> f64 {
        self.number("flagged_epochs", 0.0)
    }

    /// Division-safe epoch count for the attack rate.
    pub fn epochs_for_rate(&self) -> f64 {
        let epochs = self.total_epochs();
        if epochs == 0.0 {
            1.0
        } else {
            epochs
        }
    }
}

// ============================================================================
// DETECTIONS
// ============================================================================

/// A single matched ATT&CK technique (or tactic) with its confidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechniqueMatch {
    /// ATT&CK identifier, e.g. "T1078" or "TA0009"
    pub id: String,
    /// Human-readable technique name
    pub name: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Name of the rule that fired; unique per rule per evaluation pass
    pub rule_matched: String,
    pub description: String,
    /// Diagnostic values backing the match
    pub evidence: Map<String, Value>,
}

/// One report entry; only created when at least one technique matched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEntry {
    pub sequence_id: String,
    pub user_id: String,
    /// The model output record, echoed verbatim
    pub raw_data: Value,
    pub source: Source,
    pub detected_techniques: Vec<TechniqueMatch>,
}

// ============================================================================
// TESTS
// ============================================================================
