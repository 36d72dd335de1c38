//! Detection Statistics
//!
//! Summary numbers over the entries a run produced, for the final log
//! output. Pure computation, no persistence.

use std::collections::HashSet;

use super::engine::types::DetectionEntry;

/// Aggregated detection counts for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Entries produced (records with at least one match)
    pub total_entries: usize,
    /// Distinct technique/tactic ids across all matches
    pub unique_techniques: usize,
    /// Matches with confidence > 0.8
    pub high_confidence: usize,
    /// Matches with confidence in (0.5, 0.8]
    pub medium_confidence: usize,
    /// Matches with confidence <= 0.5
    pub low_confidence: usize,
}

/// Compute stats over a slice of report entries.
pub fn compute(entries: &[DetectionEntry]) -> RunStats {
    let mut ids: HashSet<&str> = HashSet::new();
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;

    for entry in entries {
        for technique in &entry.detected_techniques {
            ids.insert(technique.id.as_str());
            if technique.confidence > 0.8 {
                high += 1;
            } else if technique.confidence > 0.5 {
                medium += 1;
            } else {
                low += 1;
            }
        }
    }

    RunStats {
        total_entries: entries.len(),
        unique_techniques: ids.len(),
        high_confidence: high,
        medium_confidence: medium,
        low_confidence: low,
    }
}

// ============================================================================
// TESTS
// ============================================================================
