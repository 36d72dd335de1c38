//! Report Store
//!
//! Loads and rewrites the merged detection report. The report is
//! append-only across runs: prior entries are never mutated or deleted,
//! and the file is rewritten in full only when the run added entries.
//! A missing or corrupt prior report degrades to an empty one.

use std::fs;
use std::path::{Path, PathBuf};

use super::engine::types::DetectionEntry;
use super::error::MapperError;

pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior report; absent, empty or corrupt files all yield an
    /// empty report. Never fails the run.
    pub fn load(&self) -> Vec<DetectionEntry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) if !c.is_empty() => c,
            Ok(_) => return Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!(
                    "could not load existing report {}: {} - starting a new report",
                    self.path.display(),
                    e
                );
                return Vec::new();
            }
        };

        log::info!("Loading existing report: {}", self.path.display());
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "existing report {} is not valid JSON: {} - starting a new report",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Rewrite the report file in full, pretty-printed.
    pub fn save(&self, entries: &[DetectionEntry]) -> Result<(), MapperError> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| MapperError::Write {
            path: self.path.clone(),
            source: e.into(),
        })?;
        fs::write(&self.path, json).map_err(|e| MapperError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::engine::types::{Source, TechniqueMatch};
    use serde_json::json;

    fn entry(sequence_id: &str) -> DetectionEntry {
        DetectionEntry {
            sequence_id: sequence_id.to_string(),
            user_id: "u1".to_string(),
            raw_data: json!({"score": 0.0}),
            source: Source::Markov,
            detected_techniques: vec![TechniqueMatch {
                id: "TA0009".to_string(),
                name: "Collection".to_string(),
                confidence: 0.55,
                rule_matched: "markov_max_anomaly_score_fallback".to_string(),
                description: "test".to_string(),
                evidence: serde_json::Map::new(),
            }],
        }
    }

    #[test]
    fn missing_report_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("report.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_report_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, "{ definitely broken").unwrap();
        let store = ReportStore::new(path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("report.json"));
        store.save(&[entry("Markov_User_1_TopRisk")]).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sequence_id, "Markov_User_1_TopRisk");
        assert_eq!(loaded[0].detected_techniques[0].id, "TA0009");
    }

    #[test]
    fn save_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("report.json"));
        store.save(&[entry("SOM_User_1")]).unwrap();
        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains('\n'));
        assert!(content.starts_with('['));
    }

    #[test]
    fn save_to_unwritable_path_is_write_error() {
        let store = ReportStore::new("/nonexistent/dir/report.json");
        assert!(matches!(
            store.save(&[entry("x")]).unwrap_err(),
            MapperError::Write { .. }
        ));
    }
}
