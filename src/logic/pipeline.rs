//! Analysis Pipeline
//!
//! Drives one invocation: load the prior report, process each requested
//! source in order (sequence source first), rewrite the report only if it
//! grew. Per-source failures are logged and abort that source alone.

use std::path::{Path, PathBuf};

use super::engine;
use super::engine::rules::RuleThresholds;
use super::engine::types::{DetectionEntry, Source};
use super::error::MapperError;
use super::ingest;
use super::reducer;
use super::report::ReportStore;
use super::stats;

/// What to process in one invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub markov_file: Option<PathBuf>,
    pub som_file: Option<PathBuf>,
    pub report_file: PathBuf,
}

/// Per-source outcome for summary logging
#[derive(Debug, Clone, Copy)]
pub struct SourceSummary {
    /// Entries appended to the report
    pub detections: usize,
    /// Records the rules were evaluated against
    pub candidates: usize,
}

/// Process a Markov JSONL file: reduce to the riskiest record per user,
/// then evaluate the sequence rule set on each retained candidate.
pub fn process_markov_file(
    path: &Path,
    report: &mut Vec<DetectionEntry>,
    thresholds: &RuleThresholds,
) -> Result<SourceSummary, MapperError> {
    log::info!("Analyzing Markov sequences for filtering (source: {})", path.display());
    let sequence_log = ingest::read_sequence_log(path)?;

    let candidates = reducer::top_risk_per_user(sequence_log.records, thresholds);
    log::info!(
        "Processing {} riskiest sequences (1 per user) out of {} lines",
        candidates.len(),
        sequence_log.total_lines
    );

    let mut detections = 0;
    for (i, candidate) in candidates.iter().enumerate() {
        let techniques = engine::evaluate_markov(&candidate.record, thresholds);
        if techniques.is_empty() {
            continue;
        }
        detections += 1;
        report.push(DetectionEntry {
            // Numbered by position among retained candidates, so ids can
            // skip when a retained user produces no detections
            sequence_id: format!("Markov_User_{}_TopRisk", i + 1),
            user_id: candidate.user_id.clone(),
            raw_data: candidate.record.raw().clone(),
            source: Source::Markov,
            detected_techniques: techniques,
        });
    }

    log::info!(
        "Markov summary: {} new detections out of {} unique users processed",
        detections,
        candidates.len()
    );
    Ok(SourceSummary {
        detections,
        candidates: candidates.len(),
    })
}

/// Process a SOM results array: evaluate the map rule set on every record.
pub fn process_som_file(
    path: &Path,
    report: &mut Vec<DetectionEntry>,
    thresholds: &RuleThresholds,
) -> Result<SourceSummary, MapperError> {
    log::info!("Processing SOM results (source: {})", path.display());
    let records = ingest::read_som_results(path)?;

    let mut detections = 0;
    for (i, record) in records.iter().enumerate() {
        let techniques = engine::evaluate_som(record, thresholds);
        if techniques.is_empty() {
            continue;
        }
        detections += 1;
        report.push(DetectionEntry {
            sequence_id: format!("SOM_User_{}", i + 1),
            user_id: record.user_id().unwrap_or("N/A").to_string(),
            raw_data: record.raw().clone(),
            source: Source::Som,
            detected_techniques: techniques,
        });
    }

    log::info!(
        "SOM summary: {} new detections out of {} users/entries",
        detections,
        records.len()
    );
    Ok(SourceSummary {
        detections,
        candidates: records.len(),
    })
}

/// Run one full invocation. Returns the final entry count of the merged
/// report; all named error conditions degrade to skip-and-continue.
pub fn run(options: &RunOptions, thresholds: &RuleThresholds) -> usize {
    let store = ReportStore::new(&options.report_file);
    let mut report = store.load();
    let initial_len = report.len();

    if let Some(path) = &options.markov_file {
        match process_markov_file(path, &mut report, thresholds) {
            Ok(s) => log::debug!(
                "markov source done: {}/{} candidates produced detections",
                s.detections,
                s.candidates
            ),
            Err(e) => log::error!("Markov source skipped: {}", e),
        }
    }

    if let Some(path) = &options.som_file {
        match process_som_file(path, &mut report, thresholds) {
            Ok(s) => log::debug!(
                "som source done: {}/{} records produced detections",
                s.detections,
                s.candidates
            ),
            Err(e) => log::error!("SOM source skipped: {}", e),
        }
    }

    if report.len() > initial_len {
        match store.save(&report) {
            Ok(()) => log::info!(
                "Final merged report written to {}",
                store.path().display()
            ),
            Err(e) => log::error!("{} - results kept in memory only", e),
        }

        let run_stats = stats::compute(&report[initial_len..]);
        log::info!(
            "This run: {} entries, {} unique techniques (confidence high/medium/low: {}/{}/{})",
            run_stats.total_entries,
            run_stats.unique_techniques,
            run_stats.high_confidence,
            run_stats.medium_confidence,
            run_stats.low_confidence
        );
    }

    report.len()
}

// ============================================================================
// TESTS
// ============================================================================
