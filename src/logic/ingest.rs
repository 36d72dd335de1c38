//! Input Ingestion
//!
//! The two model output formats behind one "yield records" surface:
//! - Markov sequence log: newline-delimited JSON, parse-error tolerant
//!   (malformed lines are skipped, the line counter still advances).
//! - SOM results: a single JSON array; any top-level parse failure aborts
//!   the whole source, no partial parse.

use std::fs;
use std::path::Path;

use serde::de::Error as _;
use serde_json::Value;

use super::engine::types::{SequenceRecord, SomRecord};
use super::error::MapperError;

/// Parsed sequence log with the raw line count for summary reporting
#[derive(Debug)]
pub struct SequenceLog {
    pub records: Vec<SequenceRecord>,
    pub total_lines: usize,
}

/// Read a Markov JSONL file, skipping malformed lines silently.
pub fn read_sequence_log(path: &Path) -> Result<SequenceLog, MapperError> {
    let content = fs::read_to_string(path).map_err(|e| MapperError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::new();
    let mut total_lines = 0usize;
    for line in content.lines() {
        total_lines += 1;
        match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => match SequenceRecord::from_value(value) {
                Some(record) => records.push(record),
                None => log::debug!("line {}: not a JSON object, skipped", total_lines),
            },
            Err(e) => log::debug!("line {}: unparseable, skipped ({})", total_lines, e),
        }
    }

    Ok(SequenceLog {
        records,
        total_lines,
    })
}

/// Read a SOM results file as one JSON array of record objects.
pub fn read_som_results(path: &Path) -> Result<Vec<SomRecord>, MapperError> {
    let content = fs::read_to_string(path).map_err(|e| MapperError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let values: Vec<Value> = serde_json::from_str(&content).map_err(|e| MapperError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match SomRecord::from_value(value) {
            Some(record) => records.push(record),
            // A broken array aborts the whole source, no partial parse
            None => {
                return Err(MapperError::Parse {
                    path: path.to_path_buf(),
                    source: serde_json::Error::custom("array element is not an object"),
                })
            }
        }
    }
    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
