//! Mapper Error Taxonomy
//!
//! Every variant is a per-source or per-write failure: none of them abort
//! the whole run. A corrupt prior report is not an error (the report store
//! falls back to an empty report), and malformed JSONL lines are skipped
//! inside ingestion.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    /// Input file missing or unreadable; aborts that source only.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Whole-array input failed to parse; no partial parse is attempted.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Report could not be persisted; in-memory results are kept.
    #[error("failed to write report {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
