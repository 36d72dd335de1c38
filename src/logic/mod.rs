//! Core Mapping Logic
//!
//! Everything behind the CLI: ingestion, normalization, the technique
//! rule engine, per-user reduction, and report persistence.

pub mod engine;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod reducer;
pub mod report;
pub mod stats;
