//! Central Configuration Constants
//!
//! Single source of truth for configuration defaults.
//! Rule thresholds live in `logic::engine::rules`, not here.

/// Default merged report path, shared across invocations
pub const REPORT_FILE_NAME: &str = "mitre_detection_report.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "UEBA MITRE Mapper";
