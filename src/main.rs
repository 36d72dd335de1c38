//! UEBA MITRE Mapper - Main Entry Point
//!
//! Maps anomaly outputs from the Markov sequence model and the SOM model
//! onto MITRE ATT&CK techniques and maintains the merged detection report.

mod logic;
pub mod constants;

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use logic::engine::rules::RuleThresholds;
use logic::pipeline::{self, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "mitre-mapper",
    version,
    about = "Maps Markov and SOM anomaly outputs to MITRE ATT&CK techniques"
)]
#[command(group(
    ArgGroup::new("inputs").required(true).multiple(true)
))]
struct Cli {
    /// Path to the Markov JSONL output file
    #[arg(long, group = "inputs")]
    markov_file: Option<PathBuf>,

    /// Path to the SOM JSON results file
    #[arg(long, group = "inputs")]
    som_file: Option<PathBuf>,

    /// Path of the merged detection report
    #[arg(long, default_value = constants::REPORT_FILE_NAME)]
    report_file: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(
        "Starting {} v{}",
        constants::APP_NAME,
        constants::APP_VERSION
    );

    let options = RunOptions {
        markov_file: cli.markov_file,
        som_file: cli.som_file,
        report_file: cli.report_file,
    };

    let total = pipeline::run(&options, &RuleThresholds::default());

    log::info!("Total entries in merged report: {}", total);
    log::info!("Analysis and merging complete");
}
