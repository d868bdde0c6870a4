//! nestscan CLI
//!
//! # Usage
//!
//! ```bash
//! # advisory text report
//! nestscan path/to/classes
//!
//! # one JSON object per finding
//! nestscan --json path/to/classes
//!
//! # verbose pass progress
//! RUST_LOG=debug nestscan path/to/classes
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use nestscan_analysis::AnalysisPipeline;
use nestscan_classfile::ClassCorpus;

#[derive(Parser)]
#[command(name = "nestscan")]
#[command(about = "Report package-private members only used inside their own nest", long_about = None)]
struct Cli {
    /// Directory tree of compiled .class files (or a single .class file)
    corpus: PathBuf,

    /// Emit findings as JSON objects, one per line
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let pipeline = AnalysisPipeline::new(ClassCorpus::new(cli.corpus));

    let report = match pipeline.run() {
        Ok(report) => report,
        Err(err) => {
            error!("analysis failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    for finding in &report {
        if cli.json {
            match serde_json::to_string(finding) {
                Ok(line) => println!("{line}"),
                Err(err) => {
                    error!("failed to serialize finding: {err}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{finding}");
        }
    }
    ExitCode::SUCCESS
}
