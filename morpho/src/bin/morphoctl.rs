//! Command-line front end for the morpho pipeline
//!
//! # Usage
//!
//! ```bash
//! # Generate a synthetic moving-blob series
//! morphoctl synth synth.npy --kind blob
//!
//! # Detailed report: per-detection table + centroid figure (+ summary)
//! morphoctl report synth.npy --out report.json --fig report.png --summary-out summary.json
//! morphoctl report synth.npy --format csv --out report.csv --threshold 0.4 --min-area 20
//!
//! # Minimal path: per-frame area metrics + overlay of the last frame
//! morphoctl track synth.npy --out summary.json --overlay overlay.png --alpha 0.5
//! ```
//!
//! Any failure is printed to stderr and the process exits with status 2.

use clap::Parser;
use morpho::cli::{exit_code, run, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let result = run(Cli::parse());
    if let Err(e) = &result {
        eprintln!("{e}");
    }
    ExitCode::from(exit_code(&result))
}
