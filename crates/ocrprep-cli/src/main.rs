// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrprep — OCR pre-processing command line.
//
// Entry point. Initialises logging on stderr, runs the requested command and
// prints the outcome tag on stdout.

use clap::Parser;
use ocrprep_cli::{Cli, run};
use ocrprep_core::human_errors::humanize_error;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(status) => println!("{status}"),
        Err(err) => {
            tracing::error!(error = %err, "ocrprep failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("hint: {}", human.suggestion);
            std::process::exit(human.exit_code);
        }
    }
}
