/*
 * ==========================================================================
 * PSEUDO - Structured Pseudocode Interpreter
 * ==========================================================================
 * 
 * Author:   Sam Wilcox
 * 
 * License:
 * This file is part of the PSEUDO interpreter project.
 * 
 * PSEUDO is dual-licensed under the terms of:
 *   - The MIT license
 *   - The Apache License, Version 2.0
 * 
 * You may choose either license to govern your use of this software.
 * 
 * Unless required by applicable law or agreed to in writing, software
 * distributed under these licenses is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * 
 * ==========================================================================
 */

//! `pseudo` command-line runner.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pseudo::diagnostics::DiagnosticPrinter;
use pseudo::{run_source, Config, LocalFileSystem, StdIo};

/// Runs a pseudocode program.
#[derive(Parser)]
#[command(name = "pseudo", version, about = "Interpreter for Cambridge-style pseudocode")]
struct Cli {
    /// Program source file.
    file: PathBuf,

    /// JSON file with interpreter options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override runtime.max_statements.
    #[arg(long = "max-statements")]
    max_statements: Option<u64>,

    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let source = match std::fs::read_to_string(&cli.file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", cli.file.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut config = match &cli.config {
        Some(path) => match std::fs::read_to_string(path).map_err(|err| err.to_string()).and_then(|text| {
            Config::from_json(&text).map_err(|err| err.message)
        }) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: invalid config {}: {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(limit) = cli.max_statements {
        config.runtime.max_statements = limit;
    }

    let mut io = StdIo;
    let mut fs = LocalFileSystem::new(".");
    match run_source(&source, &config, &mut io, &mut fs) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            DiagnosticPrinter::new(cli.file.display().to_string(), source.as_str()).print(&err);
            ExitCode::FAILURE
        }
    }
}
