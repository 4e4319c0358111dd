// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pek` — the embedded interactive facility of a tiny demo binary over the
//! plan execution kernel.
//!
//! Builds a small two-task demo plan (`fetch` signals `deliver` to start
//! once it succeeds), drives it through [`pek_engine::Engine`] for a fixed
//! number of cycles, and prints the resulting task statuses.

mod demo;
mod output;

use clap::{Parser, Subcommand};
use output::OutputFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pek", version, about = "Plan execution kernel demo runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the demo plan and run it for a fixed number of cycles.
    Run {
        /// Number of engine cycles to drive.
        #[arg(long, default_value_t = 5)]
        cycles: u64,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { cycles, format } => demo::run(cycles, format),
    }
}
