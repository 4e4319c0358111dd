// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct TaskReport {
    pub id: String,
    pub model: String,
    pub status: String,
    pub outcome: Option<String>,
    pub mission: bool,
}

/// Prints a cycle's resulting task reports and any localized errors raised
/// along the way, in text or JSON.
pub fn print_cycle(cycle: u64, tasks: &[TaskReport], errors: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "cycle": cycle,
                "tasks": tasks,
                "errors": errors,
            });
            match serde_json::to_string_pretty(&obj) {
                Ok(text) => println!("{text}"),
                Err(err) => eprintln!("error: failed to render cycle report as JSON: {err}"),
            }
        }
        OutputFormat::Text => {
            println!("-- cycle {cycle} --");
            for task in tasks {
                let outcome = task.outcome.as_deref().unwrap_or("-");
                let mission = if task.mission { " [mission]" } else { "" };
                println!("  {} ({}) status={} outcome={}{}", task.id, task.model, task.status, outcome, mission);
            }
            for error in errors {
                println!("  error: {error}");
            }
        }
    }
}
