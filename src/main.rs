//! Main entry point for the `swarmflow` binary.
//!
//! Loads a swarm definition, builds an LLM-backed swarm from it and runs it
//! once, or once per input map with `--for-each`.

mod cli;

use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use swarmflow::config::{load_swarm_definition, SwarmDefinition};
use swarmflow::core::{Swarm, SwarmOutput};
use swarmflow::event::{EventKind, EventSink, FnSink, SwarmEvent, TracingSink};
use swarmflow::utils::{init_logging, Inputs};
use swarmflow::Result;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(&cli.logging_level, cli.log_to_file);

    if let Err(e) = dotenvy::dotenv() {
        warn!("Failed to load .env file: {}", e);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            warn!("Some task outputs did not match their declared format");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", "✗".red().bold(), e.root_cause());
            ExitCode::FAILURE
        }
    }
}

/// Runs the swarm and reports whether every output succeeded.
async fn run(cli: cli::Cli) -> Result<bool> {
    let definition = load_swarm_definition(&cli.swarm_config)?;
    let inputs = merge_inputs(&definition, &cli.inputs);
    let batch = match &cli.for_each {
        Some(path) => Some(load_batch(path)?),
        None => None,
    };

    let spinner = init_spinner();
    let stores = definition.stores();
    let executor = definition.llm_executor(&stores)?;
    let mut config = definition.into_config(Arc::new(executor), stores)?;
    config.events = Some(Arc::new(progress_sink(spinner.clone())));
    let swarm = Swarm::new(config)?;

    let results = match batch {
        Some(batch) => {
            spinner.set_message(format!("Running {} input sets...", batch.len()));
            swarm.run_for_each_async(batch).await
        }
        None => swarm.run(inputs).await.map(|output| vec![output]),
    };
    spinner.finish_and_clear();
    let results = results?;

    if cli.json {
        let json = serde_json::to_string_pretty(&results)?;
        println!("{}", json);
    } else {
        for output in &results {
            print_summary(&swarm, output);
        }
    }

    Ok(results.iter().all(SwarmOutput::success))
}

/// Definition inputs overridden by command line values.
fn merge_inputs(definition: &SwarmDefinition, overrides: &[(String, String)]) -> Inputs {
    let mut inputs = definition.inputs.clone();
    for (key, value) in overrides {
        inputs.insert(key.clone(), serde_json::Value::String(value.clone()));
    }
    inputs
}

fn load_batch(path: &std::path::Path) -> Result<Vec<Inputs>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn init_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Starting swarm...");
    spinner
}

/// Mirrors task progress on the spinner and forwards events to tracing.
fn progress_sink(spinner: ProgressBar) -> FnSink<impl Fn(SwarmEvent) + Send + Sync> {
    FnSink(move |event: SwarmEvent| {
        if let Some(task) = &event.task_id {
            let message = match event.kind {
                EventKind::TaskStarted => Some(format!("Working on '{}'...", task)),
                EventKind::TaskCompleted => Some(format!("Finished '{}'", task)),
                EventKind::TaskSkipped => Some(format!("Skipped '{}'", task)),
                _ => None,
            };
            if let Some(message) = message {
                spinner.set_message(message);
            }
        }
        TracingSink.emit(event);
    })
}

fn print_summary(swarm: &Swarm, output: &SwarmOutput) {
    println!(
        "\n{} {} {}",
        "✅".green(),
        swarm.name().bold().cyan(),
        format!("run {}", output.run_id()).dimmed()
    );
    for task in output.tasks_output() {
        let marker = if task.skipped {
            "skipped".yellow()
        } else if task.success {
            "done".green()
        } else {
            "invalid".red()
        };
        let agent = task
            .agent_id
            .as_ref()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {} ({}, {:.1?})",
            marker,
            task.task_id.to_string().bold(),
            agent,
            task.duration
        );
    }
    println!("\n{}\n{}", "Final output:".bold(), output.raw());
}
