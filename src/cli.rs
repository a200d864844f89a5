use clap::Parser;
use std::path::PathBuf;

/// Command line interface for running a swarm
#[derive(Parser, Debug)]
#[command(name = "swarmflow", version, about = "Run a swarm of cooperating agents")]
pub struct Cli {
    /// Path to the swarm definition (YAML, TOML or JSON)
    #[arg(short, long)]
    pub swarm_config: PathBuf,

    /// Run input as key=value; repeatable. Overrides inputs from the definition
    #[arg(short, long = "input", value_parser = parse_input)]
    pub inputs: Vec<(String, String)>,

    /// JSON file holding an array of input maps; runs the swarm once per map concurrently
    #[arg(long)]
    pub for_each: Option<PathBuf>,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    #[arg(long, default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Also write logs to daily files under logs/
    #[arg(long)]
    pub log_to_file: bool,

    /// Print results as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

fn parse_input(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
