use blackjack_sim::prelude::*;
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Estimate win, loss and draw rates of fixed blackjack policies against the house dealer.
#[derive(Parser, Debug)]
#[command(name = "blackjack_sim", version)]
struct Cli {
    /// Games played per policy and draw mode
    #[arg(short, long)]
    iterations: Option<u64>,

    /// Games played between two progress updates
    #[arg(long)]
    batch_size: Option<u64>,

    /// Seed for reproducible runs, random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Draw mode to simulate, `infinite` or `single-deck` (repeatable, default both)
    #[arg(short, long = "mode")]
    modes: Vec<DrawMode>,

    /// Policy to simulate, by name or number 1-6 (repeatable, default all)
    #[arg(short, long = "policy")]
    policies: Vec<PlayerPolicy>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with default values for any of the options above
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log progress after every batch
    #[arg(short, long)]
    verbose: bool,

    /// List the available policies and exit
    #[arg(long)]
    list_policies: bool,
}

/// Keys accepted in the `--config` file. Unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    iterations: Option<u64>,
    batch_size: Option<u64>,
    seed: Option<u64>,
    modes: Vec<DrawMode>,
    policies: Vec<PlayerPolicy>,
    format: Option<ReportFormat>,
    output: Option<PathBuf>,
}

impl FileConfig {
    fn request(&self) -> SimulationRequest {
        SimulationRequest {
            iterations: self.iterations,
            batch_size: self.batch_size,
            seed: self.seed,
            modes: self.modes.clone(),
            policies: self.policies.clone(),
        }
    }

    fn from_json_file(path: &Path) -> Result<FileConfig, SimulationError> {
        let file = File::open(path).map_err(|e| {
            SimulationError::ConfigError(format!("unable to open {}: {}", path.display(), e))
        })?;
        serde_json::from_reader(io::BufReader::new(file)).map_err(|e| {
            SimulationError::ConfigError(format!("unable to parse {}: {}", path.display(), e))
        })
    }
}

impl Cli {
    fn request(&self) -> SimulationRequest {
        SimulationRequest {
            iterations: self.iterations,
            batch_size: self.batch_size,
            seed: self.seed,
            modes: self.modes.clone(),
            policies: self.policies.clone(),
        }
    }

    /// Merges the config file, if any, under the command line flags.
    fn resolve(&self) -> Result<(SimulationRequest, ReportFormat, Option<PathBuf>), SimulationError> {
        let file = match &self.config {
            Some(path) => FileConfig::from_json_file(path)?,
            None => FileConfig::default(),
        };
        let request = file.request().overridden_by(self.request());
        let format = self.format.or(file.format).unwrap_or_default();
        let output = self.output.clone().or(file.output);
        Ok((request, format, output))
    }
}

fn list_policies() {
    for policy in PlayerPolicy::ALL {
        println!("{}  {:<20}{}", policy.number(), policy.name(), policy.description());
    }
}

fn run(cli: &Cli) -> Result<(), SimulationError> {
    let (request, format, output) = cli.resolve()?;
    let simulator = request.simulator(!cli.verbose);
    if simulator.config.iterations == 0 {
        return Err(SimulationError::ConfigError(String::from(
            "iterations must be greater than zero",
        )));
    }

    let file_out: Box<dyn Write + Send> = match &output {
        Some(path) => {
            info!("writing report to {}", path.display());
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(io::stdout()),
    };
    simulator.run(file_out, format)?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.list_policies {
        list_policies();
        return;
    }

    if let Err(e) = run(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}
