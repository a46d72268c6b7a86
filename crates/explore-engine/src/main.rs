use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use explore_engine::test_harness::{demo_config, run_certification, run_simulator, SimulatorConfig};
use explore_engine::ExplorationConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "explore-sim", version, about = "Guided exploration engine simulator")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one simulated session with fault injection
    Simulate {
        /// Dimension config (.toml / .yaml); built-in brand asset setup if omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Probability that any external call fails
        #[arg(long, default_value_t = 0.2)]
        failure_rate: f64,
        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the simulator across many seeds
    Certify {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        seeds: u64,
        #[arg(long, default_value_t = 0.3)]
        failure_rate: f64,
    },
    /// Load and validate a dimension config
    ValidateConfig {
        /// Path to a .toml / .yaml config
        path: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(config: Option<&PathBuf>) -> Result<ExplorationConfig> {
    match config {
        Some(path) => ExplorationConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(demo_config()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Simulate {
            config,
            seed,
            failure_rate,
            json,
        } => {
            let exploration = load(config.as_ref())?;
            let sim = SimulatorConfig {
                seed,
                failure_rate,
                ..SimulatorConfig::default()
            };
            let report = run_simulator(&exploration, sim).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Command::Certify {
            config,
            seeds,
            failure_rate,
        } => {
            let exploration = load(config.as_ref())?;
            let report = run_certification(&exploration, seeds, failure_rate).await;

            println!("Certification Report:");
            println!("  Seeds Tested: {}", report.seeds_tested);
            println!("  Total Violations: {}", report.total_violations);
            println!("  Status: {}", if report.passed { "PASSED" } else { "FAILED" });
            std::process::exit(if report.passed { 0 } else { 1 });
        }
        Command::ValidateConfig { path } => {
            let exploration = load(Some(&path))?;
            let registry = exploration
                .registry()
                .with_context(|| format!("validating {}", path.display()))?;

            println!("Item type: {}", exploration.item_type);
            for dim in registry.dimensions() {
                println!("  {:>2}. {} ({})", dim.order + 1, dim.label, dim.key);
            }
            println!("Seed questions: {}", registry.seed_questions().len());
        }
    }

    Ok(())
}
