//! Lithos CLI: run scenarios, benchmark, inspect checkpoints.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "lithos")]
#[command(version, about = "Lithos: particle-in-cell geodynamics stepping engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario, writing checkpoints to a directory.
    Run {
        /// Run file (TOML) with optional `scenario`, `[model]` and `[run]` tables.
        #[arg(short, long)]
        config: Option<String>,

        /// Scenario to run when the run file names none.
        #[arg(short, long, default_value = "shear_box")]
        scenario: String,

        /// Override the number of steps.
        #[arg(short = 'n', long)]
        steps: Option<u64>,

        /// Checkpoint directory.
        #[arg(short, long, default_value = "lithos-output")]
        output: String,

        /// Resume from this checkpoint (-1 for the last one).
        #[arg(long, allow_hyphen_values = true)]
        restart: Option<i64>,

        /// Write run events as JSON lines to this file.
        #[arg(long)]
        events: Option<String>,
    },

    /// Run benchmark suite.
    Benchmark {
        /// Which scenario to run (shear_box, rift, elastic_relaxation, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Override the number of steps.
        #[arg(short = 'n', long)]
        steps: Option<u64>,

        /// Output CSV file path.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect a checkpoint payload.
    Inspect {
        /// Path to a swarm, mesh or field file.
        path: String,
    },

    /// Validate a run file (.toml) or run parameters (.json).
    Validate {
        path: String,
    },

    /// List the built-in material presets.
    Materials,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, scenario, steps, output, restart, events } => commands::run(commands::RunArgs {
            config: config.as_deref(),
            scenario: &scenario,
            steps,
            output: &output,
            restart,
            events: events.as_deref(),
        }),
        Commands::Benchmark { scenario, steps, output } => commands::benchmark(&scenario, steps, output.as_deref()),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Materials => commands::materials(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
