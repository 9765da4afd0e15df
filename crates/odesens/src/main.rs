use std::path::PathBuf;

use clap::{Parser, Subcommand};
use odesens::{Overrides, init_logging, report, run_file};

#[derive(Parser, Debug)]
#[command(name = "odesens", version)]
#[command(about = "Sobol' sensitivity analysis of ODE models")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the analysis described by a YAML file
    Run {
        /// Path to the analysis file
        config: PathBuf,

        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Evaluate trajectories in parallel with this many workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// RNG seed (overrides the file)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the built-in models
    Models,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    match args.command {
        Command::Run {
            config,
            output,
            workers,
            seed,
        } => {
            let result = run_file(&config, &Overrides { workers, seed })?;
            report::log_summary(&result);
            report::write_result(&result, output.as_deref())?;
        }
        Command::Models => print!("{}", report::models_listing()),
    }

    Ok(())
}
