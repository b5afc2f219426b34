// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bstar_floorplan::{AnnealOptions, Design, Report, floorplan};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Fixed-outline floorplanner using B*-trees and simulated annealing
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Weight of area against wirelength, in [0, 1]
    alpha: f64,

    /// Block description file
    block_file: PathBuf,

    /// Net description file
    net_file: PathBuf,

    /// Output report path
    output: PathBuf,

    /// Seed for the random number generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of annealing iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Initial annealing temperature
    #[arg(long)]
    initial_temperature: Option<f64>,

    /// Multiplicative cooling factor per iteration, in (0, 1)
    #[arg(long)]
    cooling_rate: Option<f64>,

    /// Stop after this many seconds even if iterations remain
    #[arg(long)]
    time_limit: Option<f64>,

    /// Log progress every N iterations (0 disables)
    #[arg(long)]
    report_interval: Option<usize>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn anneal_options(&self) -> Result<AnnealOptions> {
        let mut options = AnnealOptions::default();
        if let Some(iterations) = self.iterations {
            options.iterations = iterations;
        }
        if let Some(t0) = self.initial_temperature {
            if t0.is_nan() || t0 <= 0.0 {
                bail!("initial temperature must be positive, got {t0}");
            }
            options.initial_temperature = t0;
        }
        if let Some(rate) = self.cooling_rate {
            if rate.is_nan() || rate <= 0.0 || rate >= 1.0 {
                bail!("cooling rate must lie in (0, 1), got {rate}");
            }
            options.cooling_rate = rate;
        }
        if let Some(secs) = self.time_limit {
            options.time_limit = Some(
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("invalid time limit {secs}"))?,
            );
        }
        if let Some(interval) = self.report_interval {
            options.report_interval = interval;
        }
        Ok(options)
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if !(0.0..=1.0).contains(&cli.alpha) {
        bail!("alpha must lie in [0, 1], got {}", cli.alpha);
    }
    let options = cli.anneal_options()?;

    // open everything up front so a bad path fails before any computation
    let output = File::create(&cli.output)
        .with_context(|| format!("cannot open output file '{}'", cli.output.display()))?;
    let design = Design::from_files(&cli.block_file, &cli.net_file)?;

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let result = floorplan(&design, cli.alpha, options, rng)?;
    if !result.feasible {
        eprintln!("warning: no feasible floorplan found; the report holds an infeasible placement");
    }

    Report::from_result(&result)
        .write_to(BufWriter::new(output))
        .with_context(|| format!("cannot write report '{}'", cli.output.display()))?;
    log::info!(
        "Cost {:.4}, wirelength {}, area {} ({}x{}), written to {}",
        result.cost,
        result.wirelength,
        result.area,
        result.width,
        result.height,
        cli.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
