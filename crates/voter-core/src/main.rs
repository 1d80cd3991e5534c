//! q-voter Simulation CLI
//!
//! Runs the q-voter model headless, writing the mean-opinion time series and
//! a run summary to the output directory.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use voter_core::output::{self, StepLogger, STEPS_FILE};
use voter_core::{
    default_config_toml, FnObserver, NonconformityMode, SamplingPolicy, SimulationConfig,
    SimulationRunner,
};
use voter_events::StepRecord;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "qvoter")]
#[command(about = "q-voter model opinion dynamics on a square lattice")]
struct Args {
    /// TOML configuration file (default: qvoter.toml if present); command
    /// line values override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lattice side length N
    #[arg(long)]
    size: Option<usize>,

    /// Influence group size q
    #[arg(long)]
    q: Option<usize>,

    /// Probability of nonconformity p
    #[arg(long)]
    p: Option<f64>,

    /// Probability of flipping under independence f
    #[arg(long)]
    f: Option<f64>,

    /// Initial fraction of +1 opinions
    #[arg(long)]
    concentration: Option<f64>,

    /// Nonconformity mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// How neighbors are drawn into the influence group
    #[arg(long, value_enum)]
    sampling: Option<SamplingArg>,

    /// Number of Monte Carlo steps
    #[arg(long)]
    steps: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for steps.jsonl and summary.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the lattice every n steps (0 disables)
    #[arg(long, default_value_t = 0)]
    render_every: u64,

    /// Print a default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Independence,
    Anticonformity,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplingArg {
    WithReplacement,
    WithoutReplacement,
}

impl Args {
    /// Load the base configuration and apply command line overrides.
    fn resolve_config(&self) -> Result<SimulationConfig, voter_core::ConfigError> {
        let mut config = SimulationConfig::load_or_default(self.config.as_deref())?;

        let model = &mut config.model;
        if let Some(size) = self.size {
            model.lattice_size = size;
        }
        if let Some(q) = self.q {
            model.influence_size = q;
        }
        if let Some(p) = self.p {
            model.nonconformity_probability = p;
        }
        if let Some(f) = self.f {
            model.flip_probability = f;
        }
        if let Some(c) = self.concentration {
            model.initial_concentration = c;
        }
        if let Some(mode) = self.mode {
            model.mode = match mode {
                ModeArg::Independence => NonconformityMode::Independence,
                ModeArg::Anticonformity => NonconformityMode::Anticonformity,
            };
        }
        if let Some(sampling) = self.sampling {
            model.sampling = match sampling {
                SamplingArg::WithReplacement => SamplingPolicy::WithReplacement,
                SamplingArg::WithoutReplacement => SamplingPolicy::WithoutReplacement,
            };
        }

        let run = &mut config.run;
        if let Some(steps) = self.steps {
            run.steps = steps;
        }
        if let Some(seed) = self.seed {
            run.seed = seed;
        }
        if let Some(dir) = &self.output_dir {
            run.output_dir = dir.clone();
        }
        if self.render_every > 0 {
            run.snapshot_interval = self.render_every;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.resolve_config()?;

    info!("q-voter simulation");
    info!(
        "N = {}, q = {}, p = {}, f = {}, c = {}, {:?}, {:?}",
        config.model.lattice_size,
        config.model.influence_size,
        config.model.nonconformity_probability,
        config.model.flip_probability,
        config.model.initial_concentration,
        config.model.mode,
        config.model.sampling,
    );
    info!("Seed: {}, steps: {}", config.run.seed, config.run.steps);

    let output_dir = config.run.output_dir.clone();
    output::ensure_output_dir(&output_dir)?;

    let mut runner = SimulationRunner::new(&config)?;
    runner.add_observer(Box::new(StepLogger::new(output_dir.join(STEPS_FILE))?));
    if args.render_every > 0 {
        runner.add_observer(Box::new(FnObserver(render)));
    }

    let summary = runner.run(Duration::from_millis(50));
    output::write_summary(&output_dir, &summary)?;

    info!(
        "Simulation complete. Ran {} steps, mean opinion {:.3} -> {:.3}",
        summary.total_steps, summary.initial_mean_opinion, summary.final_mean_opinion
    );
    if let Some(step) = summary.consensus_step {
        info!("Consensus first reached at step {}", step);
    }
    info!("Wrote output to {}", output_dir.display());
    Ok(())
}

/// Print the lattice for records that carry a snapshot.
fn render(record: &StepRecord) {
    if let Some(snapshot) = &record.snapshot {
        println!(
            "Time: {} [MCS]   mean opinion {:.3}",
            record.step, record.mean_opinion
        );
        print!("{}", snapshot);
        println!();
    }
}
