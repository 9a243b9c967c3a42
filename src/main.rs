//! Headless front end: runs a schedule in batches of `coarse` steps (or
//! sweeps with `--unit sweeps`) and emits one frame per batch, the way the
//! interactive display redraws.
//
//  Run:  `cargo run --release -- 100 -1 100 10 --schedule 3:100,2:50,1:50,0.5:10`

use clap::Parser;
use csv::WriterBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use ising_chain::{Boundary, Frame, InitialState, Schedule, SimConfig, TimeUnit};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "ising_chain", about = "Simulate a 1D Ising chain", allow_negative_numbers = true)]
struct Cli {
    /// Number of spins in the chain
    length: usize,

    /// Coupling constant (J < 0 ferromagnetic, J > 0 antiferromagnetic)
    #[arg(default_value_t = -1.0)]
    coupling: f64,

    /// Number of past states averaged into the correlation function
    #[arg(default_value_t = 100)]
    num_past_states: usize,

    /// Simulation steps (or sweeps, see --unit) per frame
    #[arg(default_value_t = 10)]
    coarse: usize,

    /// What coarse and schedule durations count: steps | sweeps
    #[arg(long, default_value_t = TimeUnit::Steps)]
    unit: TimeUnit,

    /// Initial configuration: uniform | random
    #[arg(long, default_value_t = InitialState::Uniform)]
    initial: InitialState,

    /// Chain ends: periodic | open
    #[arg(long, default_value_t = Boundary::Periodic)]
    boundary: Boundary,

    /// Annealing schedule, e.g. "3:100,2:50,1:50,0.5:10"
    #[arg(long)]
    schedule: Option<Schedule>,

    /// Constant temperature used when no schedule is given
    #[arg(long, default_value_t = 2.0)]
    temperature: f64,

    /// Number of frames at --temperature when no schedule is given
    #[arg(long, default_value_t = 100)]
    frames: usize,

    /// RNG seed; OS entropy when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Largest correlation distance reported (default: length - 1)
    #[arg(long)]
    max_distance: Option<usize>,

    /// Print the spin row of every frame
    #[arg(long)]
    show: bool,

    /// Frame log (CSV)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the resolved configuration as JSON
    #[arg(long)]
    config_out: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only, no progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            length:          self.length,
            coupling:        self.coupling,
            num_past_states: self.num_past_states,
            coarse:          self.coarse,
            initial:         self.initial,
            boundary:        self.boundary,
            seed:            self.seed,
        }
    }

    fn level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = cli.config();
    info!("Configuration:\n{cfg:#?}");
    if let Some(path) = &cli.config_out {
        cfg.write_json(path)?;
        info!("Configuration written to {}", path.display());
    }

    let schedule = match &cli.schedule {
        Some(s) => s.clone(),
        None => Schedule::frames(cli.temperature, cli.frames, cli.coarse)?,
    };
    if schedule.is_empty() {
        warn!("schedule has no stages, only the initial frame is produced");
    }
    let max_distance = cli
        .max_distance
        .unwrap_or(cli.length.saturating_sub(1))
        .min(cli.length.saturating_sub(1));

    let mut sim = cfg.build()?;
    info!(
        coupling = sim.system().coupling(),
        coarse = sim.coarse(),
        num_past_states = sim.num_past_states(),
        unit = %cli.unit,
        "controller ready"
    );
    // The first frame shows the initial state and its correlation.
    sim.record_snapshot();

    let mut wtr = match &cli.output {
        Some(path) => {
            let mut w = WriterBuilder::new().from_path(path)?;
            w.write_record(Frame::csv_header(max_distance))?;
            Some(w)
        }
        None => None,
    };

    let bar = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(schedule.total_steps() as u64)
    };
    bar.set_style(ProgressStyle::with_template(
        &format!(" {{bar:40.cyan/blue}} {{pos}}/{{len}} {} [{{elapsed_precise}}] {{msg}}", cli.unit),
    )?);

    let mut frame = Frame::capture(&sim, max_distance);
    let mut accepted = 0usize;
    for batch in schedule.batches(cli.coarse) {
        accepted += sim.run(cli.unit, batch.temperature, batch.duration)?;
        frame = Frame::capture(&sim, max_distance);

        if cli.show {
            bar.println(frame.spin_row());
        }
        if let Some(w) = wtr.as_mut() {
            w.write_record(frame.to_record(max_distance))?;
        }
        bar.set_message(format!("T={:.2} m={:+.3}", batch.temperature, frame.magnetization));
        bar.inc(batch.duration as u64);
    }
    bar.finish_and_clear();

    if let Some(mut w) = wtr {
        w.flush()?;
    }

    let rate = if frame.step > 0 { accepted as f64 / frame.step as f64 } else { 0.0 };
    info!(
        steps = frame.step,
        acceptance = rate,
        magnetization = frame.magnetization,
        energy_per_spin = frame.energy_density(),
        "run complete"
    );
    if let Some(c) = &frame.correlation {
        info!("correlation (d = 0..={max_distance}): {c:.3?}");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.level()).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
