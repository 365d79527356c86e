use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qcar::agent::{index_to_angle, QRow, QTable, N_ACTIONS};
use qcar::controller::Transition;
use qcar::prelude::*;
use serde::Serialize;
use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

#[derive(Parser)]
#[command(name = "qcar-cli")]
#[command(about = "Train and drive the corridor Q-learning car", version)]
struct Cmd {
    /// Log every episode (DEBUG level)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// JSON config; omitted fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Train the Q-table and save it with a provenance sidecar
    Train(TrainArgs),
    /// Run one episode from a stored table, one JSON line per tick on stdout
    Drive(DriveArgs),
    /// Print a stored Q-table with the greedy steering per state
    Report {
        #[arg(long, default_value = "data/q_table.json")]
        q_table: PathBuf,
    },
    /// Print the effective configuration as JSON
    DefaultConfig,
}

#[derive(Args)]
struct TrainArgs {
    #[arg(long)]
    episodes: Option<usize>,
    /// Initial exploration rate
    #[arg(long)]
    epsilon: Option<f64>,
    /// Track file; falls back to the built-in corridor when unreadable
    #[arg(long)]
    track: Option<PathBuf>,
    #[arg(long, default_value = "data/q_table.json")]
    q_table: PathBuf,
    #[arg(long)]
    checkpoint_every: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Stop once this many consecutive episodes reach the destination
    #[arg(long)]
    stop_after: Option<usize>,
}

#[derive(Args)]
struct DriveArgs {
    #[arg(long)]
    track: Option<PathBuf>,
    #[arg(long, default_value = "data/q_table.json")]
    q_table: PathBuf,
    /// Exploration rate while driving (0 = greedy)
    #[arg(long, default_value_t = 0.0)]
    epsilon: f64,
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
    let cfg = load_cfg(cmd.config.as_deref())?;
    match cmd.action {
        Action::Train(args) => train(cfg, args),
        Action::Drive(args) => drive(cfg, args),
        Action::Report { q_table } => report(&q_table),
        Action::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

fn load_cfg(path: Option<&Path>) -> Result<SimCfg> {
    let Some(path) = path else {
        return Ok(SimCfg::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SimCfg::from_json(&text).with_context(|| format!("loading config {}", path.display()))
}

fn load_track(path: Option<&Path>) -> Track {
    path.map_or_else(Track::default_track, Track::load_or_default)
}

/// Command-line flags win over the config file.
fn apply_overrides(cfg: &mut SimCfg, args: &TrainArgs) {
    let train = &mut cfg.train;
    if let Some(episodes) = args.episodes {
        train.episodes = episodes;
    }
    if let Some(epsilon) = args.epsilon {
        train.epsilon = epsilon;
    }
    if args.checkpoint_every.is_some() {
        train.checkpoint_every = args.checkpoint_every;
    }
    if args.seed.is_some() {
        train.seed = args.seed;
    }
}

fn train(mut cfg: SimCfg, args: TrainArgs) -> Result<()> {
    apply_overrides(&mut cfg, &args);
    tracing::info!(
        episodes = cfg.train.episodes,
        epsilon = cfg.train.epsilon,
        q_table = %args.q_table.display(),
        "train"
    );
    let track = load_track(args.track.as_deref());
    let mut pg = Playground::open(cfg.clone(), track, &args.q_table)
        .with_context(|| format!("preparing training with {}", args.q_table.display()))?;

    let mut streak = 0usize;
    let report = pg.train_with(cfg.train.episodes, cfg.train.epsilon, |i, ep| {
        streak = if ep.complete { streak + 1 } else { 0 };
        if (i + 1) % 100 == 0 {
            tracing::info!(episode = i + 1, epsilon = ep.epsilon, streak, "progress");
        }
        match args.stop_after {
            Some(n) if streak >= n => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;

    pg.table()
        .save(&args.q_table)
        .context("saving trained q-table")?;
    let sidecar = provenance::write_sidecar(
        &args.q_table,
        provenance::Payload {
            cfg: &cfg,
            track: args.track.as_deref(),
            report: &report,
        },
    )?;
    tracing::info!(sidecar = %sidecar.display(), "provenance written");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct Tick {
    tick: usize,
    x: f64,
    y: f64,
    angle: f64,
    #[serde(flatten)]
    transition: Transition,
}

fn drive(mut cfg: SimCfg, args: DriveArgs) -> Result<()> {
    if args.seed.is_some() {
        cfg.train.seed = args.seed;
    }
    let max_steps = cfg.train.max_steps;
    let table = QTable::load_or_zeros(&args.q_table)
        .with_context(|| format!("loading {}", args.q_table.display()))?;
    let mut pg = Playground::new(cfg, load_track(args.track.as_deref()), table)?;

    let mut out = io::stdout().lock();
    let mut reading = pg.state();
    let mut ticks = 0;
    while ticks < max_steps {
        let Some(transition) = pg.run_simulation(args.epsilon, reading)? else {
            break;
        };
        ticks += 1;
        reading = transition.reading;
        let v = pg.vehicle();
        let line = Tick {
            tick: ticks,
            x: v.x,
            y: v.y,
            angle: v.angle,
            transition,
        };
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
    }
    tracing::info!(
        ticks,
        complete = pg.complete(),
        reward = pg.cumulative_reward(),
        "drive finished"
    );
    Ok(())
}

#[derive(Serialize)]
struct ReportRow {
    state: String,
    values: QRow,
    /// Steering angles sharing the row maximum.
    greedy: Vec<f64>,
}

fn report_rows(table: &QTable) -> Vec<ReportRow> {
    table
        .iter()
        .map(|(label, row)| {
            let best = table.max_value(label);
            ReportRow {
                state: label.to_string(),
                values: *row,
                greedy: (0..N_ACTIONS)
                    .filter(|&a| row[a] == best)
                    .map(index_to_angle)
                    .collect(),
            }
        })
        .collect()
}

fn report(q_table: &Path) -> Result<()> {
    let table = QTable::load(q_table)?
        .with_context(|| format!("no q-table at {}", q_table.display()))?;
    println!("{}", serde_json::to_string_pretty(&report_rows(&table))?);
    Ok(())
}
