//! Dice Drop CLI
//!
//! Runs the die simulation headless: drop it from the start pose, toss it
//! with a seeded throw, or script a pick-drag-release, then print the face it
//! settles on.

use bevy::log::{Level, LogPlugin};
use bevy::prelude::{Vec2, Vec3};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use dicedrop::dice3d::{
    DieSimulation, PickState, PipLabel, SettingsArgs, SimulationSettings, ThrowParams,
};

/// Dice Drop - headless die simulation
#[derive(Parser)]
#[command(name = "dicedrop-cli")]
#[command(author, version, about = "Dice Drop - drop, roll or drag a simulated die")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: SettingsArgs,

    /// Give up after this many physics steps per phase
    #[arg(long, default_value = "1200")]
    max_ticks: u32,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity of the simulation
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Let the die fall from its start pose and settle
    Drop,

    /// Throw the die with a random toss
    Roll {
        /// Seed for the toss; a random seed is used when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Linear throw speed in m/s
        #[arg(long, default_value = "3.0")]
        strength: f32,
    },

    /// Let the die settle, pick it up by its top, drag it and let go
    Drag {
        /// Pointer travel in normalized screen units, x then y
        #[arg(long, num_args = 2, default_values_t = [0.3, 0.4], allow_negative_numbers = true)]
        offset: Vec<f32>,

        /// Ticks spent moving the pointer
        #[arg(long, default_value = "30")]
        steps: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Outcome of one run
#[derive(Debug, Serialize)]
struct Report {
    command: &'static str,
    face: Option<u8>,
    settled: bool,
    ticks: u32,
    position: [f32; 3],
    /// Body-frame grab point of a drag, if the pick hit
    pivot: Option<[f32; 3]>,
}

fn main() {
    let cli = Cli::parse();

    let settings = match cli.settings.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let report = match run(&cli, settings) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{} {}", "Error:".red().bold(), e);
                std::process::exit(1);
            }
        }
    } else {
        print_report(&report);
    }

    if !report.settled {
        std::process::exit(2);
    }
}

fn run(cli: &Cli, settings: SimulationSettings) -> Result<Report, String> {
    let log = LogPlugin {
        level: cli.log_level.into(),
        ..Default::default()
    };
    let mut sim =
        DieSimulation::init_physics_with_logging(settings, log).map_err(|e| e.to_string())?;

    let mut ticks = 0;
    let mut pivot = None;
    let settled = match &cli.command {
        Commands::Drop => settle(&mut sim, cli.max_ticks, &mut ticks),
        Commands::Roll { seed, strength } => {
            let seed = seed.unwrap_or_else(rand::random);
            let throw = ThrowParams::random(&mut StdRng::seed_from_u64(seed), *strength);
            sim.throw_die(throw.linvel, throw.angvel);
            settle(&mut sim, cli.max_ticks, &mut ticks)
        }
        Commands::Drag { offset, steps } => {
            if !settle(&mut sim, cli.max_ticks, &mut ticks) {
                return Err(format!(
                    "die did not settle within {} ticks, cannot pick it up",
                    cli.max_ticks
                ));
            }
            let offset = Vec2::new(
                offset.first().copied().unwrap_or(0.0),
                offset.get(1).copied().unwrap_or(0.0),
            );
            pivot = drag(&mut sim, offset, *steps, &mut ticks)?;
            settle(&mut sim, cli.max_ticks, &mut ticks)
        }
    };

    let position = sim.die_pose().position;
    Ok(Report {
        command: match cli.command {
            Commands::Drop => "drop",
            Commands::Roll { .. } => "roll",
            Commands::Drag { .. } => "drag",
        },
        face: sim.face().map(PipLabel::value),
        settled,
        ticks,
        position: position.to_array(),
        pivot: pivot.map(|p| p.to_array()),
    })
}

fn settle(sim: &mut DieSimulation, max_ticks: u32, ticks: &mut u32) -> bool {
    match sim.run_until_settled(max_ticks) {
        Some(taken) => {
            *ticks += taken;
            true
        }
        None => {
            *ticks += max_ticks;
            false
        }
    }
}

/// Grab the die by its top, sweep the pointer by `offset`, and let go.
fn drag(
    sim: &mut DieSimulation,
    offset: Vec2,
    steps: u32,
    ticks: &mut u32,
) -> Result<Option<Vec3>, String> {
    let start = sim
        .die_top_ndc()
        .ok_or_else(|| "die is behind the camera".to_string())?;

    sim.on_pointer_down(start);
    sim.tick();
    *ticks += 1;
    if sim.pick_state() != PickState::Dragging {
        return Err(format!("pointer at {start:?} missed the die"));
    }
    let pivot = sim.pick_pivot();

    let steps = steps.max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sim.on_pointer_move(start + offset * t);
        sim.tick();
        *ticks += 1;
    }

    sim.on_pointer_up(start + offset);
    sim.tick();
    *ticks += 1;
    Ok(pivot)
}

fn print_report(report: &Report) {
    println!("\n{}", "═══════════════════════════════════════".cyan());
    println!(
        "{} {}",
        "Command:".bold().white(),
        report.command.yellow().bold()
    );
    if let Some(pivot) = report.pivot {
        println!(
            "{} [{:.3}, {:.3}, {:.3}]",
            "Grabbed at:".bold().white(),
            pivot[0],
            pivot[1],
            pivot[2]
        );
    }
    println!(
        "{} [{:.3}, {:.3}, {:.3}] after {} steps",
        "Resting at:".bold().white(),
        report.position[0],
        report.position[1],
        report.position[2],
        report.ticks
    );

    match (report.settled, report.face) {
        (true, Some(face)) => println!(
            "{} {}",
            "Face:".bold().white(),
            format!("[{face}]").bright_green().bold()
        ),
        (true, None) => println!(
            "{} {}",
            "Face:".bold().white(),
            "none (balanced on an edge)".yellow()
        ),
        (false, _) => println!("{}", "Die did not settle".bright_red().bold()),
    }
    println!("{}", "═══════════════════════════════════════".cyan());
}
