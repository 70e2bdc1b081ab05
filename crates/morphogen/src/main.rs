use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use morphogen::{DisplacementFitness, Evolution, FitnessFunction, SimConfig, SpeedFitness};
use morphogen_creature::ControlMode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (RON); defaults to ./morphogen.ron when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations to run
    #[arg(long)]
    generations: Option<usize>,

    /// Population size per generation
    #[arg(long)]
    population: Option<usize>,

    /// Simulation ticks per evaluation
    #[arg(long)]
    ticks: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Drive joints with open-loop oscillation instead of the controller
    #[arg(long)]
    oscillate: bool,

    /// Fitness function: displacement or speed
    #[arg(long, default_value = "displacement")]
    fitness: String,

    /// Print the effective configuration as RON and exit
    #[arg(long)]
    dump_config: bool,
}

fn fitness_from_name(name: &str) -> Result<Box<dyn FitnessFunction>> {
    match name.to_lowercase().as_str() {
        "displacement" => Ok(Box::new(DisplacementFitness)),
        "speed" => Ok(Box::new(SpeedFitness)),
        other => anyhow::bail!("Unknown fitness: {}. Valid: displacement, speed", other),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = SimConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // CLI flags take precedence over every config layer
    if let Some(generations) = args.generations {
        config.evolution.generations = generations;
    }
    if let Some(population) = args.population {
        config.evolution.population = population;
    }
    if let Some(ticks) = args.ticks {
        config.evolution.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.evolution.seed = seed;
    }
    if args.oscillate {
        config.control.mode = ControlMode::Oscillate;
    }
    config.validate().context("Invalid command-line overrides")?;

    if args.dump_config {
        println!("{}", config.to_ron()?);
        return Ok(());
    }

    let fitness = fitness_from_name(&args.fitness)?;
    let mut evolution = Evolution::new(config, fitness);

    let pb = ProgressBar::new(evolution.total_evaluations());
    pb.set_style(Evolution::progress_style());
    evolution.run(&pb);
    pb.finish_and_clear();

    match evolution.best() {
        Some(best) => log::info!(
            "Best genome: fitness {:.3}, {} segments, depth {}",
            best.fitness,
            best.segments,
            best.genome.max_depth()
        ),
        None => log::warn!("No generations were run"),
    }

    Ok(())
}
