//! Generational evolution loop
//!
//! Every genome is evaluated in its own physics world (in parallel with
//! rayon), the best survive unchanged and the rest of the next generation is
//! bred by tournament selection, cloning and mutation.

use glam::Vec2;
use indicatif::{ProgressBar, ProgressStyle};
use morphogen_creature::{CreatureError, CreatureManager, Genome, PhysicsBackend, RapierPhysics};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::fitness::FitnessFunction;

/// Statistics for one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f32,
    pub avg_fitness: f32,
    pub worst_fitness: f32,
    pub avg_segments: f32,
    pub max_segments: usize,
    /// Genomes that could not be spawned or crashed mid-run
    pub failed: usize,
    /// Offspring whose body topology changed during mutation
    pub structural_changes: usize,
}

/// Single genome evaluation result
#[derive(Debug, Clone)]
pub struct EvalResult {
    pub genome: Genome,
    pub fitness: f32,
    pub segments: usize,
    pub failed: bool,
}

/// Spawn a genome alone in a fresh world, run it and score it
pub fn evaluate_genome(
    genome: &Genome,
    config: &SimConfig,
    fitness: &dyn FitnessFunction,
) -> Result<f32, CreatureError> {
    let mut physics = RapierPhysics::new().with_motor_factor(config.world.motor_factor);
    evaluate_in(genome, config, fitness, &mut physics)
}

/// Run a genome in `physics` for the configured ticks and score it
///
/// A creature that fails to update mid-run is an evaluation failure, not a
/// zero score.
pub fn evaluate_in<P: PhysicsBackend>(
    genome: &Genome,
    config: &SimConfig,
    fitness: &dyn FitnessFunction,
    physics: &mut P,
) -> Result<f32, CreatureError> {
    let mut manager = CreatureManager::new(1, config.creature_config());
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.evolution.seed);

    let id = manager.spawn(genome.clone(), Vec2::ZERO, physics, &mut rng)?;

    let dt = config.world.dt;
    for _ in 0..config.evolution.ticks {
        if let Some((_, err)) = manager.update(physics, dt).into_iter().next() {
            return Err(err);
        }
    }

    let duration = dt * config.evolution.ticks as f32;
    let score = manager
        .get(id)
        .map_or(0.0, |creature| fitness.evaluate(creature, &*physics, duration));
    manager.clear(physics);
    Ok(score)
}

/// Main evolution driver
pub struct Evolution {
    config: SimConfig,
    fitness: Box<dyn FitnessFunction>,
    rng: Xoshiro256PlusPlus,
    population: Vec<Genome>,
    generation: usize,
    best: Option<EvalResult>,
    history: Vec<GenerationStats>,
    /// Structural changes made while breeding the current population
    pending_structural: usize,
}

impl Evolution {
    pub fn new(config: SimConfig, fitness: Box<dyn FitnessFunction>) -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.evolution.seed);
        let size = config.evolution.population.max(1);
        let population = (0..size)
            .map(|_| {
                if config.evolution.start_from_default {
                    Genome::create_default(&config.genome, &mut rng)
                } else {
                    Genome::create_random(&config.genome, &mut rng)
                }
            })
            .collect();

        log::info!(
            "Evolution: {} genomes, {} generations, fitness {}",
            size,
            config.evolution.generations,
            fitness.name()
        );

        Self {
            config,
            fitness,
            rng,
            population,
            generation: 0,
            best: None,
            history: Vec::new(),
            pending_structural: 0,
        }
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn best(&self) -> Option<&EvalResult> {
        self.best.as_ref()
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Evaluate the current population in parallel
    fn evaluate_population(&self, pb: &ProgressBar) -> Vec<EvalResult> {
        self.population
            .par_iter()
            .map(|genome| {
                let (fitness, failed) =
                    match evaluate_genome(genome, &self.config, self.fitness.as_ref()) {
                        Ok(f) => (f, false),
                        Err(err) => {
                            log::warn!("Evaluation failed: {}", err);
                            (0.0, true)
                        }
                    };
                pb.inc(1);
                EvalResult {
                    genome: genome.clone(),
                    fitness,
                    segments: genome.count_segments(),
                    failed,
                }
            })
            .collect()
    }

    /// Index into `ranked` (best first) chosen by tournament
    fn tournament(&mut self, len: usize) -> usize {
        let rounds = self.config.evolution.tournament_size.max(1);
        (0..rounds)
            .map(|_| self.rng.random_range(0..len))
            .min()
            .unwrap_or(0)
    }

    fn breed(&mut self, ranked: &[EvalResult]) -> Vec<Genome> {
        let size = self.population.len();
        let elites = self.config.evolution.elites.min(size).min(ranked.len());
        let mut next: Vec<Genome> = ranked[..elites].iter().map(|r| r.genome.clone()).collect();

        let mut structural = 0;
        while next.len() < size {
            let parent = self.tournament(ranked.len());
            let mut child = ranked[parent].genome.clone();
            let report = child.mutate(&self.config.mutation, &self.config.genome, &mut self.rng);
            if report.structural.is_some() {
                structural += 1;
            }
            next.push(child);
        }
        self.pending_structural = structural;
        next
    }

    /// Evaluate, record statistics and breed the next generation
    pub fn step(&mut self, pb: &ProgressBar) -> GenerationStats {
        let mut ranked = self.evaluate_population(pb);
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let count = ranked.len().max(1) as f32;
        let stats = GenerationStats {
            generation: self.generation,
            best_fitness: ranked.first().map_or(0.0, |r| r.fitness),
            avg_fitness: ranked.iter().map(|r| r.fitness).sum::<f32>() / count,
            worst_fitness: ranked.last().map_or(0.0, |r| r.fitness),
            avg_segments: ranked.iter().map(|r| r.segments as f32).sum::<f32>() / count,
            max_segments: ranked.iter().map(|r| r.segments).max().unwrap_or(0),
            failed: ranked.iter().filter(|r| r.failed).count(),
            structural_changes: self.pending_structural,
        };

        if let Some(top) = ranked.first()
            && self.best.as_ref().is_none_or(|b| top.fitness > b.fitness)
        {
            self.best = Some(top.clone());
        }

        log::info!(
            "Gen {}: best={:.3}, avg={:.3}, worst={:.3}, segments avg={:.1} max={}, failed={}",
            stats.generation,
            stats.best_fitness,
            stats.avg_fitness,
            stats.worst_fitness,
            stats.avg_segments,
            stats.max_segments,
            stats.failed
        );

        if !ranked.is_empty() {
            self.population = self.breed(&ranked);
        }
        self.generation += 1;
        self.history.push(stats.clone());
        stats
    }

    /// Run every configured generation
    pub fn run(&mut self, pb: &ProgressBar) -> &[GenerationStats] {
        for _ in 0..self.config.evolution.generations {
            let stats = self.step(pb);
            pb.set_message(format!("best {:.3}", stats.best_fitness));
        }
        if let Some(best) = &self.best {
            log::info!(
                "Champion: fitness {:.3}, {} segments, {} brain parameters",
                best.fitness,
                best.segments,
                best.genome.brain_params().len()
            );
        }
        &self.history
    }

    pub fn progress_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    /// Evaluations performed by [`Evolution::run`]
    pub fn total_evaluations(&self) -> u64 {
        self.config.evolution.generations as u64 * self.population.len() as u64
    }
}
