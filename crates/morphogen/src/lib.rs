//! Headless evolution runner for morphogen creatures
//!
//! Layered configuration, fitness functions and the generational loop. The
//! `morphogen` binary wires these to a CLI.

pub mod config;
pub mod evolution;
pub mod fitness;

pub use config::{EvolutionConfig, SimConfig, WorldConfig};
pub use evolution::{EvalResult, Evolution, GenerationStats, evaluate_genome, evaluate_in};
pub use fitness::{DisplacementFitness, FitnessFunction, SpeedFitness};
