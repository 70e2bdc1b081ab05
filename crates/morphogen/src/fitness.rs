//! Fitness functions for evaluating creature performance

use morphogen_creature::{Creature, PhysicsBackend};

/// Trait for fitness evaluation functions
pub trait FitnessFunction: Send + Sync {
    /// Score a creature after an evaluation of `duration` seconds
    fn evaluate(&self, creature: &Creature, physics: &dyn PhysicsBackend, duration: f32) -> f32;

    fn name(&self) -> &str;
}

/// Straight-line distance of the root segment from its spawn point
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplacementFitness;

impl FitnessFunction for DisplacementFitness {
    fn evaluate(&self, creature: &Creature, physics: &dyn PhysicsBackend, _duration: f32) -> f32 {
        match creature.displacement(physics) {
            Ok(d) if d.is_finite() => d,
            Ok(_) => 0.0,
            Err(err) => {
                log::warn!("Could not measure {}: {}", creature.id(), err);
                0.0
            }
        }
    }

    fn name(&self) -> &str {
        "Displacement"
    }
}

/// Displacement per second, for comparing runs of different lengths
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedFitness;

impl FitnessFunction for SpeedFitness {
    fn evaluate(&self, creature: &Creature, physics: &dyn PhysicsBackend, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        DisplacementFitness.evaluate(creature, physics, duration) / duration
    }

    fn name(&self) -> &str {
        "Speed"
    }
}
