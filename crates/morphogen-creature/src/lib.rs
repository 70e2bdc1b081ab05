//! Evolving articulated creatures for a top-down 2D world
//!
//! This crate implements:
//! - Body-plan genomes (a tree of box segments) with structural mutation
//! - Phenotype expression into motorized revolute joints
//! - A recurrent (GRU-style) controller reading a flat parameter buffer
//! - The per-tick sense / actuate / friction loop and a creature manager

pub mod creature;
pub mod genome;
pub mod linalg;
pub mod morphology;
pub mod neural;
pub mod physics;
pub mod spawning;
pub mod traits;
pub mod types;

#[cfg(test)]
mod mock;

// Re-export main types for convenience
pub use creature::{
    ControlConfig, ControlMode, Creature, CreatureConfig, CreatureError, CreatureStats,
};
pub use genome::{
    AttachSide, BodyPartGene, BrainRebuild, ConfigError, Genome, GenomeConfig, GenomeError,
    MutationConfig, MutationReport,
};
pub use morphology::{BodyPart, BuildConfig, Phenotype};
pub use neural::{BrainConfig, BrainError, GruController};
pub use physics::RapierPhysics;
pub use spawning::CreatureManager;
pub use traits::{PhysicsBackend, PhysicsError, RevoluteJointDef};
pub use types::{BodyId, CollisionGroup, CreatureId, JointId};
