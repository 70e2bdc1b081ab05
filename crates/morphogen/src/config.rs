//! Simulation configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `morphogen.ron` in the working directory, or an explicit `--config` file
//! 3. Environment variables prefixed with `MORPHOGEN_`
//!
//! Example environment variable: `MORPHOGEN_EVOLUTION__POPULATION=64`

use std::path::Path;

use anyhow::{Context, Result, ensure};
use config::{Config, Environment, File, FileFormat};
use morphogen_creature::{BuildConfig, ControlConfig, CreatureConfig, GenomeConfig, MutationConfig};
use serde::{Deserialize, Serialize};

/// Default config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "morphogen.ron";

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimConfig {
    #[serde(default)]
    pub genome: GenomeConfig,

    #[serde(default)]
    pub mutation: MutationConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub evolution: EvolutionConfig,
}

/// Physics world settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Fixed tick length in seconds
    pub dt: f32,
    /// Damping factor of the joint velocity motors
    pub motor_factor: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            motor_factor: 1.0,
        }
    }
}

/// Generational loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub generations: usize,
    pub population: usize,
    /// Simulation ticks per evaluation
    pub ticks: usize,
    /// Best genomes copied unchanged into the next generation
    pub elites: usize,
    /// Contestants per parent selection
    pub tournament_size: usize,
    /// Start from the two-limb body instead of random growth
    pub start_from_default: bool,
    pub seed: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: 50,
            population: 32,
            ticks: 600,
            elites: 4,
            tournament_size: 3,
            start_from_default: false,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Load with the default file lookup and `MORPHOGEN_` environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_layers(path, Environment::with_prefix("MORPHOGEN"))
    }

    /// Load with an explicit environment source
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load_layers(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let defaults = Config::try_from(&SimConfig::default())
            .context("Failed to serialize default configuration")?;

        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE)
                .format(FileFormat::Ron)
                .required(false),
        };

        let config = Config::builder()
            // Layer 1: Compiled defaults
            .add_source(defaults)
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (MORPHOGEN_EVOLUTION__SEED, etc.)
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: SimConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would panic or break invariants once the run starts
    pub fn validate(&self) -> Result<()> {
        self.creature_config()
            .validate()
            .context("Invalid creature configuration")?;
        self.mutation
            .validate()
            .context("Invalid mutation configuration")?;
        ensure!(
            self.world.dt.is_finite() && self.world.dt > 0.0,
            "world.dt must be positive, got {}",
            self.world.dt
        );
        ensure!(
            self.world.motor_factor.is_finite() && self.world.motor_factor >= 0.0,
            "world.motor_factor must be non-negative, got {}",
            self.world.motor_factor
        );
        ensure!(
            self.evolution.population > 0,
            "evolution.population must be at least 1"
        );
        Ok(())
    }

    /// Settings needed to spawn and drive one creature
    pub fn creature_config(&self) -> CreatureConfig {
        CreatureConfig {
            genome: self.genome.clone(),
            build: self.build.clone(),
            control: self.control.clone(),
        }
    }

    /// Pretty RON rendering of the effective configuration
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")
    }
}
