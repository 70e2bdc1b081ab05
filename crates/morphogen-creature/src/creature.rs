//! Main creature entity
//!
//! Combines genome, phenotype and recurrent controller, and runs the per-tick
//! sense / think / actuate / friction loop.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genome::{ConfigError, Genome, GenomeConfig, ensure};
use crate::morphology::{BuildConfig, Phenotype, Placement};
use crate::neural::{BrainError, GruController};
use crate::traits::{PhysicsBackend, PhysicsError};
use crate::types::{CollisionGroup, CreatureId};

#[derive(Debug, Error)]
pub enum CreatureError {
    #[error("controller error: {0}")]
    Brain(#[from] BrainError),
    #[error("physics error: {0}")]
    Physics(#[from] PhysicsError),
    #[error("phenotype has {actual} segments but the genome expresses {expected}")]
    TopologyMismatch { expected: usize, actual: usize },
    #[error("population limit of {max} reached")]
    PopulationLimit { max: usize },
}

/// How joints and friction are driven each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Recurrent controller output
    #[default]
    Brain,
    /// Open-loop sine per joint using each part's phase and frequency
    Oscillate,
}

/// Control-loop constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    pub mode: ControlMode,
    /// Angular frequency of the clock input (rad/s)
    pub clock_frequency: f32,
    /// Velocities are squashed with `tanh(v / velocity_scale)`
    pub velocity_scale: f32,
    /// Motor speed per radian of angle error
    pub motor_gain: f32,
    pub friction_low: f32,
    pub friction_high: f32,
    /// Friction coefficient to damping rate
    pub friction_scale: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::Brain,
            clock_frequency: 2.0,
            velocity_scale: 5.0,
            motor_gain: 10.0,
            friction_low: 0.0,
            friction_high: 1.0,
            friction_scale: 10.0,
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            [
                self.clock_frequency,
                self.motor_gain,
                self.friction_low,
                self.friction_high,
            ]
            .iter()
            .all(|v| v.is_finite()),
            "control values must be finite",
        )?;
        ensure(
            self.velocity_scale.is_finite() && self.velocity_scale > 0.0,
            "control.velocity_scale must be positive",
        )?;
        ensure(
            self.friction_low <= self.friction_high,
            "control.friction_low must not exceed control.friction_high",
        )?;
        ensure(
            self.friction_scale.is_finite() && self.friction_scale >= 0.0,
            "control.friction_scale must be non-negative",
        )
    }
}

/// Everything needed to express and drive a genome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatureConfig {
    pub genome: GenomeConfig,
    pub build: BuildConfig,
    pub control: ControlConfig,
}

impl CreatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genome.validate()?;
        self.build.validate()?;
        self.control.validate()
    }
}

/// Introspection summary for UIs and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureStats {
    pub segments: usize,
    pub depth: usize,
    pub joints: usize,
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub parameter_count: usize,
}

/// Map a joint angle into `[-1, 1]` across its limits
pub fn normalize_joint_angle(angle: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range.abs() <= f32::EPSILON {
        return 0.0;
    }
    (2.0 * (angle - min) / range - 1.0).clamp(-1.0, 1.0)
}

/// Map an output in `[-1, 1]` onto `[low, high]`
pub fn map_output(output: f32, low: f32, high: f32) -> f32 {
    low + ((output + 1.0) * 0.5) * (high - low)
}

/// Fraction of velocity removed by friction over one tick
pub fn damping_alpha(friction: f32, scale: f32, dt: f32) -> f32 {
    (1.0 - (-friction * scale * dt).exp()).clamp(0.0, 1.0)
}

/// A spawned creature
pub struct Creature {
    id: CreatureId,
    genome: Genome,
    brain: GruController,
    phenotype: Phenotype,
    group: CollisionGroup,
    control: ControlConfig,
    clock: f32,
    spawn_position: Vec2,
    inputs: Vec<f32>,
}

impl Creature {
    /// Express `genome` into `physics` and bind its controller
    pub fn spawn<P: PhysicsBackend + ?Sized>(
        genome: Genome,
        config: &CreatureConfig,
        physics: &mut P,
        position: Vec2,
        angle: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, CreatureError> {
        let brain = GruController::new(genome.brain_config(), genome.brain_params())?;
        let group = CollisionGroup::next();
        let mut phenotype = Phenotype::build(
            &genome,
            &config.genome,
            &config.build,
            physics,
            Placement {
                position,
                angle,
                group,
            },
            rng,
        )?;

        if phenotype.gene_order() != genome.active_preorder() {
            let expected = genome.count_segments();
            let actual = phenotype.len();
            if let Err(err) = phenotype.destroy(physics) {
                log::warn!("Teardown after topology mismatch: {}", err);
            }
            return Err(CreatureError::TopologyMismatch { expected, actual });
        }

        let creature = Self {
            id: CreatureId::new(),
            inputs: Vec::with_capacity(brain.input_size()),
            genome,
            brain,
            phenotype,
            group,
            control: config.control.clone(),
            clock: 0.0,
            spawn_position: position,
        };
        log::debug!(
            "Spawned {} at ({:.2}, {:.2}): {:?}",
            creature.id,
            position.x,
            position.y,
            creature.stats()
        );
        Ok(creature)
    }

    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn brain(&self) -> &GruController {
        &self.brain
    }

    pub fn phenotype(&self) -> &Phenotype {
        &self.phenotype
    }

    pub fn group(&self) -> CollisionGroup {
        self.group
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn spawn_position(&self) -> Vec2 {
        self.spawn_position
    }

    pub fn control(&self) -> &ControlConfig {
        &self.control
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.control.mode = mode;
    }

    pub fn stats(&self) -> CreatureStats {
        let config = self.brain.config();
        CreatureStats {
            segments: self.phenotype.len(),
            depth: self.phenotype.max_depth(),
            joints: self.phenotype.joint_count(),
            input_size: config.input_size,
            hidden_size: config.hidden_size,
            output_size: config.output_size,
            parameter_count: self.brain.parameter_count(),
        }
    }

    /// Root segment position
    pub fn position<P: PhysicsBackend + ?Sized>(&self, physics: &P) -> Result<Vec2, PhysicsError> {
        match self.phenotype.root() {
            Some(root) => physics.position(root.body),
            None => Ok(self.spawn_position),
        }
    }

    /// Root displacement since spawn
    pub fn displacement<P: PhysicsBackend + ?Sized>(&self, physics: &P) -> Result<f32, PhysicsError> {
        Ok(self.position(physics)?.distance(self.spawn_position))
    }

    /// Index of the deepest part containing a world point
    pub fn part_at<P: PhysicsBackend + ?Sized>(&self, physics: &P, point: Vec2) -> Option<usize> {
        self.phenotype.part_at(physics, point)
    }

    /// One control tick: sense, think, drive motors, apply friction
    pub fn update<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P, dt: f32) -> Result<(), CreatureError> {
        self.clock += dt;

        match self.control.mode {
            ControlMode::Brain => self.think(physics)?,
            ControlMode::Oscillate => self.oscillate(physics)?,
        }

        self.apply_friction(physics, dt)?;
        Ok(())
    }

    fn sense<P: PhysicsBackend + ?Sized>(&mut self, physics: &P) -> Result<(), PhysicsError> {
        let scale = self.control.velocity_scale.max(f32::EPSILON);
        self.inputs.clear();
        self.inputs.push((self.clock * self.control.clock_frequency).sin());

        for joint in self.phenotype.parts().iter().filter_map(|p| p.joint) {
            let angle = physics.joint_angle(joint)?;
            let (min, max) = physics.joint_limits(joint)?;
            self.inputs.push(normalize_joint_angle(angle, min, max));
        }

        for part in self.phenotype.parts() {
            let velocity = physics.linear_velocity(part.body)?;
            self.inputs.push((velocity.x / scale).tanh());
            self.inputs.push((velocity.y / scale).tanh());
        }
        Ok(())
    }

    fn think<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) -> Result<(), CreatureError> {
        self.sense(physics)?;
        self.brain.set_input(&self.inputs)?;
        self.brain.step(self.genome.brain_params())?;

        let outputs = self.brain.output();
        let joints = self.phenotype.joint_count();
        let (joint_outputs, friction_outputs) = outputs.split_at(joints.min(outputs.len()));

        let gain = self.control.motor_gain;
        for (joint, &output) in self
            .phenotype
            .parts()
            .iter()
            .filter_map(|p| p.joint)
            .zip(joint_outputs)
        {
            let (min, max) = physics.joint_limits(joint)?;
            let target = map_output(output, min, max);
            let angle = physics.joint_angle(joint)?;
            physics.set_motor_speed(joint, (target - angle) * gain)?;
        }

        let (low, high) = (self.control.friction_low, self.control.friction_high);
        for (part, &output) in self.phenotype.parts_mut().iter_mut().zip(friction_outputs) {
            part.current_friction = map_output(output, low, high);
        }
        Ok(())
    }

    fn oscillate<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) -> Result<(), CreatureError> {
        let gain = self.control.motor_gain;
        for part in self.phenotype.parts() {
            let Some(joint) = part.joint else {
                continue;
            };
            let (min, max) = physics.joint_limits(joint)?;
            let wave = (self.clock * part.frequency + part.phase).sin();
            let target = map_output(wave, min, max);
            let angle = physics.joint_angle(joint)?;
            physics.set_motor_speed(joint, (target - angle) * gain)?;
        }
        Ok(())
    }

    fn apply_friction<P: PhysicsBackend + ?Sized>(&self, physics: &mut P, dt: f32) -> Result<(), PhysicsError> {
        for part in self.phenotype.parts() {
            let alpha = damping_alpha(part.current_friction, self.control.friction_scale, dt);
            if alpha <= 0.0 {
                continue;
            }
            let mass = physics.mass(part.body)?;
            let inertia = physics.inertia(part.body)?;
            let velocity = physics.linear_velocity(part.body)?;
            let spin = physics.angular_velocity(part.body)?;
            physics.apply_linear_impulse(part.body, -mass * alpha * velocity)?;
            physics.apply_angular_impulse(part.body, -inertia * alpha * spin)?;
        }
        Ok(())
    }

    /// Remove every body and joint from the world
    pub fn destroy<P: PhysicsBackend + ?Sized>(mut self, physics: &mut P) -> Result<(), PhysicsError> {
        log::debug!("Destroying {} ({} parts)", self.id, self.phenotype.len());
        self.phenotype.destroy(physics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPhysics;
    use crate::neural::ParameterLayout;
    use crate::types::JointId;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn spawn_default(physics: &mut MockPhysics, config: &CreatureConfig, seed: u64) -> Creature {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let genome = Genome::create_default(&config.genome, &mut rng);
        Creature::spawn(genome, config, physics, Vec2::ZERO, 0.0, &mut rng).unwrap()
    }

    #[test]
    fn test_normalize_joint_angle() {
        assert_eq!(normalize_joint_angle(-0.5, -0.5, 0.5), -1.0);
        assert_eq!(normalize_joint_angle(0.5, -0.5, 0.5), 1.0);
        assert_eq!(normalize_joint_angle(0.0, -0.5, 0.5), 0.0);
        // Degenerate limits
        assert_eq!(normalize_joint_angle(0.3, 0.0, 0.0), 0.0);
        // Overshoot is clamped
        assert_eq!(normalize_joint_angle(1.0, -0.5, 0.5), 1.0);
    }

    #[test]
    fn test_map_output() {
        assert_eq!(map_output(-1.0, 0.0, 2.0), 0.0);
        assert_eq!(map_output(1.0, 0.0, 2.0), 2.0);
        assert_eq!(map_output(0.0, -0.8, 0.8), 0.0);
    }

    #[test]
    fn test_damping_alpha() {
        assert_eq!(damping_alpha(0.0, 10.0, 0.016), 0.0);
        let alpha = damping_alpha(1.0, 10.0, 1.0 / 60.0);
        assert!(alpha > 0.0 && alpha < 1.0);
        assert!((damping_alpha(1e6, 10.0, 1.0) - 1.0).abs() < 1e-6);
        // Never negative, even with odd inputs
        assert_eq!(damping_alpha(-1.0, 10.0, 1.0), 0.0);
    }

    #[test]
    fn test_spawn_stats() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let creature = spawn_default(&mut physics, &config, 1);
        let stats = creature.stats();

        assert_eq!(stats.segments, 3);
        assert_eq!(stats.joints, 2);
        assert_eq!(stats.depth, 2);
        assert_eq!(stats.input_size, 9);
        assert_eq!(stats.output_size, 5);
        assert_eq!(
            stats.parameter_count,
            creature.genome().brain_params().len()
        );
        assert!(creature.group().raw() < 0);
    }

    #[test]
    fn test_each_creature_gets_own_group_and_id() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let a = spawn_default(&mut physics, &config, 2);
        let b = spawn_default(&mut physics, &config, 3);
        assert_ne!(a.id(), b.id());
        assert_ne!(a.group(), b.group());
    }

    #[test]
    fn test_zero_brain_holds_joints_at_center() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let mut genome = Genome::create_default(&config.genome, &mut rng);
        genome.fill_brain(0.0);
        let mut creature =
            Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng).unwrap();

        creature.update(&mut physics, 1.0 / 60.0).unwrap();

        for part in creature.phenotype().parts() {
            if let Some(joint) = part.joint {
                assert!(physics.motor_speed(joint).unwrap().abs() < 1e-6);
            }
            let mid = map_output(0.0, config.control.friction_low, config.control.friction_high);
            assert!((part.current_friction - mid).abs() < 1e-6);
        }
        assert!((creature.clock() - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_motor_speed_tracks_angle_error() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let mut genome = Genome::create_default(&config.genome, &mut rng);
        genome.fill_brain(0.0);
        let mut creature =
            Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng).unwrap();

        let joint = creature.phenotype().parts()[1].joint.unwrap();
        physics.joint_mut(joint).unwrap().angle = 0.2;
        creature.update(&mut physics, 1.0 / 60.0).unwrap();

        let expected = (0.0 - 0.2) * config.control.motor_gain;
        assert!((physics.motor_speed(joint).unwrap() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_friction_opposes_motion() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(6);
        let mut genome = Genome::create_default(&config.genome, &mut rng);
        genome.fill_brain(0.0);
        let mut creature =
            Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng).unwrap();
        let body = creature.phenotype().parts()[0].body;
        physics.body_mut(body).unwrap().velocity = Vec2::new(3.0, -1.0);
        physics.body_mut(body).unwrap().angular_velocity = 2.0;

        creature.update(&mut physics, 1.0 / 60.0).unwrap();

        let friction = creature.phenotype().parts()[0].current_friction;
        let alpha = damping_alpha(friction, config.control.friction_scale, 1.0 / 60.0);
        let mass = physics.mass(body).unwrap();
        let (_, impulse) = physics
            .linear_impulses
            .iter()
            .find(|(b, _)| *b == body)
            .copied()
            .unwrap();
        assert!((impulse - (-mass * alpha * Vec2::new(3.0, -1.0))).length() < 1e-5);

        let (_, spin) = physics
            .angular_impulses
            .iter()
            .find(|(b, _)| *b == body)
            .copied()
            .unwrap();
        assert!(spin < 0.0);
    }

    #[test]
    fn test_oscillate_mode_drives_joints() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig {
            control: ControlConfig {
                mode: ControlMode::Oscillate,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut creature = spawn_default(&mut physics, &config, 7);

        for _ in 0..10 {
            creature.update(&mut physics, 1.0 / 60.0).unwrap();
        }

        let moving = creature
            .phenotype()
            .parts()
            .iter()
            .filter_map(|p| p.joint)
            .filter(|&j| physics.motor_speed(j).unwrap().abs() > 1e-4)
            .count();
        assert!(moving > 0);
    }

    #[test]
    fn test_topology_mismatch_tears_down() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig {
            build: BuildConfig {
                max_depth: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(8);
        let genome = Genome::create_default(&config.genome, &mut rng);

        let result = Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng);

        assert!(matches!(
            result,
            Err(CreatureError::TopologyMismatch {
                expected: 3,
                actual: 1
            })
        ));
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn test_destroy_removes_everything() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let creature = spawn_default(&mut physics, &config, 9);
        assert_eq!(physics.body_count(), 3);

        creature.destroy(&mut physics).unwrap();

        assert_eq!(physics.body_count(), 0);
        assert_eq!(physics.joint_count(), 0);
    }

    #[test]
    fn test_part_at_and_displacement() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let creature = spawn_default(&mut physics, &config, 10);

        assert_eq!(creature.part_at(&physics, Vec2::ZERO), Some(0));
        assert_eq!(creature.displacement(&physics).unwrap(), 0.0);

        let root = creature.phenotype().parts()[0].body;
        physics.body_mut(root).unwrap().position = Vec2::new(3.0, 4.0);
        assert!((creature.displacement(&physics).unwrap() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_sensed_inputs_layout() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig::default();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let mut genome = Genome::create_default(&config.genome, &mut rng);
        genome.fill_brain(0.0);
        let mut creature =
            Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng).unwrap();

        let parts: Vec<_> = creature.phenotype().parts().to_vec();
        let (left, right) = (parts[1].joint.unwrap(), parts[2].joint.unwrap());
        physics.joint_mut(left).unwrap().angle = 0.2;
        physics.joint_mut(right).unwrap().angle = -0.1;
        physics.body_mut(parts[0].body).unwrap().velocity = Vec2::new(1.0, -2.0);
        physics.body_mut(parts[2].body).unwrap().velocity = Vec2::new(0.0, 3.0);

        let dt = 1.0 / 60.0;
        creature.update(&mut physics, dt).unwrap();

        let scale = config.control.velocity_scale;
        let normalized = |joint| {
            let (min, max) = physics.joint_limits(joint).unwrap();
            normalize_joint_angle(physics.joint_angle(joint).unwrap(), min, max)
        };
        let expected = [
            (dt * config.control.clock_frequency).sin(),
            normalized(left),
            normalized(right),
            (1.0 / scale).tanh(),
            (-2.0 / scale).tanh(),
            0.0,
            0.0,
            0.0,
            (3.0 / scale).tanh(),
        ];

        let inputs = creature.brain().input();
        assert_eq!(inputs.len(), expected.len());
        for (i, (actual, want)) in inputs.iter().zip(expected).enumerate() {
            assert!((actual - want).abs() < 1e-6, "input {}: {} != {}", i, actual, want);
        }
        assert!(normalized(left) > 0.0 && normalized(right) < 0.0);
    }

    #[test]
    fn test_saturated_outputs_drive_exact_commands() {
        let mut physics = MockPhysics::new();
        let config = CreatureConfig {
            control: ControlConfig {
                friction_low: 0.2,
                friction_high: 0.9,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(12);
        let mut genome = Genome::create_default(&config.genome, &mut rng);
        genome.fill_brain(0.0);

        // Forget gate fully open, candidate pinned to ±1 per output unit
        let layout = ParameterLayout::new(&genome.brain_config(), genome.brain_params().len()).unwrap();
        let signs = [1.0, -1.0, 1.0, -1.0, 1.0];
        let params = genome.brain_params_mut();
        layout.bias_forget.set_all(params, 20.0).unwrap();
        for (i, sign) in signs.iter().enumerate() {
            layout.bias_candidate.set(params, i, 20.0 * sign).unwrap();
        }

        let mut creature =
            Creature::spawn(genome, &config, &mut physics, Vec2::ZERO, 0.0, &mut rng).unwrap();
        let joints: Vec<JointId> = creature.phenotype().parts().iter().filter_map(|p| p.joint).collect();
        physics.joint_mut(joints[0]).unwrap().angle = 0.1;
        physics.joint_mut(joints[1]).unwrap().angle = -0.05;

        creature.update(&mut physics, 1.0 / 60.0).unwrap();

        assert_eq!(creature.brain().output(), &signs);

        let gain = config.control.motor_gain;
        let (min0, max0) = physics.joint_limits(joints[0]).unwrap();
        let (min1, max1) = physics.joint_limits(joints[1]).unwrap();
        let speed0 = physics.motor_speed(joints[0]).unwrap();
        let speed1 = physics.motor_speed(joints[1]).unwrap();
        assert!((speed0 - (max0 - 0.1) * gain).abs() < 1e-4);
        assert!((speed1 - (min1 + 0.05) * gain).abs() < 1e-4);
        assert!(min0 < 0.0 && max1 > 0.0);

        let friction: Vec<f32> = creature.phenotype().parts().iter().map(|p| p.current_friction).collect();
        for (actual, want) in friction.iter().zip([0.9, 0.2, 0.9]) {
            assert!((actual - want).abs() < 1e-6, "friction {} != {}", actual, want);
        }
    }

    #[test]
    fn test_creature_config_validation() {
        assert!(CreatureConfig::default().validate().is_ok());

        let inverted_friction = CreatureConfig {
            control: ControlConfig {
                friction_low: 0.8,
                friction_high: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(inverted_friction.validate().is_err());

        let negative_damping = CreatureConfig {
            build: BuildConfig {
                damping: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(negative_damping.validate().is_err());

        let bad_genome = CreatureConfig {
            genome: GenomeConfig {
                min_size: 2.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            bad_genome.validate(),
            Err(ConfigError::Invalid(
                "genome.min_size must not exceed genome.max_size"
            ))
        );
    }
}
