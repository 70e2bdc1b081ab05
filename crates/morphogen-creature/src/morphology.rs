//! Phenotype construction from body-plan genomes
//!
//! Expresses a [`Genome`] into rigid bodies and motorized revolute joints.
//! Segments are boxes; every child hangs off one edge of its parent with its
//! local +y axis along that edge's outward normal.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::genome::{AttachSide, ConfigError, Genome, GenomeConfig, ensure, finite_range};
use crate::traits::{PhysicsBackend, PhysicsError, RevoluteJointDef};
use crate::types::{BodyId, CollisionGroup, JointId};

/// Point on a box edge in the box's local frame
///
/// `position` runs from 0 to 1 along the edge: left to right on top/bottom,
/// bottom to top on left/right.
pub fn local_anchor(width: f32, height: f32, side: AttachSide, position: f32) -> Vec2 {
    let (hw, hh) = (width * 0.5, height * 0.5);
    match side {
        AttachSide::Top => Vec2::new(-hw + position * width, hh),
        AttachSide::Bottom => Vec2::new(-hw + position * width, -hh),
        AttachSide::Left => Vec2::new(-hw, -hh + position * height),
        AttachSide::Right => Vec2::new(hw, -hh + position * height),
    }
}

/// Outward unit normal of a box edge in the box's local frame
pub fn edge_normal(side: AttachSide) -> Vec2 {
    match side {
        AttachSide::Top => Vec2::Y,
        AttachSide::Bottom => Vec2::NEG_Y,
        AttachSide::Left => Vec2::NEG_X,
        AttachSide::Right => Vec2::X,
    }
}

/// Physical parameters used when expressing a genome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Recursion stops below this many levels
    pub max_depth: usize,
    pub density: f32,
    /// Linear and angular damping of every segment
    pub damping: f32,
    pub max_motor_torque: f32,
    /// Friction every segment starts with
    pub initial_friction: f32,
    /// Sampling range of the per-part oscillation frequency (rad/s)
    pub frequency_range: (f32, f32),
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            density: 1.0,
            damping: 0.0,
            max_motor_torque: 50.0,
            initial_friction: 0.5,
            frequency_range: (1.0, 4.0),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.density.is_finite() && self.density > 0.0,
            "build.density must be positive",
        )?;
        ensure(
            self.damping.is_finite() && self.damping >= 0.0,
            "build.damping must be non-negative",
        )?;
        ensure(
            self.max_motor_torque.is_finite() && self.max_motor_torque >= 0.0,
            "build.max_motor_torque must be non-negative",
        )?;
        ensure(
            self.initial_friction.is_finite(),
            "build.initial_friction must be finite",
        )?;
        ensure(
            finite_range(self.frequency_range),
            "build.frequency_range must be finite",
        )
    }
}

/// One expressed body segment
#[derive(Debug, Clone)]
pub struct BodyPart {
    /// Index of the gene this part was expressed from
    pub gene: usize,
    pub depth: usize,
    /// World-space width and height
    pub size: Vec2,
    pub spawn_position: Vec2,
    pub spawn_angle: f32,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub body: BodyId,
    /// Joint to the parent; `None` for the root
    pub joint: Option<JointId>,
    pub current_friction: f32,
    /// Oscillation parameters for open-loop control
    pub phase: f32,
    pub frequency: f32,
}

impl BodyPart {
    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }
}

/// Arena of body parts in pre-order; the root is at index 0
#[derive(Debug, Clone, Default)]
pub struct Phenotype {
    parts: Vec<BodyPart>,
}

/// Spawn pose and collision group for a build
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub position: Vec2,
    pub angle: f32,
    pub group: CollisionGroup,
}

struct Builder<'a, P: PhysicsBackend + ?Sized, R: Rng> {
    genome: &'a Genome,
    genome_config: &'a GenomeConfig,
    config: &'a BuildConfig,
    physics: &'a mut P,
    rng: &'a mut R,
    group: CollisionGroup,
    parts: Vec<BodyPart>,
}

impl<P: PhysicsBackend + ?Sized, R: Rng> Builder<'_, P, R> {
    fn part_size(&self, gene: usize, depth: usize) -> Vec2 {
        let g = &self.genome.genes()[gene];
        let scale = self.genome_config.base_size * self.genome_config.scale_factor.powi(depth as i32);
        Vec2::new(g.width, g.height) * scale
    }

    fn build(
        &mut self,
        gene: usize,
        parent: Option<usize>,
        position: Vec2,
        angle: f32,
        depth: usize,
    ) -> Result<(), PhysicsError> {
        let size = self.part_size(gene, depth);
        let body = self.physics.create_body(position, angle, self.config.damping)?;

        let (lo, hi) = ordered(self.config.frequency_range);
        let index = self.parts.len();
        self.parts.push(BodyPart {
            gene,
            depth,
            size,
            spawn_position: position,
            spawn_angle: angle,
            parent,
            children: Vec::new(),
            body,
            joint: None,
            current_friction: self.config.initial_friction,
            phase: self.rng.random_range(0.0..TAU),
            frequency: self.rng.random_range(lo..=hi),
        });

        self.physics
            .attach_box(body, size * 0.5, self.config.density, self.group)?;

        if let Some(parent) = parent {
            self.parts[parent].children.push(index);
            let joint = self.attach_to_parent(parent, index)?;
            self.parts[index].joint = Some(joint);
        }

        if depth + 1 >= self.config.max_depth {
            return Ok(());
        }

        let children: Vec<usize> = self.genome.children(gene).collect();
        for child in children {
            let (child_position, child_angle) = self.child_pose(index, child);
            self.build(child, Some(index), child_position, child_angle, depth + 1)?;
        }
        Ok(())
    }

    /// Child orientation and centre so its back anchor meets the parent edge
    fn child_pose(&self, parent: usize, child_gene: usize) -> (Vec2, f32) {
        let part = &self.parts[parent];
        let gene = &self.genome.genes()[child_gene];
        let side = gene.side.unwrap_or(AttachSide::Top);

        let anchor = local_anchor(part.size.x, part.size.y, side, gene.position);
        let normal = edge_normal(side);
        let angle = part.spawn_angle + normal.y.atan2(normal.x) - FRAC_PI_2;

        let anchor_world = part.spawn_position + Vec2::from_angle(part.spawn_angle).rotate(anchor);
        let child_height = self.part_size(child_gene, part.depth + 1).y;
        let center = anchor_world + Vec2::from_angle(angle).rotate(Vec2::new(0.0, child_height * 0.5));
        (center, angle)
    }

    fn attach_to_parent(&mut self, parent: usize, index: usize) -> Result<JointId, PhysicsError> {
        let p = &self.parts[parent];
        let c = &self.parts[index];
        let gene = &self.genome.genes()[c.gene];
        let side = gene.side.unwrap_or(AttachSide::Top);
        let limit = gene.angle_range * self.genome_config.max_joint_deviation;

        let def = RevoluteJointDef {
            parent: p.body,
            child: c.body,
            parent_anchor: local_anchor(p.size.x, p.size.y, side, gene.position),
            child_anchor: Vec2::new(0.0, -c.size.y * 0.5),
            reference_angle: c.spawn_angle - p.spawn_angle,
            lower_limit: -limit,
            upper_limit: limit,
            max_motor_torque: self.config.max_motor_torque,
            motor_speed: 0.0,
        };
        self.physics.create_revolute_joint(&def)
    }
}

fn ordered((a, b): (f32, f32)) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

impl Phenotype {
    /// Express `genome` into `physics`
    ///
    /// On failure every body and joint created so far is destroyed before the
    /// error is returned.
    pub fn build<P: PhysicsBackend + ?Sized>(
        genome: &Genome,
        genome_config: &GenomeConfig,
        config: &BuildConfig,
        physics: &mut P,
        placement: Placement,
        rng: &mut impl Rng,
    ) -> Result<Self, PhysicsError> {
        let mut builder = Builder {
            genome,
            genome_config,
            config,
            physics,
            rng,
            group: placement.group,
            parts: Vec::new(),
        };

        let result = builder.build(0, None, placement.position, placement.angle, 0);
        let mut phenotype = Phenotype {
            parts: std::mem::take(&mut builder.parts),
        };

        match result {
            Ok(()) => {
                log::debug!(
                    "Built phenotype: {} parts, {} joints",
                    phenotype.parts.len(),
                    phenotype.joint_count()
                );
                Ok(phenotype)
            }
            Err(err) => {
                log::warn!(
                    "Phenotype build failed after {} parts: {}",
                    phenotype.parts.len(),
                    err
                );
                if let Err(teardown) = phenotype.destroy(physics) {
                    log::warn!("Teardown after failed build: {}", teardown);
                }
                Err(err)
            }
        }
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [BodyPart] {
        &mut self.parts
    }

    pub fn root(&self) -> Option<&BodyPart> {
        self.parts.first()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn joint_count(&self) -> usize {
        self.parts.iter().filter(|p| p.joint.is_some()).count()
    }

    pub fn max_depth(&self) -> usize {
        self.parts.iter().map(|p| p.depth + 1).max().unwrap_or(0)
    }

    /// Gene indices in part order
    pub fn gene_order(&self) -> Vec<usize> {
        self.parts.iter().map(|p| p.gene).collect()
    }

    /// Destroy every joint and body, children before parents
    ///
    /// Keeps going after a failure and returns the first error.
    pub fn destroy<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) -> Result<(), PhysicsError> {
        let mut first_error = None;
        // Reverse pre-order visits every subtree before its root
        for part in self.parts.drain(..).rev() {
            if let Some(joint) = part.joint
                && let Err(err) = physics.destroy_joint(joint)
            {
                first_error.get_or_insert(err);
            }
            if let Err(err) = physics.destroy_body(part.body) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Deepest part whose rectangle contains a world point
    pub fn part_at<P: PhysicsBackend + ?Sized>(&self, physics: &P, point: Vec2) -> Option<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, part)| {
                let (Ok(position), Ok(angle)) = (physics.position(part.body), physics.angle(part.body)) else {
                    return false;
                };
                let local = Vec2::from_angle(-angle).rotate(point - position);
                let half = part.half_extents();
                local.x.abs() <= half.x && local.y.abs() <= half.y
            })
            .max_by_key(|(index, part)| (part.depth, *index))
            .map(|(index, _)| index)
    }
}
