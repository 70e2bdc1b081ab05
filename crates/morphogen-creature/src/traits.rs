//! Physics access trait for creature construction and control
//!
//! Creatures only talk to the physics engine through [`PhysicsBackend`], so
//! the body builder and control loop are decoupled from any concrete engine.

use glam::Vec2;
use thiserror::Error;

use crate::types::{BodyId, CollisionGroup, JointId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
    #[error("unknown joint {0}")]
    UnknownJoint(JointId),
    #[error("invalid box half extents ({x}, {y})")]
    InvalidShape { x: f32, y: f32 },
    #[error("backend refused the request: {0}")]
    Rejected(String),
}

/// Motorized revolute joint between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevoluteJointDef {
    pub parent: BodyId,
    pub child: BodyId,
    /// Pivot in the parent's local frame
    pub parent_anchor: Vec2,
    /// Pivot in the child's local frame
    pub child_anchor: Vec2,
    /// Child angle minus parent angle at which the joint reads zero
    pub reference_angle: f32,
    pub lower_limit: f32,
    pub upper_limit: f32,
    pub max_motor_torque: f32,
    pub motor_speed: f32,
}

/// Rigid-body engine operations needed by creatures
pub trait PhysicsBackend {
    /// Create a dynamic body at a world position and angle
    ///
    /// `damping` slows both linear and angular velocity; 0 disables it.
    fn create_body(&mut self, position: Vec2, angle: f32, damping: f32) -> Result<BodyId, PhysicsError>;

    /// Attach a solid box shape to a body
    fn attach_box(
        &mut self,
        body: BodyId,
        half_extents: Vec2,
        density: f32,
        group: CollisionGroup,
    ) -> Result<(), PhysicsError>;

    fn create_revolute_joint(&mut self, def: &RevoluteJointDef) -> Result<JointId, PhysicsError>;

    fn position(&self, body: BodyId) -> Result<Vec2, PhysicsError>;
    fn angle(&self, body: BodyId) -> Result<f32, PhysicsError>;
    fn linear_velocity(&self, body: BodyId) -> Result<Vec2, PhysicsError>;
    fn angular_velocity(&self, body: BodyId) -> Result<f32, PhysicsError>;
    fn mass(&self, body: BodyId) -> Result<f32, PhysicsError>;
    /// Rotational inertia about the center of mass
    fn inertia(&self, body: BodyId) -> Result<f32, PhysicsError>;

    fn apply_linear_impulse(&mut self, body: BodyId, impulse: Vec2) -> Result<(), PhysicsError>;
    fn apply_angular_impulse(&mut self, body: BodyId, impulse: f32) -> Result<(), PhysicsError>;

    /// Current joint angle relative to its reference angle, in `[-π, π]`
    fn joint_angle(&self, joint: JointId) -> Result<f32, PhysicsError>;
    /// (lower, upper) joint limits
    fn joint_limits(&self, joint: JointId) -> Result<(f32, f32), PhysicsError>;
    fn set_motor_speed(&mut self, joint: JointId, speed: f32) -> Result<(), PhysicsError>;
    fn motor_speed(&self, joint: JointId) -> Result<f32, PhysicsError>;

    fn destroy_joint(&mut self, joint: JointId) -> Result<(), PhysicsError>;
    /// Destroy a body and the shapes attached to it
    fn destroy_body(&mut self, body: BodyId) -> Result<(), PhysicsError>;

    /// Advance the world by `dt` seconds
    fn step(&mut self, dt: f32);

    fn body_count(&self) -> usize;
    fn joint_count(&self) -> usize;
}
