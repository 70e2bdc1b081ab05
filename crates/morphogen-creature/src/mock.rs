//! In-memory physics backend for unit tests
//!
//! Records every call and can be told to fail after a number of bodies or
//! joints so teardown paths can be checked.

use glam::Vec2;

use crate::traits::{PhysicsBackend, PhysicsError, RevoluteJointDef};
use crate::types::{BodyId, CollisionGroup, JointId};

#[derive(Debug, Clone)]
pub(crate) struct MockBody {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub mass: f32,
    pub inertia: f32,
    pub damping: f32,
    pub group: Option<CollisionGroup>,
}

#[derive(Debug, Clone)]
pub(crate) struct MockJoint {
    pub def: RevoluteJointDef,
    pub angle: f32,
    pub speed: f32,
}

#[derive(Debug, Default)]
pub(crate) struct MockPhysics {
    pub bodies: Vec<Option<MockBody>>,
    pub joints: Vec<Option<MockJoint>>,
    /// Refuse `create_body` once this many bodies were created
    pub fail_body_after: Option<usize>,
    /// Refuse `create_revolute_joint` once this many joints were created
    pub fail_joint_after: Option<usize>,
    pub destroyed_bodies: Vec<BodyId>,
    pub destroyed_joints: Vec<JointId>,
    pub linear_impulses: Vec<(BodyId, Vec2)>,
    pub angular_impulses: Vec<(BodyId, f32)>,
    pub steps: usize,
}

impl MockPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_ref(&self, id: BodyId) -> Result<&MockBody, PhysicsError> {
        self.bodies
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(PhysicsError::UnknownBody(id))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut MockBody, PhysicsError> {
        self.bodies
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(PhysicsError::UnknownBody(id))
    }

    pub fn joint_ref(&self, id: JointId) -> Result<&MockJoint, PhysicsError> {
        self.joints
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(PhysicsError::UnknownJoint(id))
    }

    pub fn joint_mut(&mut self, id: JointId) -> Result<&mut MockJoint, PhysicsError> {
        self.joints
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(PhysicsError::UnknownJoint(id))
    }
}

impl PhysicsBackend for MockPhysics {
    fn create_body(&mut self, position: Vec2, angle: f32, damping: f32) -> Result<BodyId, PhysicsError> {
        if self.fail_body_after.is_some_and(|n| self.bodies.len() >= n) {
            return Err(PhysicsError::Rejected("body limit".into()));
        }
        self.bodies.push(Some(MockBody {
            position,
            angle,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 0.0,
            inertia: 0.0,
            damping,
            group: None,
        }));
        Ok(BodyId(self.bodies.len() as u64 - 1))
    }

    fn attach_box(
        &mut self,
        body: BodyId,
        half_extents: Vec2,
        density: f32,
        group: CollisionGroup,
    ) -> Result<(), PhysicsError> {
        let b = self.body_mut(body)?;
        let size = half_extents * 2.0;
        b.mass = size.x * size.y * density;
        b.inertia = b.mass * (size.x * size.x + size.y * size.y) / 12.0;
        b.group = Some(group);
        Ok(())
    }

    fn create_revolute_joint(&mut self, def: &RevoluteJointDef) -> Result<JointId, PhysicsError> {
        if self.fail_joint_after.is_some_and(|n| self.joints.len() >= n) {
            return Err(PhysicsError::Rejected("joint limit".into()));
        }
        self.body_ref(def.parent)?;
        self.body_ref(def.child)?;
        self.joints.push(Some(MockJoint {
            def: *def,
            angle: 0.0,
            speed: def.motor_speed,
        }));
        Ok(JointId(self.joints.len() as u64 - 1))
    }

    fn position(&self, body: BodyId) -> Result<Vec2, PhysicsError> {
        Ok(self.body_ref(body)?.position)
    }

    fn angle(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body_ref(body)?.angle)
    }

    fn linear_velocity(&self, body: BodyId) -> Result<Vec2, PhysicsError> {
        Ok(self.body_ref(body)?.velocity)
    }

    fn angular_velocity(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body_ref(body)?.angular_velocity)
    }

    fn mass(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body_ref(body)?.mass)
    }

    fn inertia(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body_ref(body)?.inertia)
    }

    fn apply_linear_impulse(&mut self, body: BodyId, impulse: Vec2) -> Result<(), PhysicsError> {
        self.body_ref(body)?;
        self.linear_impulses.push((body, impulse));
        Ok(())
    }

    fn apply_angular_impulse(&mut self, body: BodyId, impulse: f32) -> Result<(), PhysicsError> {
        self.body_ref(body)?;
        self.angular_impulses.push((body, impulse));
        Ok(())
    }

    fn joint_angle(&self, joint: JointId) -> Result<f32, PhysicsError> {
        Ok(self.joint_ref(joint)?.angle)
    }

    fn joint_limits(&self, joint: JointId) -> Result<(f32, f32), PhysicsError> {
        let def = &self.joint_ref(joint)?.def;
        Ok((def.lower_limit, def.upper_limit))
    }

    fn set_motor_speed(&mut self, joint: JointId, speed: f32) -> Result<(), PhysicsError> {
        self.joint_mut(joint)?.speed = speed;
        Ok(())
    }

    fn motor_speed(&self, joint: JointId) -> Result<f32, PhysicsError> {
        Ok(self.joint_ref(joint)?.speed)
    }

    fn destroy_joint(&mut self, joint: JointId) -> Result<(), PhysicsError> {
        let slot = self
            .joints
            .get_mut(joint.0 as usize)
            .ok_or(PhysicsError::UnknownJoint(joint))?;
        slot.take().ok_or(PhysicsError::UnknownJoint(joint))?;
        self.destroyed_joints.push(joint);
        Ok(())
    }

    fn destroy_body(&mut self, body: BodyId) -> Result<(), PhysicsError> {
        let slot = self
            .bodies
            .get_mut(body.0 as usize)
            .ok_or(PhysicsError::UnknownBody(body))?;
        slot.take().ok_or(PhysicsError::UnknownBody(body))?;
        self.destroyed_bodies.push(body);
        Ok(())
    }

    fn step(&mut self, _dt: f32) {
        self.steps += 1;
    }

    fn body_count(&self) -> usize {
        self.bodies.iter().flatten().count()
    }

    fn joint_count(&self) -> usize {
        self.joints.iter().flatten().count()
    }
}
