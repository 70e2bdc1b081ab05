//! rapier2d implementation of [`PhysicsBackend`]
//!
//! The world is top-down, so gravity is zero and ground contact is modelled by
//! the creature's friction damping instead of colliders.

use glam::Vec2;
use rapier2d::na::UnitComplex;
use rapier2d::prelude::*;
use std::f32::consts::{PI, TAU};

use crate::traits::{PhysicsBackend, PhysicsError, RevoluteJointDef};
use crate::types::{BodyId, CollisionGroup, JointId};

/// Drops contacts between colliders sharing a negative collision group
struct GroupFilter;

impl PhysicsHooks for GroupFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let group1 = collision_group(context.colliders, context.collider1);
        let group2 = collision_group(context.colliders, context.collider2);
        match (group1, group2) {
            (Some(a), Some(b)) if a == b => None,
            _ => Some(SolverFlags::COMPUTE_IMPULSES),
        }
    }
}

fn collision_group(colliders: &ColliderSet, handle: ColliderHandle) -> Option<CollisionGroup> {
    let collider = colliders.get(handle)?;
    CollisionGroup::from_raw(collider.user_data as u32 as i32)
}

fn body_handle(id: BodyId) -> RigidBodyHandle {
    let (index, generation) = id.parts();
    RigidBodyHandle::from_raw_parts(index, generation)
}

fn body_id(handle: RigidBodyHandle) -> BodyId {
    let (index, generation) = handle.into_raw_parts();
    BodyId::from_parts(index, generation)
}

fn joint_handle(id: JointId) -> ImpulseJointHandle {
    let (index, generation) = id.parts();
    ImpulseJointHandle::from_raw_parts(index, generation)
}

fn joint_id(handle: ImpulseJointHandle) -> JointId {
    let (index, generation) = handle.into_raw_parts();
    JointId::from_parts(index, generation)
}

/// Wrap an angle into `[-π, π]`
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Manages a rapier2d physics world for creatures
pub struct RapierPhysics {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    hooks: GroupFilter,

    /// Velocity-motor damping factor used for every joint motor
    motor_factor: f32,
}

impl RapierPhysics {
    pub fn new() -> Self {
        let integration_parameters = IntegrationParameters {
            dt: 1.0 / 60.0,
            ..Default::default()
        };

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            hooks: GroupFilter,
            motor_factor: 1.0,
        }
    }

    /// Override the joint motor damping factor
    pub fn with_motor_factor(mut self, factor: f32) -> Self {
        self.motor_factor = factor;
        self
    }

    fn body(&self, id: BodyId) -> Result<&RigidBody, PhysicsError> {
        self.rigid_body_set
            .get(body_handle(id))
            .ok_or(PhysicsError::UnknownBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody, PhysicsError> {
        self.rigid_body_set
            .get_mut(body_handle(id))
            .ok_or(PhysicsError::UnknownBody(id))
    }

    fn joint(&self, id: JointId) -> Result<&ImpulseJoint, PhysicsError> {
        self.impulse_joint_set
            .get(joint_handle(id))
            .ok_or(PhysicsError::UnknownJoint(id))
    }

    /// Reference angle stored in the joint frames
    fn reference_angle(joint: &ImpulseJoint) -> f32 {
        joint.data.local_frame1.rotation.angle() - joint.data.local_frame2.rotation.angle()
    }
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for RapierPhysics {
    fn create_body(&mut self, position: Vec2, angle: f32, damping: f32) -> Result<BodyId, PhysicsError> {
        let damping = damping.max(0.0);
        let rigid_body = RigidBodyBuilder::dynamic()
            .translation(vector![position.x, position.y])
            .rotation(angle)
            .linear_damping(damping)
            .angular_damping(damping)
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);
        Ok(body_id(handle))
    }

    fn attach_box(
        &mut self,
        body: BodyId,
        half_extents: Vec2,
        density: f32,
        group: CollisionGroup,
    ) -> Result<(), PhysicsError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(half_extents.x) || !valid(half_extents.y) {
            return Err(PhysicsError::InvalidShape {
                x: half_extents.x,
                y: half_extents.y,
            });
        }
        let handle = body_handle(body);
        if !self.rigid_body_set.contains(handle) {
            return Err(PhysicsError::UnknownBody(body));
        }

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .density(density)
            .friction(0.5)
            .restitution(0.1)
            .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
            .user_data(group.raw() as u32 as u128)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        // Mass is otherwise only refreshed on the next step
        if let Some(rb) = self.rigid_body_set.get_mut(handle) {
            rb.recompute_mass_properties_from_colliders(&self.collider_set);
        }
        Ok(())
    }

    fn create_revolute_joint(&mut self, def: &RevoluteJointDef) -> Result<JointId, PhysicsError> {
        let parent = body_handle(def.parent);
        let child = body_handle(def.child);
        if !self.rigid_body_set.contains(parent) {
            return Err(PhysicsError::UnknownBody(def.parent));
        }
        if !self.rigid_body_set.contains(child) {
            return Err(PhysicsError::UnknownBody(def.child));
        }

        let mut joint: GenericJoint = RevoluteJointBuilder::new()
            .local_anchor1(point![def.parent_anchor.x, def.parent_anchor.y])
            .local_anchor2(point![def.child_anchor.x, def.child_anchor.y])
            .limits([def.lower_limit, def.upper_limit])
            .motor_velocity(def.motor_speed, self.motor_factor)
            .motor_max_force(def.max_motor_torque)
            .contacts_enabled(false)
            .build()
            .into();
        joint.local_frame1.rotation = UnitComplex::new(def.reference_angle);

        let handle = self.impulse_joint_set.insert(parent, child, joint, true);
        Ok(joint_id(handle))
    }

    fn position(&self, body: BodyId) -> Result<Vec2, PhysicsError> {
        let t = self.body(body)?.translation();
        Ok(Vec2::new(t.x, t.y))
    }

    fn angle(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body(body)?.rotation().angle())
    }

    fn linear_velocity(&self, body: BodyId) -> Result<Vec2, PhysicsError> {
        let v = self.body(body)?.linvel();
        Ok(Vec2::new(v.x, v.y))
    }

    fn angular_velocity(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body(body)?.angvel())
    }

    fn mass(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self.body(body)?.mass())
    }

    fn inertia(&self, body: BodyId) -> Result<f32, PhysicsError> {
        Ok(self
            .body(body)?
            .mass_properties()
            .local_mprops
            .principal_inertia())
    }

    fn apply_linear_impulse(&mut self, body: BodyId, impulse: Vec2) -> Result<(), PhysicsError> {
        self.body_mut(body)?
            .apply_impulse(vector![impulse.x, impulse.y], true);
        Ok(())
    }

    fn apply_angular_impulse(&mut self, body: BodyId, impulse: f32) -> Result<(), PhysicsError> {
        self.body_mut(body)?.apply_torque_impulse(impulse, true);
        Ok(())
    }

    fn joint_angle(&self, joint: JointId) -> Result<f32, PhysicsError> {
        let data = self.joint(joint)?;
        let parent = self.rigid_body_set.get(data.body1);
        let child = self.rigid_body_set.get(data.body2);
        let (Some(parent), Some(child)) = (parent, child) else {
            return Err(PhysicsError::UnknownJoint(joint));
        };
        let relative = child.rotation().angle() - parent.rotation().angle();
        Ok(wrap_angle(relative - Self::reference_angle(data)))
    }

    fn joint_limits(&self, joint: JointId) -> Result<(f32, f32), PhysicsError> {
        let limits = self
            .joint(joint)?
            .data
            .limits(JointAxis::AngX)
            .ok_or(PhysicsError::UnknownJoint(joint))?;
        Ok((limits.min, limits.max))
    }

    fn set_motor_speed(&mut self, joint: JointId, speed: f32) -> Result<(), PhysicsError> {
        let factor = self.motor_factor;
        let data = self
            .impulse_joint_set
            .get_mut(joint_handle(joint))
            .ok_or(PhysicsError::UnknownJoint(joint))?;
        data.data.set_motor_velocity(JointAxis::AngX, speed, factor);

        // Sleeping bodies ignore motors
        let (body1, body2) = (data.body1, data.body2);
        for handle in [body1, body2] {
            if let Some(rb) = self.rigid_body_set.get_mut(handle) {
                rb.wake_up(true);
            }
        }
        Ok(())
    }

    fn motor_speed(&self, joint: JointId) -> Result<f32, PhysicsError> {
        Ok(self
            .joint(joint)?
            .data
            .motor(JointAxis::AngX)
            .map(|m| m.target_vel)
            .unwrap_or(0.0))
    }

    fn destroy_joint(&mut self, joint: JointId) -> Result<(), PhysicsError> {
        self.impulse_joint_set
            .remove(joint_handle(joint), true)
            .map(|_| ())
            .ok_or(PhysicsError::UnknownJoint(joint))
    }

    fn destroy_body(&mut self, body: BodyId) -> Result<(), PhysicsError> {
        self.rigid_body_set
            .remove(
                body_handle(body),
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .map(|_| ())
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn step(&mut self, dt: f32) {
        let gravity = vector![0.0, 0.0];
        let event_handler = ();
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &self.hooks,
            &event_handler,
        );
    }

    fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn joint_count(&self) -> usize {
        self.impulse_joint_set.len()
    }
}
