//! Common identifier types for creatures and physics handles

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

/// Process-wide creature handle; ordering follows spawn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(u64);

static NEXT_CREATURE_ID: AtomicU64 = AtomicU64::new(1);

impl CreatureId {
    pub fn new() -> Self {
        CreatureId(NEXT_CREATURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for CreatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Creature({})", self.0)
    }
}

/// Negative collision group shared by all segments of one creature
///
/// Shapes in the same group never collide with each other; shapes in
/// different groups collide normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionGroup(i32);

static NEXT_COLLISION_GROUP: AtomicI32 = AtomicI32::new(-1);

impl CollisionGroup {
    /// Allocate a fresh group (-1, -2, -3, ...)
    pub fn next() -> Self {
        CollisionGroup(NEXT_COLLISION_GROUP.fetch_sub(1, Ordering::Relaxed))
    }

    /// Wrap an existing negative group index
    pub fn from_raw(index: i32) -> Option<Self> {
        (index < 0).then_some(CollisionGroup(index))
    }

    pub fn raw(&self) -> i32 {
        self.0
    }
}

/// Opaque handle to a rigid body owned by a [`PhysicsBackend`](crate::traits::PhysicsBackend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// Opaque handle to a joint owned by a [`PhysicsBackend`](crate::traits::PhysicsBackend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointId(pub u64);

impl BodyId {
    /// Pack an (index, generation) pair
    pub fn from_parts(index: u32, generation: u32) -> Self {
        BodyId(((generation as u64) << 32) | index as u64)
    }

    pub fn parts(&self) -> (u32, u32) {
        (self.0 as u32, (self.0 >> 32) as u32)
    }
}

impl JointId {
    /// Pack an (index, generation) pair
    pub fn from_parts(index: u32, generation: u32) -> Self {
        JointId(((generation as u64) << 32) | index as u64)
    }

    pub fn parts(&self) -> (u32, u32) {
        (self.0 as u32, (self.0 >> 32) as u32)
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (index, generation) = self.parts();
        write!(f, "Body({}v{})", index, generation)
    }
}

impl std::fmt::Display for JointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (index, generation) = self.parts();
        write!(f, "Joint({}v{})", index, generation)
    }
}
