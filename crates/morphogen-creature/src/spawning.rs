//! Creature spawning and management
//!
//! Owns the live population and runs the world tick: every creature updates,
//! physics steps once, then despawns requested during the tick are applied.

use ahash::AHashMap;
use glam::Vec2;
use rand::Rng;

use crate::creature::{Creature, CreatureConfig, CreatureError};
use crate::genome::Genome;
use crate::traits::PhysicsBackend;
use crate::types::CreatureId;

/// Manages creature population
pub struct CreatureManager {
    creatures: AHashMap<CreatureId, Creature>,
    pending_despawn: Vec<CreatureId>,
    max_creatures: usize,
    config: CreatureConfig,
}

impl CreatureManager {
    pub fn new(max_creatures: usize, config: CreatureConfig) -> Self {
        Self {
            creatures: AHashMap::new(),
            pending_despawn: Vec::new(),
            max_creatures,
            config,
        }
    }

    pub fn config(&self) -> &CreatureConfig {
        &self.config
    }

    /// Spawn a creature from a genome; call between ticks
    pub fn spawn<P: PhysicsBackend + ?Sized>(
        &mut self,
        genome: Genome,
        position: Vec2,
        physics: &mut P,
        rng: &mut impl Rng,
    ) -> Result<CreatureId, CreatureError> {
        if !self.can_spawn() {
            log::warn!(
                "Cannot spawn creature: max population reached ({})",
                self.max_creatures
            );
            return Err(CreatureError::PopulationLimit {
                max: self.max_creatures,
            });
        }

        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let creature = Creature::spawn(genome, &self.config, physics, position, angle, rng)?;
        let id = creature.id();
        self.creatures.insert(id, creature);

        log::debug!(
            "Spawned creature {} at ({:.1}, {:.1}). Population: {}/{}",
            id,
            position.x,
            position.y,
            self.count(),
            self.max_creatures
        );
        Ok(id)
    }

    /// Request removal; bodies are destroyed after the next physics step
    pub fn despawn(&mut self, id: CreatureId) -> bool {
        if !self.creatures.contains_key(&id) || self.pending_despawn.contains(&id) {
            return false;
        }
        self.pending_despawn.push(id);
        true
    }

    /// One world tick
    ///
    /// Creatures whose update failed are despawned at the end of the tick and
    /// returned with their errors.
    pub fn update<P: PhysicsBackend + ?Sized>(
        &mut self,
        physics: &mut P,
        dt: f32,
    ) -> Vec<(CreatureId, CreatureError)> {
        // Stable order keeps runs reproducible
        let mut ids: Vec<CreatureId> = self.creatures.keys().copied().collect();
        ids.sort();

        let mut failures = Vec::new();
        for id in ids {
            let Some(creature) = self.creatures.get_mut(&id) else {
                continue;
            };
            if let Err(err) = creature.update(physics, dt) {
                log::warn!("Creature {} failed to update, despawning: {}", id, err);
                self.despawn(id);
                failures.push((id, err));
            }
        }

        physics.step(dt);
        self.flush_despawns(physics);
        failures
    }

    /// Destroy every creature whose despawn was requested
    pub fn flush_despawns<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        for id in std::mem::take(&mut self.pending_despawn) {
            let Some(creature) = self.creatures.remove(&id) else {
                continue;
            };
            if let Err(err) = creature.destroy(physics) {
                log::warn!("Incomplete teardown of {}: {}", id, err);
            }
            log::debug!(
                "Removed creature {}. Population: {}/{}",
                id,
                self.count(),
                self.max_creatures
            );
        }
    }

    /// Despawn everything immediately
    pub fn clear<P: PhysicsBackend + ?Sized>(&mut self, physics: &mut P) {
        self.pending_despawn = self.creatures.keys().copied().collect();
        self.flush_despawns(physics);
    }

    pub fn count(&self) -> usize {
        self.creatures.len()
    }

    pub fn can_spawn(&self) -> bool {
        self.creatures.len() < self.max_creatures
    }

    pub fn get(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn get_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CreatureId, &Creature)> {
        self.creatures.iter()
    }

    /// Creature owning the deepest body part under a world point
    pub fn creature_at<P: PhysicsBackend + ?Sized>(
        &self,
        physics: &P,
        point: Vec2,
    ) -> Option<(CreatureId, usize)> {
        self.creatures
            .iter()
            .filter_map(|(&id, c)| c.part_at(physics, point).map(|part| (id, part)))
            .max_by_key(|&(id, part)| {
                let depth = self
                    .creatures
                    .get(&id)
                    .and_then(|c| c.phenotype().parts().get(part))
                    .map_or(0, |p| p.depth);
                (depth, id)
            })
    }
}
