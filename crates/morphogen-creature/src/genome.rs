//! Body-plan genome and controller parameters
//!
//! A genome is a tree of body-part genes stored as a flat list with explicit
//! parent indices, plus the flat parameter buffer of the creature's recurrent
//! controller. The controller shape is derived from the body, so every change
//! in topology goes through [`Genome::rebuild_brain`].

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::neural::BrainConfig;

/// Edge of a parent segment a child attaches to (in the parent's local frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl AttachSide {
    pub const ALL: [AttachSide; 4] = [
        AttachSide::Top,
        AttachSide::Bottom,
        AttachSide::Left,
        AttachSide::Right,
    ];

    /// Sides a child may grow from on a node
    ///
    /// Non-root segments point their local +y away from the parent, so their
    /// bottom edge is the one attached to the parent and stays free.
    pub fn allowed(is_root: bool) -> &'static [AttachSide] {
        if is_root {
            &Self::ALL
        } else {
            &[AttachSide::Top, AttachSide::Left, AttachSide::Right]
        }
    }
}

/// Gene describing one body segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyPartGene {
    /// Normalized width in `[min_size, max_size]`
    pub width: f32,
    /// Normalized height in `[min_size, max_size]`
    pub height: f32,
    /// Inactive genes are logically deleted and skipped everywhere
    pub active: bool,
    pub parent: Option<usize>,
    /// `None` only for the root
    pub side: Option<AttachSide>,
    /// Fraction along the parent's side, `[0, 1]`
    pub position: f32,
    /// Fraction of the global maximum joint deviation, `[0, 1]`
    pub angle_range: f32,
}

impl BodyPartGene {
    pub fn root(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            active: true,
            parent: None,
            side: None,
            position: 0.5,
            angle_range: 0.0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Process-independent tunables for genome construction and expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeConfig {
    /// Size multiplier applied once per depth level
    pub scale_factor: f32,
    /// Maximum number of levels, root included
    pub max_depth: usize,
    /// Maximum number of active segments
    pub max_segments: usize,
    /// Joint limit for `angle_range == 1.0` (radians)
    pub max_joint_deviation: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// World size of a normalized dimension of 1.0 at depth 0
    pub base_size: f32,
    /// Upper bound on child attempts at the root; shrinks by one per level
    pub max_child_attempts: usize,
    /// Probability of accepting a child attempt at the root
    pub branch_probability: f32,
    /// Per-level multiplier on `branch_probability`
    pub branch_decay: f32,
    /// Sampling range for attachment positions of new genes
    pub position_range: (f32, f32),
    /// Sampling range for angle ranges of new genes
    pub angle_range_range: (f32, f32),
    /// New brain parameters are drawn from `±brain_init_range`
    pub brain_init_range: f32,
    /// Hard clamp on brain parameters after mutation
    pub brain_ceiling: f32,
    pub hidden_per_segment: usize,
    pub max_hidden: usize,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            scale_factor: 0.8,
            max_depth: 4,
            max_segments: 12,
            max_joint_deviation: std::f32::consts::FRAC_PI_2,
            min_size: 0.25,
            max_size: 1.0,
            base_size: 1.0,
            max_child_attempts: 4,
            branch_probability: 0.9,
            branch_decay: 0.6,
            position_range: (0.2, 0.8),
            angle_range_range: (0.2, 0.8),
            brain_init_range: 0.5,
            brain_ceiling: 4.0,
            hidden_per_segment: 2,
            max_hidden: 16,
        }
    }
}

impl GenomeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.min_size.is_finite() && self.max_size.is_finite(),
            "genome.min_size and genome.max_size must be finite",
        )?;
        ensure(self.min_size > 0.0, "genome.min_size must be positive")?;
        ensure(
            self.min_size <= self.max_size,
            "genome.min_size must not exceed genome.max_size",
        )?;
        ensure(
            self.scale_factor.is_finite() && self.scale_factor > 0.0,
            "genome.scale_factor must be positive",
        )?;
        ensure(
            self.base_size.is_finite() && self.base_size > 0.0,
            "genome.base_size must be positive",
        )?;
        ensure(self.max_depth >= 1, "genome.max_depth must be at least 1")?;
        ensure(self.max_segments >= 1, "genome.max_segments must be at least 1")?;
        ensure(
            self.max_joint_deviation.is_finite() && self.max_joint_deviation >= 0.0,
            "genome.max_joint_deviation must be non-negative",
        )?;
        ensure(
            self.branch_probability.is_finite() && self.branch_decay.is_finite(),
            "genome.branch_probability and genome.branch_decay must be finite",
        )?;
        ensure(
            finite_range(self.position_range) && finite_range(self.angle_range_range),
            "genome.position_range and genome.angle_range_range must be finite",
        )?;
        ensure(
            self.brain_init_range.is_finite() && self.brain_init_range > 0.0,
            "genome.brain_init_range must be positive",
        )?;
        ensure(
            self.brain_ceiling.is_finite() && self.brain_ceiling > 0.0,
            "genome.brain_ceiling must be positive",
        )?;
        ensure(
            self.brain_init_range <= self.brain_ceiling,
            "genome.brain_init_range must not exceed genome.brain_ceiling",
        )
    }
}

/// Mutation rates and strengths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability per body gene field
    pub rate: f32,
    /// Max perturbation of a body gene field
    pub strength: f32,
    /// Probability per brain parameter
    pub brain_rate: f32,
    /// Max perturbation of a brain parameter
    pub brain_strength: f32,
    /// Add-part probability is `rate * structural_fraction`
    pub structural_fraction: f32,
    /// Remove-part probability relative to the add-part probability
    pub removal_fraction: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            rate: 0.1,
            strength: 0.1,
            brain_rate: 0.1,
            brain_strength: 0.2,
            structural_fraction: 0.1,
            removal_fraction: 0.5,
        }
    }
}

impl MutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            [
                self.rate,
                self.strength,
                self.brain_rate,
                self.brain_strength,
                self.structural_fraction,
                self.removal_fraction,
            ]
            .iter()
            .all(|v| v.is_finite()),
            "mutation rates and strengths must be finite",
        )
    }
}

/// A tunable outside the range the samplers and clamps accept
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

pub(crate) fn ensure(condition: bool, message: &'static str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message))
    }
}

pub(crate) fn finite_range((a, b): (f32, f32)) -> bool {
    a.is_finite() && b.is_finite()
}

/// Structural edits rejected by validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenomeError {
    #[error("gene {index} does not exist ({len} genes)")]
    UnknownGene { index: usize, len: usize },
    #[error("gene {index} is inactive")]
    InactiveGene { index: usize },
    #[error("the root segment cannot be removed")]
    RootRemoval,
    #[error("segment limit of {max} reached")]
    SegmentLimit { max: usize },
    #[error("gene {index} is at the depth limit")]
    DepthLimit { index: usize },
    #[error("gene {index} has no free attachment side")]
    NoFreeSide { index: usize },
}

/// Emitted whenever the brain buffer is reallocated for a new topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrainRebuild {
    pub old_config: BrainConfig,
    pub new_config: BrainConfig,
    pub old_size: usize,
    pub new_size: usize,
    /// Leading parameters copied over unchanged
    pub preserved: usize,
}

/// Body topology change applied by a mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralChange {
    Added { index: usize },
    Removed { index: usize, deactivated: usize },
}

/// Summary of one call to [`Genome::mutate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub body_mutations: usize,
    pub brain_mutations: usize,
    pub structural: Option<StructuralChange>,
    pub rebuild: Option<BrainRebuild>,
}

/// Complete creature genome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<BodyPartGene>,
    brain: Vec<f32>,
    brain_config: BrainConfig,
}

impl Genome {
    /// Root plus two symmetric limbs on its left and right edges
    pub fn create_default(config: &GenomeConfig, rng: &mut impl Rng) -> Self {
        let size = config.max_size.min(0.5).max(config.min_size);
        let limb = |side| BodyPartGene {
            width: size,
            height: size,
            active: true,
            parent: Some(0),
            side: Some(side),
            position: 0.5,
            angle_range: 0.5,
        };

        let genes = vec![
            BodyPartGene::root(config.max_size, config.max_size),
            limb(AttachSide::Left),
            limb(AttachSide::Right),
        ];
        Self::with_random_brain(genes, config, rng)
    }

    /// Depth-bounded stochastic body growth
    pub fn create_random(config: &GenomeConfig, rng: &mut impl Rng) -> Self {
        let root = BodyPartGene::root(
            random_size(config, rng),
            random_size(config, rng),
        );
        let mut genes = vec![root];
        grow(&mut genes, 0, 0, config, rng);

        log::debug!(
            "Random genome: {} segments, depth {}",
            genes.len(),
            max_depth_from(&genes, 0)
        );

        Self::with_random_brain(genes, config, rng)
    }

    fn with_random_brain(
        genes: Vec<BodyPartGene>,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let brain_config = calculate_brain_config(&genes, config);
        let brain = (0..brain_config.required_parameter_size())
            .map(|_| rng.random_range(-config.brain_init_range..=config.brain_init_range))
            .collect();

        Self {
            genes,
            brain,
            brain_config,
        }
    }

    pub fn genes(&self) -> &[BodyPartGene] {
        &self.genes
    }

    pub fn gene(&self, index: usize) -> Option<&BodyPartGene> {
        self.genes.get(index)
    }

    pub fn brain_params(&self) -> &[f32] {
        &self.brain
    }

    /// Mutable access to the raw parameters; the buffer length is fixed
    pub fn brain_params_mut(&mut self) -> &mut [f32] {
        &mut self.brain
    }

    pub fn brain_config(&self) -> BrainConfig {
        self.brain_config
    }

    /// Set every brain parameter to `value`
    pub fn fill_brain(&mut self, value: f32) {
        self.brain.fill(value);
    }

    /// Active children of a gene, in index order
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        children_of(&self.genes, index)
    }

    /// Active genes in depth-first pre-order starting at the root
    pub fn active_preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.genes.len());
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            if !self.genes.get(index).is_some_and(|g| g.active) {
                continue;
            }
            order.push(index);
            // Reverse so lower indices are visited first
            let children: Vec<usize> = self.children(index).collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Number of active segments reachable from the root
    pub fn count_segments(&self) -> usize {
        count_active(&self.genes, 0)
    }

    /// Every active non-root segment hangs off one joint
    pub fn count_joints(&self) -> usize {
        self.count_segments().saturating_sub(1)
    }

    /// Longest active chain from the root, counted in segments
    pub fn max_depth(&self) -> usize {
        max_depth_from(&self.genes, 0)
    }

    /// Depth of a gene (root = 0)
    pub fn depth_of(&self, index: usize) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.genes.get(index)?;
        while let Some(parent) = current.parent {
            current = self.genes.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Apply continuous and structural mutation
    pub fn mutate(
        &mut self,
        mutation: &MutationConfig,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> MutationReport {
        let mut report = MutationReport {
            body_mutations: self.mutate_body(mutation, config, rng),
            brain_mutations: self.mutate_brain(mutation, config, rng),
            ..Default::default()
        };

        let add_rate = (mutation.rate * mutation.structural_fraction).clamp(0.0, 1.0);
        let remove_rate = (add_rate * mutation.removal_fraction).clamp(0.0, 1.0);

        if rng.random::<f32>() < add_rate {
            let candidates = self.growth_candidates(config);
            if let Some(&parent) = candidates.choose(rng) {
                match self.add_body_part(parent, config, rng) {
                    Ok((index, rebuild)) => {
                        report.structural = Some(StructuralChange::Added { index });
                        report.rebuild = Some(rebuild);
                    }
                    Err(err) => log::debug!("Skipped add-part mutation: {}", err),
                }
            }
        } else if rng.random::<f32>() < remove_rate {
            let candidates: Vec<usize> = self
                .active_preorder()
                .into_iter()
                .filter(|&i| i != 0)
                .collect();
            if let Some(&index) = candidates.choose(rng) {
                match self.remove_body_part(index, config, rng) {
                    Ok((deactivated, rebuild)) => {
                        report.structural = Some(StructuralChange::Removed { index, deactivated });
                        report.rebuild = Some(rebuild);
                    }
                    Err(err) => log::debug!("Skipped remove-part mutation: {}", err),
                }
            }
        }

        report
    }

    /// Perturb each body gene field with probability `rate`
    /// Returns number of fields mutated
    pub fn mutate_body(
        &mut self,
        mutation: &MutationConfig,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> usize {
        let strength = mutation.strength.abs();
        let mut mutated = 0;

        for gene in self.genes.iter_mut().filter(|g| g.active) {
            for (field, min, max) in [
                (&mut gene.width, config.min_size, config.max_size),
                (&mut gene.height, config.min_size, config.max_size),
                (&mut gene.position, 0.0, 1.0),
                (&mut gene.angle_range, 0.0, 1.0),
            ] {
                if rng.random::<f32>() < mutation.rate {
                    *field = (*field + rng.random_range(-strength..=strength)).clamp(min, max);
                    mutated += 1;
                }
            }
        }

        mutated
    }

    /// Perturb each brain parameter with probability `brain_rate`
    pub fn mutate_brain(
        &mut self,
        mutation: &MutationConfig,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> usize {
        let strength = mutation.brain_strength.abs();
        let ceiling = config.brain_ceiling.abs();
        let mut mutated = 0;

        for weight in self.brain.iter_mut() {
            if rng.random::<f32>() < mutation.brain_rate {
                *weight = (*weight + rng.random_range(-strength..=strength)).clamp(-ceiling, ceiling);
                mutated += 1;
            }
        }

        mutated
    }

    /// Active genes that can take another child
    pub fn growth_candidates(&self, config: &GenomeConfig) -> Vec<usize> {
        if self.count_segments() >= config.max_segments {
            return Vec::new();
        }
        self.active_preorder()
            .into_iter()
            .filter(|&i| self.can_grow(i, config).is_ok())
            .collect()
    }

    fn can_grow(&self, parent: usize, config: &GenomeConfig) -> Result<(), GenomeError> {
        let gene = self.genes.get(parent).ok_or(GenomeError::UnknownGene {
            index: parent,
            len: self.genes.len(),
        })?;
        if !gene.active {
            return Err(GenomeError::InactiveGene { index: parent });
        }
        if self.count_segments() >= config.max_segments {
            return Err(GenomeError::SegmentLimit {
                max: config.max_segments,
            });
        }
        let depth = self.depth_of(parent).unwrap_or(usize::MAX);
        if depth + 1 >= config.max_depth {
            return Err(GenomeError::DepthLimit { index: parent });
        }
        if free_sides(&self.genes, parent).is_empty() {
            return Err(GenomeError::NoFreeSide { index: parent });
        }
        Ok(())
    }

    /// Attach a new random segment to `parent` and rebuild the brain
    pub fn add_body_part(
        &mut self,
        parent: usize,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> Result<(usize, BrainRebuild), GenomeError> {
        self.can_grow(parent, config)?;

        let sides = free_sides(&self.genes, parent);
        let side = *sides
            .choose(rng)
            .ok_or(GenomeError::NoFreeSide { index: parent })?;
        let gene = random_child(parent, side, config, rng);
        self.genes.push(gene);
        let index = self.genes.len() - 1;

        let rebuild = self.rebuild_brain(config, rng);
        log::debug!(
            "Added segment {} to {} ({:?}); brain {} -> {}",
            index,
            parent,
            side,
            rebuild.old_size,
            rebuild.new_size
        );
        Ok((index, rebuild))
    }

    /// Deactivate a segment and its whole subtree, then rebuild the brain
    /// Returns the number of genes deactivated
    pub fn remove_body_part(
        &mut self,
        index: usize,
        config: &GenomeConfig,
        rng: &mut impl Rng,
    ) -> Result<(usize, BrainRebuild), GenomeError> {
        let gene = self.genes.get(index).ok_or(GenomeError::UnknownGene {
            index,
            len: self.genes.len(),
        })?;
        if gene.is_root() {
            return Err(GenomeError::RootRemoval);
        }
        if !gene.active {
            return Err(GenomeError::InactiveGene { index });
        }

        let deactivated = deactivate_subtree(&mut self.genes, index);
        let rebuild = self.rebuild_brain(config, rng);
        log::debug!(
            "Removed segment {} ({} genes); brain {} -> {}",
            index,
            deactivated,
            rebuild.old_size,
            rebuild.new_size
        );
        Ok((deactivated, rebuild))
    }

    /// Reallocate the brain buffer for the current body
    ///
    /// The overlapping prefix of the old parameters is kept; any new trailing
    /// parameters are drawn from `±brain_init_range`.
    pub fn rebuild_brain(&mut self, config: &GenomeConfig, rng: &mut impl Rng) -> BrainRebuild {
        let old_config = self.brain_config;
        let old_size = self.brain.len();
        let new_config = calculate_brain_config(&self.genes, config);
        let new_size = new_config.required_parameter_size();
        let preserved = old_size.min(new_size);

        let mut brain = Vec::with_capacity(new_size);
        brain.extend_from_slice(&self.brain[..preserved]);
        brain.extend(
            (preserved..new_size)
                .map(|_| rng.random_range(-config.brain_init_range..=config.brain_init_range)),
        );

        self.brain = brain;
        self.brain_config = new_config;

        BrainRebuild {
            old_config,
            new_config,
            old_size,
            new_size,
            preserved,
        }
    }
}

/// Controller shape implied by a body
///
/// Inputs: one clock, one angle per joint, two velocity components per
/// segment. Outputs: one target angle per joint, one friction per segment.
pub fn calculate_brain_config(genes: &[BodyPartGene], config: &GenomeConfig) -> BrainConfig {
    let segments = count_active(genes, 0);
    let joints = segments.saturating_sub(1);
    let hidden = (segments * config.hidden_per_segment).min(config.max_hidden);
    BrainConfig::new(1 + joints + 2 * segments, hidden, joints + segments)
}

fn children_of(genes: &[BodyPartGene], index: usize) -> impl Iterator<Item = usize> + '_ {
    genes
        .iter()
        .enumerate()
        .filter(move |(_, g)| g.active && g.parent == Some(index))
        .map(|(i, _)| i)
}

fn count_active(genes: &[BodyPartGene], index: usize) -> usize {
    match genes.get(index) {
        Some(gene) if gene.active => {
            1 + children_of(genes, index)
                .map(|child| count_active(genes, child))
                .sum::<usize>()
        }
        _ => 0,
    }
}

fn max_depth_from(genes: &[BodyPartGene], index: usize) -> usize {
    match genes.get(index) {
        Some(gene) if gene.active => {
            1 + children_of(genes, index)
                .map(|child| max_depth_from(genes, child))
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn free_sides(genes: &[BodyPartGene], index: usize) -> Vec<AttachSide> {
    let Some(gene) = genes.get(index) else {
        return Vec::new();
    };
    AttachSide::allowed(gene.is_root())
        .iter()
        .copied()
        .filter(|&side| !children_of(genes, index).any(|c| genes[c].side == Some(side)))
        .collect()
}

fn deactivate_subtree(genes: &mut [BodyPartGene], index: usize) -> usize {
    let children: Vec<usize> = children_of(genes, index).collect();
    let mut count = 0;
    for child in children {
        count += deactivate_subtree(genes, child);
    }
    genes[index].active = false;
    count + 1
}

fn random_size(config: &GenomeConfig, rng: &mut impl Rng) -> f32 {
    rng.random_range(config.min_size..=config.max_size)
}

fn random_in(range: (f32, f32), rng: &mut impl Rng) -> f32 {
    let (lo, hi) = if range.0 <= range.1 {
        range
    } else {
        (range.1, range.0)
    };
    rng.random_range(lo..=hi).clamp(0.0, 1.0)
}

fn random_child(
    parent: usize,
    side: AttachSide,
    config: &GenomeConfig,
    rng: &mut impl Rng,
) -> BodyPartGene {
    BodyPartGene {
        width: random_size(config, rng),
        height: random_size(config, rng),
        active: true,
        parent: Some(parent),
        side: Some(side),
        position: random_in(config.position_range, rng),
        angle_range: random_in(config.angle_range_range, rng),
    }
}

fn grow(
    genes: &mut Vec<BodyPartGene>,
    index: usize,
    depth: usize,
    config: &GenomeConfig,
    rng: &mut impl Rng,
) {
    if depth + 1 >= config.max_depth {
        return;
    }

    let max_attempts = config.max_child_attempts.saturating_sub(depth).max(1);
    let attempts = rng.random_range(1..=max_attempts);
    let accept = config.branch_probability * config.branch_decay.powi(depth as i32);

    for _ in 0..attempts {
        if count_active(genes, 0) >= config.max_segments {
            return;
        }
        if rng.random::<f32>() >= accept {
            continue;
        }
        let sides = free_sides(genes, index);
        let Some(&side) = sides.choose(rng) else {
            return;
        };
        genes.push(random_child(index, side, config, rng));
        let child = genes.len() - 1;
        grow(genes, child, depth + 1, config, rng);
    }
}
