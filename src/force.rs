//! Fruchterman-Reingold force-directed layout in 3D.
//!
//! Every iteration runs three phases over dense per-state arrays:
//! - repulsion between all pairs of states (Barnes-Hut or exact)
//! - attraction along every recorded adjacency entry
//! - integration: each state moves along its net force by at most the current
//!   temperature, which then cools geometrically
//!
//! With `Execution::Parallel` each phase is a rayon pass over the states.
//! Every state's force is computed by reading shared positions and writing only
//! its own slot, so the parallel passes need no locking.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::board::PuzzleState;
use crate::error::LayoutError;
use crate::layout::{Execution, LayoutConfig, LayoutStrategy, PositionMap, Repulsion};
use crate::node::NodeMap;
use crate::spatial::MIN_DISTANCE;

/// Where a `ForceLayout` is in its life cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
    /// No graph loaded yet.
    Uninitialized,
    /// Initial positions assigned, no iteration run.
    Initialized,
    Iterating,
    /// Iteration budget spent or temperature below the minimum.
    Done,
}

/// Adjacency in compressed-row form: every recorded edge appears in the lists
/// of both of its endpoints.
#[derive(Clone, Debug, Default)]
struct Incidence {
    offsets: Vec<usize>,
    neighbors: Vec<u32>,
}

impl Incidence {
    fn build(node_count: usize, edges: &[(u32, u32)]) -> Self {
        let mut counts = vec![0usize; node_count];
        for &(a, b) in edges {
            counts[a as usize] += 1;
            counts[b as usize] += 1;
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        for count in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + count);
        }

        let mut cursor = offsets[..node_count].to_vec();
        let mut neighbors = vec![0u32; edges.len() * 2];
        for &(a, b) in edges {
            neighbors[cursor[a as usize]] = b;
            cursor[a as usize] += 1;
            neighbors[cursor[b as usize]] = a;
            cursor[b as usize] += 1;
        }

        Self { offsets, neighbors }
    }

    fn of(&self, node: usize) -> &[u32] {
        &self.neighbors[self.offsets[node]..self.offsets[node + 1]]
    }
}

/// Attraction felt by `node` towards `other`, half of the edge's `d^2 / k`.
#[inline]
fn half_attraction(node: Vec3, other: Vec3, k: f32) -> Vec3 {
    let delta = node - other;
    let distance = delta.length().max(MIN_DISTANCE);
    -delta.normalize_or_zero() * (distance * distance / k) * 0.5
}

/// Exact repulsion between two states, `k^2 / d` along their separation.
#[inline]
fn pairwise_repulsion(node: Vec3, other: Vec3, k: f32) -> Vec3 {
    let delta = node - other;
    let distance = delta.length().max(MIN_DISTANCE);
    delta.normalize_or_zero() * (k * k / distance)
}

/// Net force clamped to `temperature` in magnitude.
#[inline]
fn displacement(force: Vec3, temperature: f32) -> Vec3 {
    let magnitude = force.length();
    if magnitude > 0.0 && magnitude.is_finite() {
        force / magnitude * magnitude.min(temperature)
    } else {
        Vec3::ZERO
    }
}

/// Stepwise force-directed simulation over one node map.
#[derive(Clone, Debug)]
pub struct ForceLayout<const N: usize> {
    config: LayoutConfig,
    phase: LayoutPhase,
    states: Vec<PuzzleState<N>>,
    positions: Vec<Vec3>,
    forces: Vec<Vec3>,
    edges: Vec<(u32, u32)>,
    incidence: Incidence,
    temperature: f32,
    iteration: usize,
}

impl<const N: usize> ForceLayout<N> {
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let temperature = config.initial_temperature;
        Ok(Self {
            config,
            phase: LayoutPhase::Uninitialized,
            states: Vec::new(),
            positions: Vec::new(),
            forces: Vec::new(),
            edges: Vec::new(),
            incidence: Incidence::default(),
            temperature,
            iteration: 0,
        })
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Iterations run so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Loads `nodes` and assigns seeded random starting positions inside a cube
    /// of `initial_area_size` centred on the origin. `root` is pinned to the
    /// origin when `center_root` is set. Resets any previous run.
    pub fn initialize(&mut self, nodes: &NodeMap<N>, root: &PuzzleState<N>) {
        let half = self.config.initial_area_size * 0.5;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.states = nodes.keys().copied().collect();
        self.positions = self
            .states
            .iter()
            .map(|state| {
                let random = Vec3::new(
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                    rng.gen_range(-half..half),
                );
                if self.config.center_root && state == root {
                    Vec3::ZERO
                } else {
                    random
                }
            })
            .collect();
        self.forces = vec![Vec3::ZERO; self.states.len()];

        // entries pointing outside the map carry no force
        self.edges = nodes
            .values()
            .enumerate()
            .flat_map(|(index, data)| {
                data.adjacent
                    .iter()
                    .filter_map(move |neighbor| {
                        nodes.get_index_of(neighbor).map(|other| (index as u32, other as u32))
                    })
            })
            .collect();
        self.incidence = match self.config.execution {
            Execution::Parallel => Incidence::build(self.states.len(), &self.edges),
            Execution::Sequential => Incidence::default(),
        };

        self.temperature = self.config.initial_temperature;
        self.iteration = 0;
        self.phase = LayoutPhase::Initialized;
        debug!(
            states = self.states.len(),
            edges = self.edges.len(),
            "force layout initialized"
        );
    }

    /// Runs one iteration. Returns `false` when nothing ran because the layout
    /// is uninitialized or already done.
    pub fn step(&mut self) -> bool {
        match self.phase {
            LayoutPhase::Uninitialized | LayoutPhase::Done => return false,
            LayoutPhase::Initialized => self.phase = LayoutPhase::Iterating,
            LayoutPhase::Iterating => {}
        }
        if self.states.is_empty() || self.config.max_iterations == 0 {
            self.finish();
            return false;
        }

        match self.config.execution {
            Execution::Sequential => self.iterate_sequential(),
            Execution::Parallel => self.iterate_parallel(),
        }

        self.iteration += 1;
        debug!(
            iteration = self.iteration,
            temperature = self.temperature,
            "layout iteration"
        );
        self.temperature *= self.config.cooling_rate;

        if self.iteration >= self.config.max_iterations
            || self.temperature < self.config.min_temperature
        {
            self.finish();
        }
        true
    }

    /// Iterates until done and returns the number of iterations run.
    pub fn run(&mut self) -> usize {
        while self.step() {}
        self.iteration
    }

    /// Current position of every state, in node-map order.
    pub fn positions(&self) -> PositionMap<N> {
        self.states
            .iter()
            .copied()
            .zip(self.positions.iter().copied())
            .collect()
    }

    fn finish(&mut self) {
        self.phase = LayoutPhase::Done;
        info!(
            states = self.states.len(),
            iterations = self.iteration,
            temperature = self.temperature,
            "force layout finished"
        );
    }

    fn iterate_sequential(&mut self) {
        let k = self.config.ideal_distance;
        let positions = &self.positions;
        let forces = &mut self.forces;
        forces.fill(Vec3::ZERO);

        match self.config.repulsion {
            Repulsion::BarnesHut => {
                let index = self.config.octree_backend.build(positions);
                for (force, &position) in forces.iter_mut().zip(positions) {
                    *force += index.force_on(position, k, self.config.theta);
                }
            }
            Repulsion::Naive => {
                for i in 0..positions.len() {
                    for j in i + 1..positions.len() {
                        let force = pairwise_repulsion(positions[i], positions[j], k);
                        forces[i] += force;
                        forces[j] -= force;
                    }
                }
            }
        }

        for &(a, b) in &self.edges {
            let (a, b) = (a as usize, b as usize);
            forces[a] += half_attraction(positions[a], positions[b], k);
            forces[b] += half_attraction(positions[b], positions[a], k);
        }

        let temperature = self.temperature;
        for (position, &force) in self.positions.iter_mut().zip(self.forces.iter()) {
            *position += displacement(force, temperature);
        }
    }

    fn iterate_parallel(&mut self) {
        let k = self.config.ideal_distance;
        let theta = self.config.theta;
        let batch = self.config.batch_size;
        let positions = &self.positions;
        let incidence = &self.incidence;

        match self.config.repulsion {
            Repulsion::BarnesHut => {
                let index = self.config.octree_backend.build(positions);
                self.forces
                    .par_iter_mut()
                    .with_min_len(batch)
                    .enumerate()
                    .for_each(|(i, force)| *force = index.force_on(positions[i], k, theta));
            }
            Repulsion::Naive => {
                self.forces
                    .par_iter_mut()
                    .with_min_len(batch)
                    .enumerate()
                    .for_each(|(i, force)| {
                        *force = positions
                            .iter()
                            .enumerate()
                            .filter(|&(j, _)| j != i)
                            .map(|(_, &other)| pairwise_repulsion(positions[i], other, k))
                            .sum();
                    });
            }
        }

        self.forces
            .par_iter_mut()
            .with_min_len(batch)
            .enumerate()
            .for_each(|(i, force)| {
                for &other in incidence.of(i) {
                    *force += half_attraction(positions[i], positions[other as usize], k);
                }
            });

        let temperature = self.temperature;
        self.positions
            .par_iter_mut()
            .zip(self.forces.par_iter())
            .with_min_len(batch)
            .for_each(|(position, &force)| *position += displacement(force, temperature));
    }
}

/// `LayoutStrategy` that runs a `ForceLayout` to completion.
#[derive(Clone, Debug, Default)]
pub struct ForceDirectedLayout {
    pub config: LayoutConfig,
}

impl ForceDirectedLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }
}

impl<const N: usize> LayoutStrategy<N> for ForceDirectedLayout {
    fn layout(
        &self,
        nodes: &NodeMap<N>,
        center: &PuzzleState<N>,
    ) -> Result<PositionMap<N>, LayoutError> {
        let mut engine = ForceLayout::new(self.config.clone())?;
        engine.initialize(nodes, center);
        engine.run();
        Ok(engine.positions())
    }
}
