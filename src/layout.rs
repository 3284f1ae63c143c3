//! Layout strategies: turn a node map into 3D positions.

use std::hash::BuildHasherDefault;

use glam::Vec3;
use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::board::PuzzleState;
use crate::error::LayoutError;
use crate::force::ForceDirectedLayout;
use crate::node::NodeMap;
use crate::radial::RadialLayout;
use crate::spatial::OctreeBackend;

/// Position of every laid-out state, in node-map order.
pub type PositionMap<const N: usize> =
    IndexMap<PuzzleState<N>, Vec3, BuildHasherDefault<FxHasher>>;

/// A way of placing discovered states in space.
pub trait LayoutStrategy<const N: usize> {
    /// Places the states of `nodes`, treating `center` as the root.
    fn layout(
        &self,
        nodes: &NodeMap<N>,
        center: &PuzzleState<N>,
    ) -> Result<PositionMap<N>, LayoutError>;
}

/// How repulsive forces are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repulsion {
    /// Octree approximation, O(n log n) per iteration.
    #[default]
    BarnesHut,
    /// Exact pairwise summation, O(n^2) per iteration.
    Naive,
}

/// How each iteration's force phases are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    Sequential,
    /// Repulsion, attraction and integration as three parallel passes.
    Parallel,
}

/// Tunables of the force-directed layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Upper bound on simulation iterations.
    pub max_iterations: usize,
    /// Ideal edge length `k`.
    pub ideal_distance: f32,
    /// Largest displacement allowed in the first iteration.
    pub initial_temperature: f32,
    /// The simulation stops once the temperature drops below this.
    pub min_temperature: f32,
    /// Multiplier applied to the temperature after every iteration.
    pub cooling_rate: f32,
    /// Barnes-Hut accuracy; 0 disables approximation.
    pub theta: f32,
    /// Edge length of the cube initial positions are drawn from.
    pub initial_area_size: f32,
    /// Pin the root state at the origin before the first iteration.
    pub center_root: bool,
    pub repulsion: Repulsion,
    pub octree_backend: OctreeBackend,
    pub execution: Execution,
    /// Minimum number of states handled per parallel work item.
    pub batch_size: usize,
    /// Seed for the initial random placement.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ideal_distance: 10.0,
            initial_temperature: 100.0,
            min_temperature: 0.1,
            cooling_rate: 0.95,
            theta: 0.5,
            initial_area_size: 50.0,
            center_root: true,
            repulsion: Repulsion::BarnesHut,
            octree_backend: OctreeBackend::Pointer,
            execution: Execution::Sequential,
            batch_size: 32,
            seed: 42,
        }
    }
}

impl LayoutConfig {
    /// Rejects parameter combinations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let invalid = |message: String| Err(LayoutError::InvalidConfig(message));

        if !(self.ideal_distance > 0.0 && self.ideal_distance.is_finite()) {
            return invalid(format!("ideal distance must be positive, got {}", self.ideal_distance));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return invalid(format!("cooling rate must be in (0, 1], got {}", self.cooling_rate));
        }
        if !(self.initial_temperature > 0.0) {
            return invalid(format!(
                "initial temperature must be positive, got {}",
                self.initial_temperature
            ));
        }
        if !(self.min_temperature >= 0.0) {
            return invalid(format!(
                "minimum temperature must not be negative, got {}",
                self.min_temperature
            ));
        }
        if !(self.theta >= 0.0) {
            return invalid(format!("theta must not be negative, got {}", self.theta));
        }
        if !(self.initial_area_size > 0.0 && self.initial_area_size.is_finite()) {
            return invalid(format!(
                "initial area size must be positive, got {}",
                self.initial_area_size
            ));
        }
        if self.batch_size == 0 {
            return invalid("batch size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Tunables of the radial layout.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialConfig {
    /// Distance between a state and each of its children.
    pub radius_step: f32,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self { radius_step: 20.0 }
    }
}

impl RadialConfig {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.radius_step > 0.0 && self.radius_step.is_finite() {
            Ok(())
        } else {
            Err(LayoutError::InvalidConfig(format!(
                "radius step must be positive, got {}",
                self.radius_step
            )))
        }
    }
}

/// Either built-in layout, selected at runtime.
#[derive(Clone, Debug)]
pub enum LayoutKind {
    ForceDirected(LayoutConfig),
    Radial(RadialConfig),
}

impl Default for LayoutKind {
    fn default() -> Self {
        LayoutKind::ForceDirected(LayoutConfig::default())
    }
}

impl<const N: usize> LayoutStrategy<N> for LayoutKind {
    fn layout(
        &self,
        nodes: &NodeMap<N>,
        center: &PuzzleState<N>,
    ) -> Result<PositionMap<N>, LayoutError> {
        match self {
            LayoutKind::ForceDirected(config) => {
                ForceDirectedLayout::new(config.clone()).layout(nodes, center)
            }
            LayoutKind::Radial(config) => RadialLayout::new(config.clone()).layout(nodes, center),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(LayoutConfig::default().validate(), Ok(()));
        assert_eq!(RadialConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            LayoutConfig {
                ideal_distance: 0.0,
                ..LayoutConfig::default()
            },
            LayoutConfig {
                cooling_rate: 1.5,
                ..LayoutConfig::default()
            },
            LayoutConfig {
                theta: -0.1,
                ..LayoutConfig::default()
            },
            LayoutConfig {
                initial_area_size: f32::NAN,
                ..LayoutConfig::default()
            },
            LayoutConfig {
                batch_size: 0,
                ..LayoutConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(LayoutError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }

        assert!(RadialConfig { radius_step: -1.0 }.validate().is_err());
    }

    #[test]
    fn test_layout_kind_dispatch() {
        use crate::board::EightPuzzle;
        use crate::search::{BreadthFirstSearch, SearchAlgorithm};

        let root = EightPuzzle::solved();
        let unreachable: EightPuzzle = "2 1 3 / 4 5 6 / 7 8 0".parse().expect("valid board");
        let result = BreadthFirstSearch::with_depth_limit(2).search(&root, &unreachable);

        for kind in [
            LayoutKind::default(),
            LayoutKind::Radial(RadialConfig::default()),
        ] {
            let positions = kind.layout(&result.nodes, &root).expect("valid config");
            assert_eq!(positions.len(), result.nodes.len(), "{kind:?}");
            assert!(positions.values().all(|position| position.is_finite()));
        }

        let radial = LayoutKind::Radial(RadialConfig::default())
            .layout(&result.nodes, &root)
            .expect("valid config");
        assert_eq!(radial[&root], Vec3::ZERO);
    }
}
