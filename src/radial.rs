//! Deterministic radial tree layout in the z = 0 plane.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use glam::Vec3;
use tracing::debug;

use crate::board::PuzzleState;
use crate::error::LayoutError;
use crate::layout::{LayoutStrategy, PositionMap, RadialConfig};
use crate::node::NodeMap;

/// Places the discovery tree rooted at the center state on concentric rings.
///
/// Each state's children fan out evenly around it at `radius_step`, starting
/// one angular step past the direction back to its own parent so that no
/// child overlaps the incoming edge. States outside the parent tree of the
/// center are left out.
#[derive(Clone, Debug, Default)]
pub struct RadialLayout {
    pub config: RadialConfig,
}

impl RadialLayout {
    pub fn new(config: RadialConfig) -> Self {
        Self { config }
    }
}

/// Wraps an angle into `[0, 2pi)`.
fn normalize_angle(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

impl<const N: usize> LayoutStrategy<N> for RadialLayout {
    fn layout(
        &self,
        nodes: &NodeMap<N>,
        center: &PuzzleState<N>,
    ) -> Result<PositionMap<N>, LayoutError> {
        self.config.validate()?;
        let radius = self.config.radius_step;
        let mut positions = PositionMap::default();
        if !nodes.contains_key(center) {
            return Ok(positions);
        }

        positions.insert(*center, Vec3::ZERO);
        let mut queue = VecDeque::from([*center]);

        while let Some(current) = queue.pop_front() {
            let Some(data) = nodes.get(&current) else {
                continue;
            };
            let origin = positions[&current];

            let children: Vec<PuzzleState<N>> = data
                .adjacent
                .iter()
                .filter(|child| !positions.contains_key(*child))
                .filter(|child| {
                    nodes.get(*child).is_some_and(|child_data| {
                        child_data.parent == Some(current) && child_data.depth == data.depth + 1
                    })
                })
                .copied()
                .collect();
            if children.is_empty() {
                continue;
            }

            let is_root = current == *center;
            let reference = if is_root {
                0.0
            } else {
                match data.parent.and_then(|parent| positions.get(&parent)) {
                    Some(&parent) => {
                        let back = parent - origin;
                        back.y.atan2(back.x)
                    }
                    None if origin != Vec3::ZERO => (-origin.y).atan2(-origin.x),
                    None => PI,
                }
            };

            let branches = children.len() + usize::from(!is_root);
            let step = TAU / branches as f32;
            let start = if is_root { reference } else { reference + step };

            for (slot, child) in children.into_iter().enumerate() {
                let angle = normalize_angle(start + step * slot as f32);
                let offset = Vec3::new(angle.cos(), angle.sin(), 0.0) * radius;
                positions.insert(child, origin + offset);
                queue.push_back(child);
            }
        }

        debug!(placed = positions.len(), states = nodes.len(), "radial layout finished");
        Ok(positions)
    }
}
