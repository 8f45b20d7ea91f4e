//! Minimum-error seam computation over overlap bands
//!
//! The overlap between an already-placed patch A and a candidate patch B is
//! treated as a flow network: each voxel is a node, axis-adjacent voxels are
//! joined by arcs whose capacity is the summed pixel-difference energy
//! |A - B| of their endpoints, and the boundary slices along the cut axis
//! carry implicit infinite affinity to the source (old side, kept as A) and
//! the sink (new side, kept as B). The minimum s–t cut is found with the
//! Boykov–Kolmogorov max-flow algorithm over the implicit grid adjacency,
//! so memory stays linear in the band size and no explicit edge list is
//! materialized.

use crate::io::error::{QuiltingError, Result, invalid_parameter};
use ndarray::{ArrayD, IxDyn};
use num_traits::Float;
use std::collections::VecDeque;

const TREE_FREE: u8 = 0;
const TREE_SOURCE: u8 = 1;
const TREE_SINK: u8 = 2;

const NO_PARENT: usize = usize::MAX;

/// Neighbour direction opposite to `direction`
const fn opposite(direction: usize) -> usize {
    direction ^ 1
}

/// Implicit flow network over the voxels of an overlap band
///
/// Arcs are addressed as (node, direction) where direction `2d` points to
/// the negative neighbour along axis `d` and `2d + 1` to the positive one.
struct FlowNetwork {
    shape: Vec<usize>,
    strides: Vec<usize>,
    directions: usize,
    capacities: Vec<f64>,
}

impl FlowNetwork {
    /// Build residual capacities from per-voxel mismatch energies
    fn new(shape: &[usize], energies: &[f64]) -> Self {
        let rank = shape.len();
        let mut strides = vec![1; rank];
        for axis in (0..rank.saturating_sub(1)).rev() {
            let next = strides.get(axis + 1).copied().unwrap_or(1)
                * shape.get(axis + 1).copied().unwrap_or(1);
            if let Some(stride) = strides.get_mut(axis) {
                *stride = next;
            }
        }

        let directions = 2 * rank;
        let node_count = energies.len();
        let mut network = Self {
            shape: shape.to_vec(),
            strides,
            directions,
            capacities: vec![0.0; node_count * directions],
        };

        for node in 0..node_count {
            let own = energies.get(node).copied().unwrap_or(0.0);
            for direction in 0..directions {
                if let Some(neighbor) = network.neighbor(node, direction) {
                    let other = energies.get(neighbor).copied().unwrap_or(0.0);
                    if let Some(slot) = network.capacities.get_mut(node * directions + direction) {
                        *slot = own + other;
                    }
                }
            }
        }

        network
    }

    /// Coordinate of a node along one axis
    fn axis_coord(&self, node: usize, axis: usize) -> usize {
        let stride = self.strides.get(axis).copied().unwrap_or(1);
        let extent = self.shape.get(axis).copied().unwrap_or(1);
        (node / stride) % extent
    }

    /// Adjacent node in a direction, `None` at the band boundary
    fn neighbor(&self, node: usize, direction: usize) -> Option<usize> {
        let axis = direction / 2;
        let stride = self.strides.get(axis).copied().unwrap_or(1);
        let extent = self.shape.get(axis).copied().unwrap_or(1);
        let coord = self.axis_coord(node, axis);

        if direction % 2 == 0 {
            (coord > 0).then(|| node - stride)
        } else {
            (coord + 1 < extent).then(|| node + stride)
        }
    }

    /// Residual capacity of an arc
    fn capacity(&self, node: usize, direction: usize) -> f64 {
        self.capacities
            .get(node * self.directions + direction)
            .copied()
            .unwrap_or(0.0)
    }

    /// Add `delta` to an arc's residual capacity
    fn adjust(&mut self, node: usize, direction: usize, delta: f64) {
        if let Some(slot) = self.capacities.get_mut(node * self.directions + direction) {
            *slot += delta;
        }
    }
}

/// Boykov–Kolmogorov search state: two growing trees plus repair queues
struct SeamSolver {
    network: FlowNetwork,
    axis: usize,
    tree: Vec<u8>,
    parent: Vec<usize>,
    /// Direction from a child node to its parent
    parent_direction: Vec<u8>,
    active: VecDeque<usize>,
    orphans: Vec<usize>,
}

impl SeamSolver {
    fn new(network: FlowNetwork, axis: usize) -> Self {
        let node_count = network.shape.iter().product();
        let last = network.shape.get(axis).copied().unwrap_or(1) - 1;

        let mut tree = vec![TREE_FREE; node_count];
        let mut active = VecDeque::new();
        for node in 0..node_count {
            let coord = network.axis_coord(node, axis);
            if coord == 0 {
                if let Some(slot) = tree.get_mut(node) {
                    *slot = TREE_SOURCE;
                }
                active.push_back(node);
            } else if coord == last {
                if let Some(slot) = tree.get_mut(node) {
                    *slot = TREE_SINK;
                }
                active.push_back(node);
            }
        }

        Self {
            network,
            axis,
            tree,
            parent: vec![NO_PARENT; node_count],
            parent_direction: vec![0; node_count],
            active,
            orphans: Vec::new(),
        }
    }

    fn tree_of(&self, node: usize) -> u8 {
        self.tree.get(node).copied().unwrap_or(TREE_FREE)
    }

    fn parent_of(&self, node: usize) -> usize {
        self.parent.get(node).copied().unwrap_or(NO_PARENT)
    }

    /// Whether a node is a valid root of its tree (terminal slice member)
    fn is_root(&self, node: usize) -> bool {
        let coord = self.network.axis_coord(node, self.axis);
        match self.tree_of(node) {
            TREE_SOURCE => coord == 0,
            TREE_SINK => {
                let extent = self.network.shape.get(self.axis).copied().unwrap_or(1);
                coord == extent - 1
            }
            _ => false,
        }
    }

    /// Whether a node's parent chain still reaches a terminal slice
    fn has_root(&self, node: usize) -> bool {
        let mut current = node;
        loop {
            let parent = self.parent_of(current);
            if parent == NO_PARENT {
                return self.is_root(current);
            }
            current = parent;
        }
    }

    /// Residual capacity feeding `node` from its tree's direction of flow
    fn feed_capacity(&self, node: usize, donor: usize, direction_to_donor: usize) -> f64 {
        if self.tree_of(node) == TREE_SOURCE {
            // Flow runs donor -> node inside the source tree
            self.network.capacity(donor, opposite(direction_to_donor))
        } else {
            // Flow runs node -> donor inside the sink tree
            self.network.capacity(node, direction_to_donor)
        }
    }

    /// Grow both trees until they touch; returns the bridging arc (source
    /// node, sink node, direction from source side) or `None` at completion
    fn grow(&mut self) -> Option<(usize, usize, usize)> {
        while let Some(&node) = self.active.front() {
            let tree = self.tree_of(node);
            if tree == TREE_FREE {
                self.active.pop_front();
                continue;
            }

            for direction in 0..self.network.directions {
                let Some(next) = self.network.neighbor(node, direction) else {
                    continue;
                };

                let residual = if tree == TREE_SOURCE {
                    self.network.capacity(node, direction)
                } else {
                    self.network.capacity(next, opposite(direction))
                };
                if residual <= 0.0 {
                    continue;
                }

                let next_tree = self.tree_of(next);
                if next_tree == TREE_FREE {
                    if let Some(slot) = self.tree.get_mut(next) {
                        *slot = tree;
                    }
                    if let Some(slot) = self.parent.get_mut(next) {
                        *slot = node;
                    }
                    if let Some(slot) = self.parent_direction.get_mut(next) {
                        *slot = opposite(direction) as u8;
                    }
                    self.active.push_back(next);
                } else if next_tree != tree {
                    return if tree == TREE_SOURCE {
                        Some((node, next, direction))
                    } else {
                        Some((next, node, opposite(direction)))
                    };
                }
            }

            self.active.pop_front();
        }

        None
    }

    /// Push flow along the found path and orphan saturated tree arcs
    fn augment(&mut self, source_node: usize, sink_node: usize, bridge_direction: usize) {
        let mut source_path = Vec::new();
        let mut current = source_node;
        while self.parent_of(current) != NO_PARENT {
            source_path.push(current);
            current = self.parent_of(current);
        }

        let mut sink_path = Vec::new();
        current = sink_node;
        while self.parent_of(current) != NO_PARENT {
            sink_path.push(current);
            current = self.parent_of(current);
        }

        let mut bottleneck = self.network.capacity(source_node, bridge_direction);
        for &node in &source_path {
            let parent = self.parent_of(node);
            let down = opposite(self.parent_direction.get(node).copied().unwrap_or(0) as usize);
            bottleneck = bottleneck.min(self.network.capacity(parent, down));
        }
        for &node in &sink_path {
            let up = self.parent_direction.get(node).copied().unwrap_or(0) as usize;
            bottleneck = bottleneck.min(self.network.capacity(node, up));
        }

        self.network
            .adjust(source_node, bridge_direction, -bottleneck);
        if let Some(across) = self.network.neighbor(source_node, bridge_direction) {
            self.network
                .adjust(across, opposite(bridge_direction), bottleneck);
        }

        for &node in &source_path {
            let parent = self.parent_of(node);
            let up = self.parent_direction.get(node).copied().unwrap_or(0) as usize;
            let down = opposite(up);
            self.network.adjust(parent, down, -bottleneck);
            self.network.adjust(node, up, bottleneck);
            if self.network.capacity(parent, down) <= 0.0 {
                if let Some(slot) = self.parent.get_mut(node) {
                    *slot = NO_PARENT;
                }
                self.orphans.push(node);
            }
        }

        for &node in &sink_path {
            let up = self.parent_direction.get(node).copied().unwrap_or(0) as usize;
            let parent = self.parent_of(node);
            self.network.adjust(node, up, -bottleneck);
            self.network.adjust(parent, opposite(up), bottleneck);
            if self.network.capacity(node, up) <= 0.0 {
                if let Some(slot) = self.parent.get_mut(node) {
                    *slot = NO_PARENT;
                }
                self.orphans.push(node);
            }
        }
    }

    /// Reattach or free orphaned nodes until both trees are consistent
    fn adopt(&mut self) {
        while let Some(orphan) = self.orphans.pop() {
            let tree = self.tree_of(orphan);
            let mut adopted = false;

            for direction in 0..self.network.directions {
                let Some(candidate) = self.network.neighbor(orphan, direction) else {
                    continue;
                };
                if self.tree_of(candidate) != tree {
                    continue;
                }
                if self.feed_capacity(orphan, candidate, direction) <= 0.0 {
                    continue;
                }
                if !self.has_root(candidate) {
                    continue;
                }

                if let Some(slot) = self.parent.get_mut(orphan) {
                    *slot = candidate;
                }
                if let Some(slot) = self.parent_direction.get_mut(orphan) {
                    *slot = direction as u8;
                }
                adopted = true;
                break;
            }

            if adopted {
                continue;
            }

            for direction in 0..self.network.directions {
                let Some(neighbor) = self.network.neighbor(orphan, direction) else {
                    continue;
                };
                if self.tree_of(neighbor) != tree {
                    continue;
                }
                if self.feed_capacity(orphan, neighbor, direction) > 0.0 {
                    self.active.push_back(neighbor);
                }
                if self.parent_of(neighbor) == orphan {
                    if let Some(slot) = self.parent.get_mut(neighbor) {
                        *slot = NO_PARENT;
                    }
                    self.orphans.push(neighbor);
                }
            }

            if let Some(slot) = self.tree.get_mut(orphan) {
                *slot = TREE_FREE;
            }
        }
    }

    /// Run to completion and report which nodes end on the source side
    fn solve(mut self) -> Vec<u8> {
        while let Some((source_node, sink_node, direction)) = self.grow() {
            self.augment(source_node, sink_node, direction);
            self.adopt();
        }

        self.tree
            .iter()
            .map(|&t| u8::from(t == TREE_SOURCE))
            .collect()
    }
}

/// Minimum-error boundary between two aligned overlap arrays
///
/// Returns a selector of the same shape where 1 marks "keep A" (the
/// already-placed side) and 0 marks "keep B" (the candidate side). The
/// first slice along `axis` is forced to A, the last slice to B. Pairs
/// involving a non-finite value contribute zero energy, and when every
/// arc carries equal energy the cut degenerates to exactly the first
/// slice, so identical inputs keep only the forced boundary.
///
/// # Errors
///
/// Returns a configuration error when the operand shapes differ or `axis`
/// is out of range.
pub fn min_cut<F: Float>(a: &ArrayD<F>, b: &ArrayD<F>, axis: usize) -> Result<ArrayD<u8>> {
    if a.shape() != b.shape() {
        return Err(QuiltingError::ShapeMismatch {
            context: "seam operands",
            expected: a.shape().to_vec(),
            found: b.shape().to_vec(),
        });
    }
    if axis >= a.ndim() {
        return Err(invalid_parameter(
            "axis",
            &axis,
            &format!("seam axis must be below rank {}", a.ndim()),
        ));
    }

    let shape = a.shape().to_vec();
    let node_count: usize = shape.iter().product();
    if node_count == 0 {
        return Ok(ArrayD::zeros(IxDyn(&shape)));
    }

    let extent = shape.get(axis).copied().unwrap_or(1);
    if extent <= 1 {
        return Ok(ArrayD::ones(IxDyn(&shape)));
    }

    let energies: Vec<f64> = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let difference = (x - y).abs();
            if difference.is_finite() {
                difference.to_f64().unwrap_or(0.0)
            } else {
                0.0
            }
        })
        .collect();

    let network = FlowNetwork::new(&shape, &energies);
    let selector = SeamSolver::new(network, axis).solve();

    ArrayD::from_shape_vec(IxDyn(&shape), selector)
        .map_err(|err| invalid_parameter("selector", &"shape", &err))
}
