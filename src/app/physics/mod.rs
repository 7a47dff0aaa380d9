mod forces;
mod quadtree;

use eframe::egui::Vec2;

use super::LayoutGraph;
use forces::apply_link_forces;
use quadtree::BarnesHut;

const BARNES_HUT_THETA: f32 = 0.9;
const ALPHA_MIN: f32 = 0.001;
/// Reaches `ALPHA_MIN` from 1 in about 300 ticks.
const ALPHA_DECAY: f32 = 0.022_763_97;
const VELOCITY_DECAY: f32 = 0.4;
const DRAG_ALPHA_TARGET: f32 = 0.3;

/// Advances the layout by one tick. Returns whether the simulation is still
/// running.
pub(super) fn step_physics(graph: &mut LayoutGraph) -> bool {
    graph.alpha += (graph.alpha_target - graph.alpha) * ALPHA_DECAY;
    if graph.alpha < ALPHA_MIN {
        return false;
    }

    let node_count = graph.nodes.len();
    if node_count == 0 {
        return false;
    }

    let alpha = graph.alpha;
    let config = graph.config;
    let scratch = &mut graph.physics_scratch;

    scratch.positions.clear();
    scratch.forces.clear();
    scratch.positions.extend(graph.nodes.iter().map(|node| node.world_pos));
    scratch
        .forces
        .extend(graph.nodes.iter().map(|node| node.velocity));

    scratch.degree.clear();
    scratch.degree.resize(node_count, 0);
    for edge in &graph.edges {
        scratch.degree[edge.source] += 1;
        scratch.degree[edge.target] += 1;
    }

    // `forces` doubles as the velocity buffer for this tick.
    apply_link_forces(
        &graph.edges,
        &scratch.positions,
        &mut scratch.forces,
        &scratch.degree,
        config.link_distance,
        config.link_strength,
        alpha,
    );

    if let Some(tree) = BarnesHut::build(&scratch.positions) {
        for (index, velocity) in scratch.forces.iter_mut().enumerate() {
            let charge = tree.force_on(
                index,
                &scratch.positions,
                config.repulsion,
                BARNES_HUT_THETA,
                &mut scratch.walk_stack,
            );
            *velocity += charge * alpha;
        }
    }

    for (node, velocity) in graph.nodes.iter_mut().zip(scratch.forces.iter()) {
        if node.pinned || node.held {
            node.velocity = Vec2::ZERO;
            continue;
        }
        node.velocity = *velocity * (1.0 - VELOCITY_DECAY);
        node.world_pos += node.velocity;
    }

    apply_centering(graph, config.center_strength);
    true
}

/// Shifts free nodes so the layout's centroid drifts toward the world origin.
fn apply_centering(graph: &mut LayoutGraph, strength: f32) {
    if strength <= 0.0 || graph.nodes.is_empty() {
        return;
    }

    let mut centroid = Vec2::ZERO;
    for node in &graph.nodes {
        centroid += node.world_pos;
    }
    centroid /= graph.nodes.len() as f32;

    let shift = centroid * strength;
    for node in &mut graph.nodes {
        if !node.pinned && !node.held {
            node.world_pos -= shift;
        }
    }
}

impl LayoutGraph {
    pub(in crate::app) fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
    }

    /// Fixes a node under the pointer and keeps the simulation warm.
    pub(in crate::app) fn hold_node(&mut self, index: usize) {
        let Some(node) = self.nodes.get_mut(index) else {
            return;
        };
        node.held = true;
        node.velocity = Vec2::ZERO;
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.alpha = self.alpha.max(ALPHA_MIN);
    }

    pub(in crate::app) fn move_held(&mut self, index: usize, world: Vec2) {
        if let Some(node) = self.nodes.get_mut(index)
            && node.held
        {
            node.world_pos = world;
        }
    }

    pub(in crate::app) fn release_node(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.held = false;
        }
        self.alpha_target = 0.0;
    }
}
