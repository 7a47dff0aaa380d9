use std::collections::{HashMap, HashSet};

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::controller::{LayoutEngine, Point, SimulationConfig};
use crate::graph::{GraphSnapshot, Node};
use crate::util::stable_pair;

use super::super::{LayoutEdge, LayoutGraph, LayoutNode, PhysicsScratch, ViewScratch};

impl LayoutGraph {
    pub(in crate::app) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index_by_id: HashMap::new(),
            config: SimulationConfig::default(),
            alpha: 0.0,
            alpha_target: 0.0,
            revision: 0,
            physics_scratch: PhysicsScratch {
                positions: Vec::new(),
                forces: Vec::new(),
                degree: Vec::new(),
                walk_stack: Vec::new(),
            },
            view_scratch: ViewScratch {
                screen_positions: Vec::new(),
                screen_radii: Vec::new(),
                visible_indices: Vec::new(),
                visible_mask: Vec::new(),
            },
        }
    }

    pub(in crate::app) fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    fn make_layout_node(node: &Node) -> LayoutNode {
        let (jx, jy) = stable_pair(&node.id);
        LayoutNode {
            id: node.id.clone(),
            label: node.name.clone(),
            node_type: node.node_type,
            world_pos: vec2(jx, jy) * 100.0,
            velocity: Vec2::ZERO,
            pinned: false,
            held: false,
        }
    }

    fn collect_edges(
        snapshot: &GraphSnapshot,
        index_by_id: &HashMap<String, usize>,
    ) -> Vec<LayoutEdge> {
        let mut edges = Vec::with_capacity(snapshot.links.len());
        let mut seen = HashSet::with_capacity(snapshot.links.len());
        for link in &snapshot.links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&link.source),
                index_by_id.get(&link.target),
            ) else {
                continue;
            };
            if source == target || !seen.insert((source, target)) {
                continue;
            }

            edges.push(LayoutEdge {
                source,
                target,
                is_group_link: link.is_group_link,
            });
        }
        edges
    }
}

impl LayoutEngine for LayoutGraph {
    /// Replaces the node and edge set, keeping layout state for every id that
    /// survives the transition.
    fn render(&mut self, snapshot: &GraphSnapshot) {
        self.revision = self.revision.wrapping_add(1);

        let mut prior_nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect::<HashMap<_, _>>();

        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());
        for node in &snapshot.nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }

            let layout_node = match prior_nodes.remove(&node.id) {
                Some(mut prior) => {
                    prior.label = node.name.clone();
                    prior.node_type = node.node_type;
                    prior
                }
                None => Self::make_layout_node(node),
            };
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(layout_node);
        }

        self.edges = Self::collect_edges(snapshot, &index_by_id);
        self.nodes = nodes;
        self.index_by_id = index_by_id;
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "layout graph rebuilt"
        );
    }

    fn start_simulation(&mut self, snapshot: &GraphSnapshot, config: &SimulationConfig) {
        self.config = *config;
        self.alpha = 1.0;
        debug!(
            nodes = snapshot.nodes.len(),
            link_distance = config.link_distance,
            repulsion = config.repulsion,
            "simulation restarted"
        );
    }

    fn place_node(&mut self, id: &str, point: Point) {
        if let Some(index) = self.node_index(id) {
            let node = &mut self.nodes[index];
            node.world_pos = vec2(point.x, point.y);
            node.velocity = Vec2::ZERO;
        }
    }

    fn pin_nodes(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(index) = self.node_index(id) {
                self.nodes[index].pinned = true;
            }
        }
    }

    fn unpin_all(&mut self) {
        for node in &mut self.nodes {
            node.pinned = false;
        }
    }
}
