use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};
use tracing::{info, warn};

use crate::controller::{SimulationConfig, ViewController};
use crate::graph::{GraphSnapshot, NodeType};
use crate::source::GraphSource;

mod graph;
mod physics;
mod render_utils;
mod ui;

pub struct DepMapApp {
    source: GraphSource,
    config: SimulationConfig,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphSnapshot, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphSnapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    controller: ViewController<LayoutGraph>,
    search: String,
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    live_physics: bool,
    dragging: Option<String>,
    search_match_cache: Option<SearchMatchCache>,
    visible_node_count: usize,
    visible_edge_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

/// Position-owning side of the viewer. Mirrors the current snapshot's ids
/// and edges by index and keeps per-node layout state across transitions.
struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    index_by_id: HashMap<String, usize>,
    config: SimulationConfig,
    alpha: f32,
    alpha_target: f32,
    revision: u64,
    physics_scratch: PhysicsScratch,
    view_scratch: ViewScratch,
}

struct PhysicsScratch {
    positions: Vec<Vec2>,
    forces: Vec<Vec2>,
    degree: Vec<usize>,
    walk_stack: Vec<usize>,
}

struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
}

struct LayoutNode {
    id: String,
    label: String,
    node_type: NodeType,
    world_pos: Vec2,
    velocity: Vec2,
    /// Fixed by a grouping transition until the next frame.
    pinned: bool,
    /// Fixed under the pointer while dragged.
    held: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LayoutEdge {
    source: usize,
    target: usize,
    is_group_link: bool,
}

impl DepMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: GraphSource,
        config: SimulationConfig,
    ) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            config,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: GraphSource) -> Receiver<Result<GraphSnapshot, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.load().map_err(|error| {
                warn!(source = %source.label(), "graph load failed: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: GraphSource) -> AppState {
        info!(source = %source.label(), "loading graph");
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready_state(&self, result: Result<GraphSnapshot, String>) -> AppState {
        match result {
            Ok(graph) => AppState::Ready(Box::new(ViewModel::new(graph, self.config))),
            Err(error) => AppState::Error(error),
        }
    }
}

impl eframe::App for DepMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;
        let mut retry = false;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(result),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading dependency graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dependency graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    retry = ui.button("Retry").clicked();
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source.label(), &mut reload_requested, is_reloading);
                self.config = model.controller.config();

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if retry {
            self.reload_rx = None;
            self.state = Self::start_load(self.source.clone());
            return;
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = self.ready_state(result);
        }
    }
}
