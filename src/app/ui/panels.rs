use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::controller::{SimulationConfig, ViewController};
use crate::graph::GraphSnapshot;

use super::super::{LayoutGraph, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(graph: GraphSnapshot, config: SimulationConfig) -> Self {
        Self {
            controller: ViewController::new(graph, LayoutGraph::new(), config),
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: true,
            dragging: None,
            search_match_cache: None,
            visible_node_count: 0,
            visible_edge_count: 0,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source_label: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.controller.begin_frame();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("depmap");
                    ui.separator();
                    ui.label(format!("source: {source_label}"));
                    let snapshot = self.controller.snapshot();
                    ui.label(format!("nodes: {}", snapshot.nodes.len()));
                    ui.label(format!("links: {}", snapshot.links.len()));
                    if self.controller.is_grouped() {
                        ui.label(format!("groups: {}", self.controller.groups().len()));
                    }
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if !self.controller.engine().is_settled() {
                            ui.spinner().on_hover_text("Layout is still settling.");
                        }
                        ui.label(format!(
                            "in view: {} nodes, {} links",
                            self.visible_node_count, self.visible_edge_count
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading dependency graph...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }

    /// Drops the selection when a transition removed the selected node.
    pub(in crate::app) fn sync_selection(&mut self) {
        if let Some(id) = self.selected.as_deref()
            && !self.controller.snapshot().contains_node(id)
        {
            self.selected = None;
        }
    }
}
