use eframe::egui::{self, Align, Color32, Layout, RichText, Sense, Ui, vec2};

use crate::graph::{NodeType, group_node_id};

use super::super::ViewModel;
use super::super::render_utils::node_color;

const LEGEND: [NodeType; 4] = [
    NodeType::Root,
    NodeType::Local,
    NodeType::ThirdParty,
    NodeType::Group,
];

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight nodes by name without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            let toggle_label = if self.controller.is_grouped() {
                "Ungroup nodes"
            } else {
                "Group nodes"
            };
            if ui
                .button(toggle_label)
                .on_hover_text("Collapse nodes sharing a path prefix into one group node.")
                .clicked()
            {
                self.controller.toggle_grouping();
                self.sync_selection();
            }

            let collapse = ui
                .add_enabled(
                    self.controller.is_grouped(),
                    egui::Button::new("Collapse groups"),
                )
                .on_hover_text("Fold every expanded group back into its group node.");
            if collapse.clicked() {
                self.controller.collapse_groups();
                self.sync_selection();
            }

            if ui.button("Reset view").clicked() {
                self.reset_view();
            }
        });

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Keep simulating layout forces while viewing the graph.");

        self.draw_simulation_sliders(ui);

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for node_type in LEGEND {
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(14.0, 14.0), Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 6.0, node_color(node_type));
                ui.label(node_type.label());
            });
        }

        if self.controller.is_grouped() {
            ui.separator();
            self.draw_group_list(ui);
        }
    }

    fn draw_simulation_sliders(&mut self, ui: &mut Ui) {
        let mut config = self.controller.config();
        let mut repulsion = -config.repulsion;
        let mut changed = false;

        egui::CollapsingHeader::new("Simulation")
            .default_open(true)
            .show(ui, |ui| {
                changed |= ui
                    .add(
                        egui::Slider::new(&mut config.link_distance, 10.0..=400.0)
                            .text("Link length"),
                    )
                    .on_hover_text("Preferred distance between linked nodes.")
                    .changed();
                changed |= ui
                    .add(
                        egui::Slider::new(&mut config.link_strength, 0.0..=1.0)
                            .text("Link force"),
                    )
                    .on_hover_text("How strongly links pull toward their preferred length.")
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut repulsion, 0.0..=5000.0).text("Repel force"))
                    .on_hover_text("How strongly nodes push away from each other.")
                    .changed();
                changed |= ui
                    .add(
                        egui::Slider::new(&mut config.center_strength, 0.0..=0.2)
                            .text("Center force"),
                    )
                    .on_hover_text("How strongly the layout drifts back to the centre.")
                    .changed();
            });

        if changed {
            config.repulsion = -repulsion;
            self.controller.set_simulation(config);
        }
    }

    fn draw_group_list(&mut self, ui: &mut Ui) {
        let mut selected_id = None;

        egui::CollapsingHeader::new(format!("Groups ({})", self.controller.groups().len()))
            .default_open(false)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("group_list_scroll")
                    .max_height(220.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        let snapshot = self.controller.snapshot();
                        for group in self.controller.groups().iter() {
                            let node_id = group_node_id(&group.prefix);
                            let collapsed = snapshot.contains_node(&node_id);
                            let prefix = if group.prefix.is_empty() {
                                "(top level)"
                            } else {
                                group.prefix.as_str()
                            };
                            let is_selected = self.selected.as_deref() == Some(node_id.as_str());

                            ui.horizontal(|ui| {
                                let label = if collapsed {
                                    RichText::new(prefix)
                                } else {
                                    RichText::new(prefix).color(Color32::from_gray(150))
                                };
                                if ui.selectable_label(is_selected, label).clicked() && collapsed {
                                    selected_id = Some(node_id.clone());
                                }
                                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                    ui.label(format!("{} members", group.members.len()));
                                });
                            });
                        }
                    });
            });

        if let Some(id) = selected_id {
            self.set_selected(Some(id));
        }
    }
}
