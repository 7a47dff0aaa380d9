use eframe::egui::{self, RichText, Ui};

use crate::graph::GraphSnapshot;

use super::super::ViewModel;

struct RelatedEntry {
    id: String,
    name: String,
    via_group: bool,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node to inspect it. Clicking a group node expands it.");
            return;
        };

        let snapshot = self.controller.snapshot();
        let Some(node) = snapshot.node(&selected_id) else {
            ui.label("Selected node is not part of the current graph.");
            return;
        };

        let name = node.name.clone();
        let node_type = node.node_type;
        let group = node.group.clone();
        let dependencies = related_entries(
            snapshot
                .outgoing(&selected_id)
                .map(|link| (link.target.as_str(), link.is_group_link)),
            snapshot,
        );
        let dependents = related_entries(
            snapshot
                .incoming(&selected_id)
                .map(|link| (link.source.as_str(), link.is_group_link)),
            snapshot,
        );

        ui.label(RichText::new(&name).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Type: {}", node_type.label()));

        let mut expand_requested = false;
        if let Some(group) = &group {
            let prefix = if group.prefix.is_empty() {
                "(top level)"
            } else {
                group.prefix.as_str()
            };
            ui.label(format!("Prefix: {prefix}"));
            ui.label(format!("Members: {}", group.members.len()));
            expand_requested = ui.button("Expand group").clicked();

            egui::CollapsingHeader::new("Members")
                .default_open(false)
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .id_salt("group_members_scroll")
                        .max_height(200.0)
                        .show(ui, |ui| {
                            for member in &group.members {
                                ui.label(member.as_str());
                            }
                        });
                });
        }

        let mut next_selection = None;
        ui.separator();
        ui.label(RichText::new(format!("Dependencies ({})", dependencies.len())).strong());
        draw_related(ui, "dependencies_scroll", &dependencies, &mut next_selection);

        ui.separator();
        ui.label(RichText::new(format!("Dependents ({})", dependents.len())).strong());
        draw_related(ui, "dependents_scroll", &dependents, &mut next_selection);

        if expand_requested && self.controller.click_node(&selected_id) {
            self.set_selected(None);
        } else if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }
}

fn related_entries<'a>(
    ends: impl Iterator<Item = (&'a str, bool)>,
    snapshot: &GraphSnapshot,
) -> Vec<RelatedEntry> {
    let mut entries = ends
        .map(|(id, via_group)| RelatedEntry {
            id: id.to_owned(),
            name: snapshot
                .node(id)
                .map_or_else(|| id.to_owned(), |node| node.name.clone()),
            via_group,
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn draw_related(
    ui: &mut Ui,
    scroll_id: &str,
    entries: &[RelatedEntry],
    next_selection: &mut Option<String>,
) {
    if entries.is_empty() {
        ui.label("None in the current view.");
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt(scroll_id)
        .max_height(200.0)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            for entry in entries {
                let label = if entry.via_group {
                    format!("{}  (via group)", entry.name)
                } else {
                    entry.name.clone()
                };
                if ui.link(label).on_hover_text(entry.id.as_str()).clicked() {
                    *next_selection = Some(entry.id.clone());
                }
            }
        });
}
