use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::controller::Point;
use crate::graph::NodeType;

use super::super::physics::step_physics;
use super::super::render_utils::{
    dim_color, draw_background, draw_edge, edge_stroke, edge_visible, node_color, node_radius,
    screen_to_world, world_to_screen,
};
use super::super::{LayoutGraph, SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, graph: &mut LayoutGraph) {
        let scratch = &mut graph.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &graph.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.world_pos));
            scratch
                .screen_radii
                .push((node_radius(node.node_type) * zoom.powf(0.5)).clamp(2.5, 40.0));
        }

        Self::visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(graph.nodes.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        let graph = self.controller.engine();
        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == graph.revision
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                fuzzy_match_score(&matcher, &node.label, search_query).map(|_| index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: graph.revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);
        self.handle_graph_zoom(ui, rect, &response);

        let center = screen_to_world(rect, self.pan, self.zoom, rect.center());
        self.controller
            .set_viewport_center(Point::new(center.x, center.y));

        if self.controller.snapshot().nodes.is_empty() {
            ui.label("The graph has no nodes.");
            return;
        }

        Self::update_screen_space(rect, self.pan, self.zoom, self.controller.engine_mut());
        let hovered = {
            let scratch = &self.controller.engine().view_scratch;
            Self::hovered_index(
                ui,
                &scratch.visible_indices,
                &scratch.screen_positions,
                &scratch.screen_radii,
            )
        };
        let hovered_index = hovered.map(|(index, _)| index);

        self.handle_node_drag(&response, rect, hovered_index);
        self.handle_graph_pan(&response);

        let mut physics_moving = false;
        if self.live_physics {
            physics_moving = step_physics(self.controller.engine_mut());
        }
        if physics_moving || self.dragging.is_some() || response.dragged() {
            ui.ctx().request_repaint();
        }

        let clicked_id = if response.clicked_by(egui::PointerButton::Primary) {
            Some(hovered_index.and_then(|index| {
                self.controller
                    .engine()
                    .nodes
                    .get(index)
                    .map(|node| node.id.clone())
            }))
        } else {
            None
        };

        let search_matches = self.cached_search_matches();
        let pan = self.pan;
        let zoom = self.zoom;
        let graph = self.controller.engine_mut();
        Self::update_screen_space(rect, pan, zoom, graph);
        let scratch = &graph.view_scratch;

        let selected_index = self
            .selected
            .as_deref()
            .and_then(|id| graph.node_index(id));
        let neighbours = selected_index
            .map(|selected| {
                graph
                    .edges
                    .iter()
                    .filter_map(|edge| {
                        if edge.source == selected {
                            Some(edge.target)
                        } else if edge.target == selected {
                            Some(edge.source)
                        } else {
                            None
                        }
                    })
                    .collect::<HashSet<_>>()
            })
            .unwrap_or_default();
        let search_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let mut visible_edge_count = 0usize;
        for edge in &graph.edges {
            let start = scratch.screen_positions[edge.source];
            let end = scratch.screen_positions[edge.target];
            if !scratch.visible_mask[edge.source]
                && !scratch.visible_mask[edge.target]
                && !edge_visible(rect, start, end, 2.5)
            {
                continue;
            }

            let touches_selection = selected_index
                .is_some_and(|selected| edge.source == selected || edge.target == selected);
            let mut stroke = edge_stroke(edge.is_group_link, zoom);
            if touches_selection {
                stroke.color = Color32::from_rgb(245, 206, 93);
            } else if selected_index.is_some() || search_active {
                stroke.color = dim_color(stroke.color, 0.5);
            }

            draw_edge(
                &painter,
                start,
                end,
                scratch.screen_radii[edge.source],
                scratch.screen_radii[edge.target],
                stroke,
                edge.is_group_link,
            );
            visible_edge_count += 1;
        }

        for &index in &scratch.visible_indices {
            let node = &graph.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];

            let is_selected = selected_index == Some(index);
            let is_hovered = hovered_index == Some(index);
            let is_neighbour = neighbours.contains(&index);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let base_color = node_color(node.node_type);
            let color = if is_selected || is_hovered || is_neighbour || is_match {
                base_color
            } else if selected_index.is_some() || search_active {
                dim_color(base_color, 0.45)
            } else {
                base_color
            };

            painter.circle_filled(position, radius, color);
            painter.circle_stroke(position, radius, Stroke::new(1.0, Color32::BLACK));
            if is_selected || is_match {
                let halo = if is_selected {
                    Color32::from_rgb(245, 206, 93)
                } else {
                    Color32::from_rgb(103, 196, 255)
                };
                painter.circle_stroke(position, radius + 3.0, Stroke::new(1.6, halo));
            }

            let should_draw_label = is_selected
                || is_hovered
                || is_neighbour
                || is_match
                || node.node_type == NodeType::Group
                || zoom > 0.6;
            if should_draw_label {
                painter.text(
                    position - vec2(0.0, radius + 4.0),
                    Align2::CENTER_BOTTOM,
                    &node.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered_index {
            let node = &graph.nodes[index];
            let hint = if node.node_type == NodeType::Group {
                format!("{}  |  click to expand", node.label)
            } else {
                format!("{}  |  {}", node.label, node.node_type.label())
            };
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hint,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        self.visible_node_count = scratch.visible_indices.len();
        self.visible_edge_count = visible_edge_count;

        if let Some(clicked) = clicked_id {
            self.apply_graph_click(clicked);
        }
    }

    fn apply_graph_click(&mut self, clicked: Option<String>) {
        let Some(id) = clicked else {
            self.set_selected(None);
            return;
        };

        if self.controller.click_node(&id) {
            self.set_selected(None);
        } else {
            self.set_selected(Some(id));
        }
    }
}
