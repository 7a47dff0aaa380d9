use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use crate::graph::NodeType;

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + pan;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let a_min_x = a1.x.min(a2.x);
    let a_max_x = a1.x.max(a2.x);
    let a_min_y = a1.y.min(a2.y);
    let a_max_y = a1.y.max(a2.y);
    let b_min_x = b1.x.min(b2.x);
    let b_max_x = b1.x.max(b2.x);
    let b_min_y = b1.y.min(b2.y);
    let b_max_y = b1.y.max(b2.y);

    if a_max_x < b_min_x || b_max_x < a_min_x || a_max_y < b_min_y || b_max_y < a_min_y {
        return false;
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn node_radius(node_type: NodeType) -> f32 {
    match node_type {
        NodeType::Root => 12.0,
        NodeType::Local => 10.0,
        NodeType::ThirdParty => 8.0,
        NodeType::Group => 16.0,
    }
}

pub(super) fn node_color(node_type: NodeType) -> Color32 {
    match node_type {
        NodeType::Root => Color32::from_rgb(255, 0, 0),
        NodeType::Local => Color32::from_rgb(0, 128, 0),
        NodeType::ThirdParty => Color32::from_rgb(0, 0, 255),
        NodeType::Group => Color32::from_rgb(255, 153, 0),
    }
}

pub(super) fn edge_stroke(is_group_link: bool, zoom: f32) -> Stroke {
    let zoom_sqrt = zoom.sqrt();
    if is_group_link {
        Stroke::new((3.0 * zoom_sqrt).clamp(1.2, 6.0), Color32::from_rgb(255, 102, 0))
    } else {
        Stroke::new((2.0 * zoom_sqrt).clamp(0.8, 4.0), Color32::from_gray(153))
    }
}

/// Draws `start -> end` shortened to the node rims, with an arrowhead
/// touching the target.
pub(super) fn draw_edge(
    painter: &Painter,
    start: Pos2,
    end: Pos2,
    source_radius: f32,
    target_radius: f32,
    stroke: Stroke,
    dashed: bool,
) {
    let delta = end - start;
    let length = delta.length();
    if length <= source_radius + target_radius + 1.0 {
        return;
    }

    let direction = delta / length;
    let from = start + direction * source_radius;
    let tip = end - direction * target_radius;
    let head_length = (stroke.width * 3.0).clamp(6.0, 14.0);
    let base = tip - direction * head_length;

    if dashed {
        let dash = (stroke.width * 1.7).max(3.0);
        painter.extend(Shape::dashed_line(&[from, base], stroke, dash, dash));
    } else {
        painter.line_segment([from, base], stroke);
    }

    let normal = Vec2::new(-direction.y, direction.x) * (head_length * 0.5);
    painter.add(Shape::convex_polygon(
        vec![tip, base + normal, base - normal],
        stroke.color,
        Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_and_screen_transforms_invert() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(800.0, 600.0));
        let pan = Vec2::new(-35.0, 12.0);
        let zoom = 1.6;
        let world = Vec2::new(120.0, -48.0);

        let screen = world_to_screen(rect, pan, zoom, world);
        let back = screen_to_world(rect, pan, zoom, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn groups_draw_largest() {
        let radii = [
            NodeType::Root,
            NodeType::Local,
            NodeType::ThirdParty,
            NodeType::Group,
        ]
        .map(node_radius);
        assert_eq!(radii, [12.0, 10.0, 8.0, 16.0]);
    }

    #[test]
    fn diagonal_edge_crossing_viewport_is_visible() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        assert!(edge_visible(
            rect,
            Pos2::new(-50.0, 50.0),
            Pos2::new(150.0, 50.0),
            0.0
        ));
        assert!(!edge_visible(
            rect,
            Pos2::new(-50.0, -50.0),
            Pos2::new(-10.0, 200.0),
            0.0
        ));
    }
}
