use eframe::egui::{Vec2, vec2};

use crate::app::LayoutEdge;

/// Squared distance below which many-body contributions are clamped.
const MIN_DISTANCE_SQ: f32 = 1.0;

fn jiggle(index: usize) -> Vec2 {
    let angle = ((index as f32) * 0.618_034 + 0.37) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

pub(super) fn charge_between(point: Vec2, other: Vec2, strength: f32, index: usize) -> Vec2 {
    let mut delta = other - point;
    if delta.length_sq() <= f32::EPSILON {
        delta = jiggle(index);
    }
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    delta * (strength / distance_sq)
}

/// Spring pass over every edge, applied straight to velocities. Each end
/// moves in inverse proportion to its degree.
pub(super) fn apply_link_forces(
    edges: &[LayoutEdge],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    degree: &[usize],
    distance: f32,
    strength: f32,
    alpha: f32,
) {
    for (edge_index, edge) in edges.iter().enumerate() {
        let (source, target) = (edge.source, edge.target);
        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() <= f32::EPSILON {
            delta = jiggle(edge_index);
        }

        let length = delta.length();
        let pull = delta * ((length - distance) / length * alpha * strength);

        let source_degree = degree[source].max(1) as f32;
        let target_degree = degree[target].max(1) as f32;
        let bias = source_degree / (source_degree + target_degree);

        velocities[target] -= pull * bias;
        velocities[source] += pull * (1.0 - bias);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_strength_pushes_apart() {
        let force = charge_between(vec2(0.0, 0.0), vec2(10.0, 0.0), -100.0, 0);
        assert!(force.x < 0.0);
        assert!(force.y.abs() < 1e-6);
    }

    #[test]
    fn stretched_link_pulls_both_ends_inward() {
        let edges = [LayoutEdge {
            source: 0,
            target: 1,
            is_group_link: false,
        }];
        let positions = [vec2(0.0, 0.0), vec2(300.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];

        apply_link_forces(&edges, &positions, &mut velocities, &[1, 1], 100.0, 0.5, 1.0);

        assert!(velocities[0].x > 0.0);
        assert!(velocities[1].x < 0.0);
        assert!((velocities[0].x + velocities[1].x).abs() < 1e-4);
    }

    #[test]
    fn compressed_link_pushes_ends_apart() {
        let edges = [LayoutEdge {
            source: 0,
            target: 1,
            is_group_link: true,
        }];
        let positions = [vec2(0.0, 0.0), vec2(20.0, 0.0)];
        let mut velocities = [Vec2::ZERO; 2];

        apply_link_forces(&edges, &positions, &mut velocities, &[1, 3], 100.0, 0.5, 1.0);

        assert!(velocities[0].x < 0.0);
        assert!(velocities[1].x > 0.0);
        assert!(velocities[1].x.abs() < velocities[0].x.abs());
    }
}
