use eframe::egui::{Vec2, vec2};

use super::forces::charge_between;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: u8 = 12;

/// Axis-aligned square, `min` is the top-left corner.
#[derive(Clone, Copy, Debug)]
struct Square {
    min: Vec2,
    side: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), point| (min.min(*point), max.max(*point)));
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        let span = max - min;
        let side = span.x.max(span.y).max(1.0) + 2.0;
        Some(Self {
            min: min - vec2(1.0, 1.0),
            side,
        })
    }

    fn contains(self, point: Vec2) -> bool {
        let max = self.min + vec2(self.side, self.side);
        point.x >= self.min.x && point.y >= self.min.y && point.x <= max.x && point.y <= max.y
    }

    /// Bit 0 is the right half, bit 1 the lower half.
    fn quadrant(self, point: Vec2) -> usize {
        let half = self.side * 0.5;
        let right = point.x >= self.min.x + half;
        let lower = point.y >= self.min.y + half;
        usize::from(right) | (usize::from(lower) << 1)
    }

    fn child(self, quadrant: usize) -> Self {
        let half = self.side * 0.5;
        let offset = vec2(
            if quadrant & 1 == 1 { half } else { 0.0 },
            if quadrant & 2 == 2 { half } else { 0.0 },
        );
        Self {
            min: self.min + offset,
            side: half,
        }
    }
}

#[derive(Debug)]
struct Cell {
    square: Square,
    depth: u8,
    mass: f32,
    /// Sum of body positions while building, centre of mass afterwards.
    mass_center: Vec2,
    bodies: Vec<usize>,
    /// Arena index of the first of four consecutive children.
    first_child: Option<usize>,
}

impl Cell {
    fn new(square: Square, depth: u8) -> Self {
        Self {
            square,
            depth,
            mass: 0.0,
            mass_center: Vec2::ZERO,
            bodies: Vec::new(),
            first_child: None,
        }
    }
}

/// Barnes-Hut tree over unit-mass bodies, stored as a flat arena.
#[derive(Debug)]
pub(super) struct BarnesHut {
    cells: Vec<Cell>,
}

impl BarnesHut {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let square = Square::enclosing(positions)?;
        let mut tree = Self {
            cells: vec![Cell::new(square, 0)],
        };
        for (index, &point) in positions.iter().enumerate() {
            tree.insert(index, point, positions);
        }
        for cell in &mut tree.cells {
            if cell.mass > 0.0 {
                cell.mass_center /= cell.mass;
            }
        }
        Some(tree)
    }

    fn insert(&mut self, index: usize, point: Vec2, positions: &[Vec2]) {
        let mut current = 0;
        loop {
            let cell = &mut self.cells[current];
            cell.mass += 1.0;
            cell.mass_center += point;

            if let Some(first) = cell.first_child {
                current = first + cell.square.quadrant(point);
                continue;
            }
            if cell.bodies.len() < LEAF_CAPACITY || cell.depth >= MAX_DEPTH {
                cell.bodies.push(index);
                return;
            }

            let first = self.split(current, positions);
            current = first + self.cells[current].square.quadrant(point);
        }
    }

    /// Turns a full leaf into four children and hands its bodies down.
    fn split(&mut self, leaf: usize, positions: &[Vec2]) -> usize {
        let first = self.cells.len();
        let square = self.cells[leaf].square;
        let depth = self.cells[leaf].depth + 1;
        self.cells
            .extend((0..4).map(|quadrant| Cell::new(square.child(quadrant), depth)));

        let bodies = std::mem::take(&mut self.cells[leaf].bodies);
        self.cells[leaf].first_child = Some(first);
        for body in bodies {
            let point = positions[body];
            let child = &mut self.cells[first + square.quadrant(point)];
            child.mass += 1.0;
            child.mass_center += point;
            child.bodies.push(body);
        }
        first
    }

    /// Many-body force on `index`. Cells whose side is below `theta` times
    /// their distance act as a single body at their centre of mass.
    pub(super) fn force_on(
        &self,
        index: usize,
        positions: &[Vec2],
        strength: f32,
        theta: f32,
        stack: &mut Vec<usize>,
    ) -> Vec2 {
        let point = positions[index];
        let mut force = Vec2::ZERO;

        stack.clear();
        stack.push(0);
        while let Some(current) = stack.pop() {
            let cell = &self.cells[current];
            if cell.mass <= 0.0 {
                continue;
            }

            let Some(first) = cell.first_child else {
                for &other in &cell.bodies {
                    if other != index {
                        force += charge_between(point, positions[other], strength, index);
                    }
                }
                continue;
            };

            let distance = (cell.mass_center - point).length();
            if !cell.square.contains(point) && cell.square.side < theta * distance {
                force += charge_between(point, cell.mass_center, strength * cell.mass, index);
            } else {
                stack.extend(first..first + 4);
            }
        }

        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(count: usize) -> Vec<Vec2> {
        (0..count)
            .map(|index| vec2((index % 8) as f32 * 30.0, (index / 8) as f32 * 30.0))
            .collect()
    }

    #[test]
    fn root_carries_total_mass_and_centroid() {
        let positions = grid(40);
        let tree = BarnesHut::build(&positions).expect("non-empty tree");
        let root = &tree.cells[0];

        assert_eq!(root.mass, 40.0);
        assert!(root.first_child.is_some());
        assert!((root.mass_center - vec2(105.0, 60.0)).length() < 1e-3);
        assert!(positions.iter().all(|point| root.square.contains(*point)));
    }

    #[test]
    fn zero_theta_matches_the_direct_sum() {
        let positions = grid(40);
        let tree = BarnesHut::build(&positions).expect("non-empty tree");
        let mut stack = Vec::new();

        for index in [0, 17, 39] {
            let direct = positions
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .fold(Vec2::ZERO, |sum, (_, other)| {
                    sum + charge_between(positions[index], *other, -1500.0, index)
                });
            let approximated = tree.force_on(index, &positions, -1500.0, 0.0, &mut stack);
            assert!((direct - approximated).length() < 1e-2, "node {index}");
        }
    }

    #[test]
    fn distant_cluster_acts_as_one_body() {
        let mut positions = vec![vec2(0.0, 0.0)];
        positions.extend(grid(24).into_iter().map(|point| point * 0.1 + vec2(5000.0, 0.0)));
        let tree = BarnesHut::build(&positions).expect("non-empty tree");
        let mut stack = Vec::new();

        let force = tree.force_on(0, &positions, -1500.0, 0.9, &mut stack);
        assert!(force.x < 0.0);
        assert!(force.y.abs() < force.x.abs() * 0.01);
    }

    #[test]
    fn coincident_points_stop_splitting_at_max_depth() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let tree = BarnesHut::build(&positions).expect("non-empty tree");

        assert_eq!(tree.cells[0].mass, 20.0);
        assert!(tree.cells.iter().all(|cell| cell.depth <= MAX_DEPTH));
        let stacked = tree
            .cells
            .iter()
            .filter(|cell| cell.first_child.is_none())
            .map(|cell| cell.bodies.len())
            .sum::<usize>();
        assert_eq!(stacked, 20);

        let mut stack = Vec::new();
        let force = tree.force_on(3, &positions, -1500.0, 0.9, &mut stack);
        assert!(force.is_finite());
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(BarnesHut::build(&[]).is_none());
    }
}
