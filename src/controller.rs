use std::collections::HashSet;

use tracing::{debug, info};

use crate::graph::{GraphSnapshot, GroupMap, GroupingTransformer};
use crate::util::stable_pair;

/// Half-width of the square around the viewport centre new nodes land in.
const SEED_JITTER: f32 = 100.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Force-layout tuning handed to every `start_simulation` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub link_distance: f32,
    pub link_strength: f32,
    /// Many-body strength; negative values repel.
    pub repulsion: f32,
    pub center_strength: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 100.0,
            link_strength: 0.5,
            repulsion: -1500.0,
            center_strength: 0.02,
        }
    }
}

/// The layout and rendering side of the viewer. Implementations own node
/// positions only; identity and topology always come from the snapshot.
pub trait LayoutEngine {
    fn render(&mut self, snapshot: &GraphSnapshot);
    fn start_simulation(&mut self, snapshot: &GraphSnapshot, config: &SimulationConfig);
    fn place_node(&mut self, id: &str, point: Point);
    fn pin_nodes(&mut self, ids: &[String]);
    fn unpin_all(&mut self);
}

/// Single owner of the current snapshot. Turns user intents into grouping
/// transitions and pushes each result to the layout engine.
pub struct ViewController<E> {
    transformer: GroupingTransformer,
    snapshot: GraphSnapshot,
    config: SimulationConfig,
    engine: E,
    viewport_center: Point,
    pins_pending: bool,
}

impl<E: LayoutEngine> ViewController<E> {
    pub fn new(snapshot: GraphSnapshot, engine: E, config: SimulationConfig) -> Self {
        let mut controller = Self {
            transformer: GroupingTransformer::new(),
            snapshot,
            config,
            engine,
            viewport_center: Point::default(),
            pins_pending: false,
        };
        let seeded = controller.all_node_ids();
        controller.transition(&seeded);
        controller
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn is_grouped(&self) -> bool {
        self.transformer.is_grouped()
    }

    pub fn groups(&self) -> &GroupMap {
        self.transformer.groups()
    }

    pub fn viewport_center(&self) -> Point {
        self.viewport_center
    }

    pub fn set_viewport_center(&mut self, center: Point) {
        self.viewport_center = center;
    }

    /// Groups the graph, or restores the original when already grouped.
    /// Every node is re-seeded. Returns the new grouped state.
    pub fn toggle_grouping(&mut self) -> bool {
        self.snapshot = if self.transformer.is_grouped() {
            self.transformer.revert_to_original(&self.snapshot)
        } else {
            self.transformer.apply_grouping(&self.snapshot)
        };

        let seeded = self.all_node_ids();
        self.transition(&seeded);

        let grouped = self.transformer.is_grouped();
        info!(
            grouped,
            nodes = self.snapshot.nodes.len(),
            links = self.snapshot.links.len(),
            "toggled grouping"
        );
        grouped
    }

    /// Expands or collapses a group node. Returns whether the snapshot was
    /// replaced; clicks on plain or unknown nodes do nothing.
    pub fn click_node(&mut self, id: &str) -> bool {
        if !self.snapshot.node(id).is_some_and(|node| node.is_group()) {
            return false;
        }

        let next = self.transformer.toggle_group(&self.snapshot, id);
        self.replace_snapshot(next);
        debug!(id, nodes = self.snapshot.nodes.len(), "group node clicked");
        true
    }

    /// Collapses every expanded group back into its group node.
    pub fn collapse_groups(&mut self) -> bool {
        if !self.transformer.is_grouped() {
            return false;
        }

        let next = self.transformer.collapse_all();
        self.replace_snapshot(next);
        debug!(nodes = self.snapshot.nodes.len(), "collapsed all groups");
        true
    }

    pub fn set_simulation(&mut self, config: SimulationConfig) {
        self.config = config;
        self.engine.start_simulation(&self.snapshot, &self.config);
    }

    /// Releases the pins placed by the previous transition. Call once at the
    /// start of every frame.
    pub fn begin_frame(&mut self) {
        if self.pins_pending {
            self.engine.unpin_all();
            self.pins_pending = false;
        }
    }

    fn replace_snapshot(&mut self, next: GraphSnapshot) {
        let seeded = {
            let previous = self
                .snapshot
                .nodes
                .iter()
                .map(|node| node.id.as_str())
                .collect::<HashSet<_>>();
            next.nodes
                .iter()
                .filter(|node| !previous.contains(node.id.as_str()))
                .map(|node| node.id.clone())
                .collect::<Vec<_>>()
        };
        self.snapshot = next;
        self.transition(&seeded);
    }

    fn transition(&mut self, seeded: &[String]) {
        self.engine.render(&self.snapshot);
        for id in seeded {
            let point = self.seed_point(id);
            self.engine.place_node(id, point);
        }
        if !seeded.is_empty() {
            self.engine.pin_nodes(seeded);
            self.pins_pending = true;
        }
        self.engine.start_simulation(&self.snapshot, &self.config);
    }

    fn seed_point(&self, id: &str) -> Point {
        let (jitter_x, jitter_y) = stable_pair(id);
        Point::new(
            self.viewport_center.x + jitter_x * SEED_JITTER,
            self.viewport_center.y + jitter_y * SEED_JITTER,
        )
    }

    fn all_node_ids(&self) -> Vec<String> {
        self.snapshot
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node, NodeType};

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Render(Vec<String>),
        Start(SimulationConfig),
        Place(String, Point),
        Pin(Vec<String>),
        UnpinAll,
    }

    #[derive(Default)]
    struct RecordingEngine {
        calls: Vec<Call>,
    }

    impl RecordingEngine {
        fn take(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }
    }

    impl LayoutEngine for RecordingEngine {
        fn render(&mut self, snapshot: &GraphSnapshot) {
            let ids = snapshot.nodes.iter().map(|node| node.id.clone()).collect();
            self.calls.push(Call::Render(ids));
        }

        fn start_simulation(&mut self, _snapshot: &GraphSnapshot, config: &SimulationConfig) {
            self.calls.push(Call::Start(*config));
        }

        fn place_node(&mut self, id: &str, point: Point) {
            self.calls.push(Call::Place(id.to_owned(), point));
        }

        fn pin_nodes(&mut self, ids: &[String]) {
            self.calls.push(Call::Pin(ids.to_vec()));
        }

        fn unpin_all(&mut self) {
            self.calls.push(Call::UnpinAll);
        }
    }

    fn sample() -> GraphSnapshot {
        let nodes = ["main.py", "pkg/a.py", "pkg/b.py", "requests"]
            .into_iter()
            .map(|name| Node::new(name, name, NodeType::Local))
            .collect();
        GraphSnapshot::new(
            nodes,
            vec![
                Link::new("main.py", "pkg/a.py"),
                Link::new("pkg/a.py", "pkg/b.py"),
                Link::new("pkg/b.py", "requests"),
            ],
        )
    }

    fn controller() -> ViewController<RecordingEngine> {
        let mut controller =
            ViewController::new(sample(), RecordingEngine::default(), SimulationConfig::default());
        controller.engine_mut().take();
        controller
    }

    fn placed(calls: &[Call]) -> Vec<(String, Point)> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::Place(id, point) => Some((id.clone(), *point)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn construction_seeds_and_pins_every_node() {
        let mut controller =
            ViewController::new(sample(), RecordingEngine::default(), SimulationConfig::default());
        let calls = controller.engine_mut().take();

        assert!(matches!(calls.first(), Some(Call::Render(ids)) if ids.len() == 4));
        assert_eq!(placed(&calls).len(), 4);
        assert!(calls.contains(&Call::Pin(vec![
            "main.py".into(),
            "pkg/a.py".into(),
            "pkg/b.py".into(),
            "requests".into(),
        ])));
        assert_eq!(calls.last(), Some(&Call::Start(SimulationConfig::default())));
    }

    #[test]
    fn pins_are_released_on_the_next_frame_only() {
        let mut controller = controller();
        controller.toggle_grouping();
        controller.engine_mut().take();

        controller.begin_frame();
        controller.begin_frame();
        assert_eq!(controller.engine_mut().take(), vec![Call::UnpinAll]);
    }

    #[test]
    fn toggling_grouping_reseeds_near_the_viewport_centre() {
        let mut controller = controller();
        controller.set_viewport_center(Point::new(500.0, -200.0));

        assert!(controller.toggle_grouping());
        let calls = controller.engine_mut().take();
        let ids = controller
            .snapshot()
            .nodes
            .iter()
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["group_", "group_pkg"]);

        let seeded = placed(&calls);
        assert_eq!(
            seeded.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>(),
            ids
        );
        for (_, point) in seeded {
            assert!((point.x - 500.0).abs() <= SEED_JITTER);
            assert!((point.y + 200.0).abs() <= SEED_JITTER);
        }

        assert!(!controller.toggle_grouping());
        assert_eq!(controller.snapshot(), &sample());
    }

    #[test]
    fn clicking_a_group_seeds_only_new_nodes() {
        let mut controller = controller();
        controller.toggle_grouping();
        controller.engine_mut().take();

        assert!(controller.click_node("group_pkg"));
        let calls = controller.engine_mut().take();
        assert_eq!(
            placed(&calls)
                .into_iter()
                .map(|(id, _)| id)
                .collect::<Vec<_>>(),
            vec!["pkg/a.py", "pkg/b.py"]
        );
        assert!(matches!(calls.last(), Some(Call::Start(_))));
        assert!(!controller.snapshot().contains_node("group_pkg"));
    }

    #[test]
    fn clicking_a_plain_node_changes_nothing() {
        let mut controller = controller();
        let before = controller.snapshot().clone();

        assert!(!controller.click_node("main.py"));
        assert!(!controller.click_node("missing"));
        assert_eq!(controller.snapshot(), &before);
        assert!(controller.engine_mut().take().is_empty());
    }

    #[test]
    fn collapse_requires_grouping() {
        let mut controller = controller();
        assert!(!controller.collapse_groups());

        controller.toggle_grouping();
        let grouped = controller.snapshot().clone();
        controller.click_node("group_pkg");
        assert!(controller.collapse_groups());
        assert_eq!(controller.snapshot(), &grouped);
    }

    #[test]
    fn simulation_config_reaches_the_engine_unchanged() {
        let mut controller = controller();
        let config = SimulationConfig {
            link_distance: 42.0,
            link_strength: 0.9,
            repulsion: -300.0,
            center_strength: 0.1,
        };

        controller.set_simulation(config);
        assert_eq!(controller.engine_mut().take(), vec![Call::Start(config)]);
        assert_eq!(controller.config(), config);
    }
}
