use tracing::debug;

use super::model::{GraphSnapshot, Link};

/// Holds the original graph, captured once and never mutated afterwards.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    original: GraphSnapshot,
    captured: bool,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copies `graph` on the first call. Later calls leave the stored
    /// graph alone and return `false`.
    pub fn capture(&mut self, graph: &GraphSnapshot) -> bool {
        if self.captured {
            return false;
        }

        self.original = GraphSnapshot {
            nodes: graph.nodes.clone(),
            links: graph.links.iter().map(Link::detached).collect(),
        };
        self.captured = true;
        debug!(
            nodes = self.original.nodes.len(),
            links = self.original.links.len(),
            "captured original graph"
        );
        true
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn original(&self) -> &GraphSnapshot {
        &self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{Node, NodeType};

    fn sample() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("main.py", "main.py", NodeType::Root),
                Node::new("pkg/a.py", "pkg/a.py", NodeType::Local),
            ],
            vec![Link::new("main.py", "pkg/a.py")],
        )
    }

    #[test]
    fn second_capture_is_ignored() {
        let mut store = GraphStore::new();
        assert!(store.capture(&sample()));

        let other = GraphSnapshot::new(vec![Node::new("x", "x", NodeType::Local)], Vec::new());
        assert!(!store.capture(&other));
        assert_eq!(store.original(), &sample());
    }

    #[test]
    fn empty_graph_still_counts_as_captured() {
        let mut store = GraphStore::new();
        assert!(store.capture(&GraphSnapshot::default()));
        assert!(!store.capture(&sample()));
        assert!(store.original().nodes.is_empty());
    }

    #[test]
    fn captured_links_drop_group_annotations() {
        let original = Link::new("a", "b");
        let mut graph = sample();
        graph
            .links
            .push(Link::synthesized("group_x".into(), "b".into(), &original));

        let mut store = GraphStore::new();
        store.capture(&graph);

        let stored = &store.original().links[1];
        assert_eq!(stored, &Link::new("group_x", "b"));
    }
}
