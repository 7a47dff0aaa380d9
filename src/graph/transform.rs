use std::collections::HashSet;

use tracing::{debug, warn};

use super::model::{GraphSnapshot, Link, Node, group_node_id, index_nodes, resolve_link};
use super::prefix::{Group, GroupMap, compute_groups, group_prefix};
use super::store::GraphStore;

/// Derives grouped and expanded views from the captured original graph.
///
/// Every operation takes the current snapshot by reference and returns a new
/// one; the caller decides what to keep.
#[derive(Clone, Debug, Default)]
pub struct GroupingTransformer {
    store: GraphStore,
    groups: GroupMap,
    grouped: bool,
}

impl GroupingTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn groups(&self) -> &GroupMap {
        &self.groups
    }

    /// Collapses every prefix group. Captures `current` as the original graph
    /// on first use. Returns `current` untouched when already grouped.
    pub fn apply_grouping(&mut self, current: &GraphSnapshot) -> GraphSnapshot {
        if self.grouped {
            return current.clone();
        }

        self.store.capture(current);
        let snapshot = self.rebuild_grouped();
        self.grouped = true;
        snapshot
    }

    /// Expands or collapses the group node `group_id` of `current`. Unknown
    /// ids and non-group nodes leave the snapshot unchanged.
    pub fn toggle_group(&mut self, current: &GraphSnapshot, group_id: &str) -> GraphSnapshot {
        let Some(node) = current.node(group_id) else {
            return current.clone();
        };
        let Some(info) = node.group.as_ref() else {
            return current.clone();
        };

        if info.expanded {
            return self.collapse_group(&info.prefix);
        }

        let Some(group) = self.groups.get(&info.prefix) else {
            warn!(group_id, "no group recorded for group node");
            return current.clone();
        };

        let mut record = node.clone();
        self.expand_group(current, &mut record, group)
    }

    /// Replaces `group_node` by copies of its members and restores the
    /// original links between members and any node still visible.
    pub fn expand_group(
        &self,
        current: &GraphSnapshot,
        group_node: &mut Node,
        group: &Group,
    ) -> GraphSnapshot {
        let mut nodes = current.nodes.clone();
        if let Some(index) = nodes.iter().position(|node| node.id == group_node.id) {
            nodes.remove(index);
        }
        nodes.extend(group.members.iter().cloned());

        let mut links = current
            .links
            .iter()
            .filter(|link| !link.touches(&group_node.id))
            .cloned()
            .collect::<Vec<_>>();

        let present = nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        let prefix = group.prefix.as_str();
        let original = self.store.original();
        let by_id = index_nodes(&original.nodes);

        for link in &original.links {
            let Some((source, target)) = resolve_link(&by_id, link) else {
                continue;
            };

            let source_inside = group_prefix(&source.name) == prefix;
            let target_inside = group_prefix(&target.name) == prefix;

            if source_inside && target_inside {
                links.push(link.detached());
            } else if source_inside || target_inside {
                let other = if source_inside {
                    &link.target
                } else {
                    &link.source
                };
                if present.contains(other.as_str()) {
                    links.push(link.detached());
                }
            }
        }

        // The record is not part of the returned snapshot.
        if let Some(info) = group_node.group.as_mut() {
            info.expanded = true;
        }

        debug!(
            group = %group_node.id,
            members = group.members.len(),
            "expanded group"
        );
        GraphSnapshot { nodes, links }
    }

    /// Collapsing rebuilds the grouped view from the original graph, so every
    /// other expanded group collapses too.
    pub fn collapse_group(&mut self, prefix: &str) -> GraphSnapshot {
        debug!(prefix, "collapsing group rebuilds every group");
        self.collapse_all()
    }

    pub fn collapse_all(&mut self) -> GraphSnapshot {
        self.rebuild_grouped()
    }

    /// Fresh copies of the original nodes and links. Returns `current`
    /// untouched when not grouped.
    pub fn revert_to_original(&mut self, current: &GraphSnapshot) -> GraphSnapshot {
        if !self.grouped {
            return current.clone();
        }

        let original = self.store.original();
        let snapshot = GraphSnapshot {
            nodes: original.nodes.clone(),
            links: original.links.iter().map(Link::detached).collect(),
        };
        self.grouped = false;
        snapshot
    }

    fn rebuild_grouped(&mut self) -> GraphSnapshot {
        let original = self.store.original();
        self.groups = compute_groups(&original.nodes, &original.links);
        grouped_snapshot(original, &self.groups)
    }
}

fn grouped_snapshot(original: &GraphSnapshot, groups: &GroupMap) -> GraphSnapshot {
    let by_id = index_nodes(&original.nodes);

    let mut nodes = original
        .nodes
        .iter()
        .filter(|node| !groups.contains(group_prefix(&node.name)))
        .cloned()
        .collect::<Vec<_>>();
    nodes.extend(groups.iter().map(Group::collapsed_node));

    let mut links = Vec::new();
    for link in &original.links {
        let Some((source, target)) = resolve_link(&by_id, link) else {
            continue;
        };
        if !groups.contains(group_prefix(&source.name))
            && !groups.contains(group_prefix(&target.name))
        {
            links.push(link.detached());
        }
    }

    let present = nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    // Keyed by the original edge across all groups: a link between two groups
    // is rewritten once, not once from each side.
    let mut rewritten: HashSet<(&str, &str)> = HashSet::new();
    for group in groups.iter() {
        for connection in &group.external_connections {
            let original_source = connection.original_link.source.as_str();
            let original_target = connection.original_link.target.as_str();
            if !rewritten.insert((original_source, original_target)) {
                continue;
            }

            let Some(member) = by_id.get(connection.member_id.as_str()) else {
                continue;
            };
            let member_side = group_node_id(group_prefix(&member.name));
            let external_side = connection
                .external_node_prefix
                .as_deref()
                .map_or_else(|| connection.external_node_id.clone(), group_node_id);

            let (source, target) = if original_source == connection.member_id {
                (member_side, external_side)
            } else {
                (external_side, member_side)
            };

            if present.contains(source.as_str()) && present.contains(target.as_str()) {
                links.push(Link::synthesized(
                    source,
                    target,
                    &connection.original_link,
                ));
            }
        }
    }

    debug!(
        groups = groups.len(),
        nodes = nodes.len(),
        links = links.len(),
        "built grouped snapshot"
    );
    GraphSnapshot { nodes, links }
}
