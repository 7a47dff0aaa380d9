use std::collections::HashSet;

use depmap::graph::{
    GraphSnapshot, GroupingTransformer, Link, Node, NodeType, group_prefix,
};
use proptest::prelude::*;

const PREFIXES: [&str; 4] = ["", "pkg", "pkg/sub", "lib"];

#[derive(Clone, Debug)]
enum Op {
    Toggle(usize),
    CollapseAll,
    Regroup,
}

fn module_name(prefix: usize, leaf: usize) -> String {
    match PREFIXES[prefix] {
        "" => format!("m{leaf}.py"),
        prefix => format!("{prefix}/m{leaf}.py"),
    }
}

fn node_type(code: u8) -> NodeType {
    match code {
        0 => NodeType::Root,
        1 => NodeType::Local,
        _ => NodeType::ThirdParty,
    }
}

fn graph_strategy() -> impl Strategy<Value = GraphSnapshot> {
    prop::collection::btree_set((0..PREFIXES.len(), 0..5usize), 1..14)
        .prop_flat_map(|names| {
            let names = names
                .into_iter()
                .map(|(prefix, leaf)| module_name(prefix, leaf))
                .collect::<Vec<_>>();
            let count = names.len();
            (
                Just(names),
                prop::collection::vec(0..3u8, count),
                prop::collection::vec((0..count, 0..count), 0..24),
            )
        })
        .prop_map(|(names, types, edges)| {
            let nodes = names
                .iter()
                .zip(types)
                .map(|(name, code)| Node::new(name.as_str(), name.as_str(), node_type(code)))
                .collect();
            let links = edges
                .into_iter()
                .map(|(source, target)| Link::new(names[source].as_str(), names[target].as_str()))
                .collect();
            GraphSnapshot::new(nodes, links)
        })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..8usize).prop_map(Op::Toggle),
        1 => Just(Op::CollapseAll),
        1 => Just(Op::Regroup),
    ]
}

fn links_resolve(snapshot: &GraphSnapshot) -> bool {
    let ids = snapshot
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    snapshot
        .links
        .iter()
        .all(|link| ids.contains(link.source.as_str()) && ids.contains(link.target.as_str()))
}

fn group_node_ids(snapshot: &GraphSnapshot) -> Vec<String> {
    snapshot.group_nodes().map(|node| node.id.clone()).collect()
}

proptest! {
    #[test]
    fn revert_after_any_transitions_restores_the_original(
        original in graph_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..12),
    ) {
        let mut transformer = GroupingTransformer::new();
        let mut current = transformer.apply_grouping(&original);
        prop_assert!(links_resolve(&current));

        for op in ops {
            current = match op {
                Op::Toggle(pick) => {
                    let ids = group_node_ids(&current);
                    if ids.is_empty() {
                        current
                    } else {
                        transformer.toggle_group(&current, &ids[pick % ids.len()])
                    }
                }
                Op::CollapseAll => transformer.collapse_all(),
                Op::Regroup => transformer.apply_grouping(&current),
            };
            prop_assert!(links_resolve(&current));
            prop_assert_eq!(transformer.store().original(), &original);
        }

        let reverted = transformer.revert_to_original(&current);
        prop_assert!(!transformer.is_grouped());
        prop_assert_eq!(reverted, original);
    }

    #[test]
    fn grouped_view_partitions_nodes_by_prefix(original in graph_strategy()) {
        let mut transformer = GroupingTransformer::new();
        let grouped = transformer.apply_grouping(&original);
        let groups = transformer.groups();

        for group in groups.iter() {
            prop_assert!(group.members.len() >= 2);
        }

        let plain = grouped.nodes.iter().filter(|node| !node.is_group()).count();
        let hidden = groups.iter().map(|group| group.members.len()).sum::<usize>();
        prop_assert_eq!(plain + hidden, original.nodes.len());
        prop_assert_eq!(grouped.group_nodes().count(), groups.len());

        for node in grouped.nodes.iter().filter(|node| !node.is_group()) {
            prop_assert!(!groups.contains(group_prefix(&node.name)));
        }
        for link in &grouped.links {
            let synthesized = link.original_link.is_some();
            prop_assert_eq!(link.is_group_link, synthesized);
        }
    }

    #[test]
    fn expanding_then_collapsing_restores_the_grouped_view(
        original in graph_strategy(),
        pick in 0..8usize,
    ) {
        let mut transformer = GroupingTransformer::new();
        let grouped = transformer.apply_grouping(&original);
        let ids = group_node_ids(&grouped);
        prop_assume!(!ids.is_empty());

        let id = &ids[pick % ids.len()];
        let expanded = transformer.toggle_group(&grouped, id);
        prop_assert!(!expanded.contains_node(id));
        prop_assert!(links_resolve(&expanded));

        prop_assert_eq!(transformer.collapse_all(), grouped);
    }
}
