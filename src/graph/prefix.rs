use std::collections::HashMap;

use super::model::{Link, Node, group_node_id, index_nodes, resolve_link};

/// Everything before the last `/` of a node name. Names without a `/` share
/// the empty prefix.
pub fn group_prefix(name: &str) -> &str {
    name.rsplit_once('/').map_or("", |(prefix, _)| prefix)
}

/// A link crossing the boundary of a group, seen from that group's side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalConnection {
    /// Member of this group the link attaches to.
    pub member_id: String,
    pub external_node_id: String,
    /// Prefix of the other end when it belongs to another group.
    pub external_node_prefix: Option<String>,
    pub original_link: Link,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub prefix: String,
    pub members: Vec<Node>,
    pub external_connections: Vec<ExternalConnection>,
}

impl Group {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            members: Vec::new(),
            external_connections: Vec::new(),
        }
    }

    pub fn node_id(&self) -> String {
        group_node_id(&self.prefix)
    }

    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|member| member.id.clone()).collect()
    }

    /// The collapsed group node standing in for every member.
    pub fn collapsed_node(&self) -> Node {
        Node::group(&self.prefix, self.member_ids())
    }
}

/// Groups keyed by prefix, iterated in the order prefixes were first seen.
#[derive(Clone, Debug, Default)]
pub struct GroupMap {
    groups: Vec<Group>,
    index_by_prefix: HashMap<String, usize>,
}

impl GroupMap {
    pub fn get(&self, prefix: &str) -> Option<&Group> {
        self.index_by_prefix
            .get(prefix)
            .map(|&index| &self.groups[index])
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.index_by_prefix.contains_key(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn index_of(&self, prefix: &str) -> Option<usize> {
        self.index_by_prefix.get(prefix).copied()
    }
}

/// Partitions `nodes` by name prefix and records, for every group, the links
/// crossing its boundary. Prefixes with fewer than two members are dropped.
/// Links with an endpoint missing from `nodes` are ignored.
pub fn compute_groups(nodes: &[Node], links: &[Link]) -> GroupMap {
    let mut groups: Vec<Group> = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for node in nodes {
        let prefix = group_prefix(&node.name);
        let index = *first_seen.entry(prefix).or_insert_with(|| {
            groups.push(Group::new(prefix));
            groups.len() - 1
        });
        groups[index].members.push(node.clone());
    }

    groups.retain(|group| group.members.len() >= 2);
    let index_by_prefix = groups
        .iter()
        .enumerate()
        .map(|(index, group)| (group.prefix.clone(), index))
        .collect();
    let mut map = GroupMap {
        groups,
        index_by_prefix,
    };

    let by_id = index_nodes(nodes);
    for link in links {
        let Some((source, target)) = resolve_link(&by_id, link) else {
            continue;
        };

        let source_prefix = group_prefix(&source.name);
        let target_prefix = group_prefix(&target.name);

        match (map.index_of(source_prefix), map.index_of(target_prefix)) {
            (Some(source_group), Some(target_group)) if source_prefix != target_prefix => {
                map.groups[source_group]
                    .external_connections
                    .push(ExternalConnection {
                        member_id: source.id.clone(),
                        external_node_id: target.id.clone(),
                        external_node_prefix: Some(target_prefix.to_owned()),
                        original_link: link.clone(),
                    });
                map.groups[target_group]
                    .external_connections
                    .push(ExternalConnection {
                        member_id: target.id.clone(),
                        external_node_id: source.id.clone(),
                        external_node_prefix: Some(source_prefix.to_owned()),
                        original_link: link.clone(),
                    });
            }
            (Some(source_group), None) => {
                map.groups[source_group]
                    .external_connections
                    .push(ExternalConnection {
                        member_id: source.id.clone(),
                        external_node_id: target.id.clone(),
                        external_node_prefix: None,
                        original_link: link.clone(),
                    });
            }
            (None, Some(target_group)) => {
                map.groups[target_group]
                    .external_connections
                    .push(ExternalConnection {
                        member_id: target.id.clone(),
                        external_node_id: source.id.clone(),
                        external_node_prefix: None,
                        original_link: link.clone(),
                    });
            }
            _ => {}
        }
    }

    map
}
