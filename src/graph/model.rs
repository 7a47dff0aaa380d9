use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Local,
    ThirdParty,
    Group,
}

impl NodeType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Local => "local",
            Self::ThirdParty => "third_party",
            Self::Group => "group",
        }
    }
}

/// Fields carried only by synthetic group nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    pub expanded: bool,
    pub prefix: String,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub node_type: NodeType,
    pub group: Option<GroupInfo>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            group: None,
        }
    }

    /// Builds the collapsed representative for `prefix`.
    pub fn group(prefix: &str, members: Vec<String>) -> Self {
        Self {
            id: group_node_id(prefix),
            name: format!("{prefix}... ({})", members.len()),
            node_type: NodeType::Group,
            group: Some(GroupInfo {
                expanded: false,
                prefix: prefix.to_owned(),
                members,
            }),
        }
    }

    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }
}

pub fn group_node_id(prefix: &str) -> String {
    format!("group_{prefix}")
}

/// A directed dependency edge. Endpoints are always bare node ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub is_group_link: bool,
    pub original_link: Option<Box<Link>>,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            is_group_link: false,
            original_link: None,
        }
    }

    /// A link standing in for `original` across a collapsed group boundary.
    pub fn synthesized(source: String, target: String, original: &Link) -> Self {
        Self {
            source,
            target,
            is_group_link: true,
            original_link: Some(Box::new(original.detached())),
        }
    }

    /// Plain copy of the endpoints with all grouping annotations cleared.
    pub fn detached(&self) -> Self {
        Self::new(self.source.clone(), self.target.clone())
    }

    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// One point-in-time `{nodes, links}` view of the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    pub fn group_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_group())
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.source == id)
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |link| link.target == id)
    }
}

/// Id lookup where the first node carrying an id wins, matching a linear
/// search over the node list.
pub(crate) fn index_nodes(nodes: &[Node]) -> HashMap<&str, &Node> {
    let mut by_id = HashMap::with_capacity(nodes.len());
    for node in nodes {
        by_id.entry(node.id.as_str()).or_insert(node);
    }
    by_id
}

pub(crate) fn resolve_link<'a>(
    by_id: &HashMap<&str, &'a Node>,
    link: &Link,
) -> Option<(&'a Node, &'a Node)> {
    let source = *by_id.get(link.source.as_str())?;
    let target = *by_id.get(link.target.as_str())?;
    Some((source, target))
}
