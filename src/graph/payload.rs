use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{GraphSnapshot, GroupInfo, Link, Node, NodeType};

/// A link end as found in a payload: a bare id, or a node object that was
/// already resolved by whoever produced the payload.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawEndpoint {
    Id(String),
    Node { id: String },
}

impl RawEndpoint {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Node { id } => id,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    name: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    is_group: bool,
    #[serde(default)]
    expanded_state: bool,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLink {
    source: RawEndpoint,
    target: RawEndpoint,
    #[serde(default)]
    is_group_link: bool,
    #[serde(default)]
    original_link: Option<Box<RawLink>>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    links: Vec<RawLink>,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let group = raw.is_group.then(|| GroupInfo {
            expanded: raw.expanded_state,
            prefix: raw.prefix.unwrap_or_default(),
            members: raw.members,
        });

        Self {
            id: raw.id,
            name: raw.name,
            node_type: raw.node_type,
            group,
        }
    }
}

impl From<RawLink> for Link {
    fn from(raw: RawLink) -> Self {
        Self {
            source: raw.source.into_id(),
            target: raw.target.into_id(),
            is_group_link: raw.is_group_link,
            original_link: raw.original_link.map(|original| Box::new(Link::from(*original))),
        }
    }
}

/// Parses a `{nodes, links}` payload, normalizing every link end to an id.
pub fn parse_graph_payload(raw: &str) -> Result<GraphSnapshot> {
    let parsed: RawGraph = serde_json::from_str(raw).context("invalid graph JSON")?;
    let snapshot = GraphSnapshot {
        nodes: parsed.nodes.into_iter().map(Node::from).collect(),
        links: parsed.links.into_iter().map(Link::from).collect(),
    };
    debug!(
        nodes = snapshot.nodes.len(),
        links = snapshot.links.len(),
        "parsed graph payload"
    );
    Ok(snapshot)
}

pub fn load_graph_file(path: &Path) -> Result<GraphSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    parse_graph_payload(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeJson<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expanded_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<&'a [String]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkJson<'a> {
    source: &'a str,
    target: &'a str,
    is_group_link: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_link: Option<Box<LinkJson<'a>>>,
}

#[derive(Serialize)]
struct GraphJson<'a> {
    nodes: Vec<NodeJson<'a>>,
    links: Vec<LinkJson<'a>>,
}

impl<'a> From<&'a Node> for NodeJson<'a> {
    fn from(node: &'a Node) -> Self {
        let group = node.group.as_ref();
        Self {
            id: &node.id,
            name: &node.name,
            node_type: node.node_type,
            is_group: group.map(|_| true),
            expanded_state: group.map(|info| info.expanded),
            prefix: group.map(|info| info.prefix.as_str()),
            members: group.map(|info| info.members.as_slice()),
        }
    }
}

impl<'a> From<&'a Link> for LinkJson<'a> {
    fn from(link: &'a Link) -> Self {
        Self {
            source: &link.source,
            target: &link.target,
            is_group_link: link.is_group_link,
            original_link: link
                .original_link
                .as_deref()
                .map(|original| Box::new(LinkJson::from(original))),
        }
    }
}

/// Serializes a snapshot in the payload shape, so a dump can be loaded back.
pub fn snapshot_to_json(snapshot: &GraphSnapshot) -> Result<String> {
    let graph = GraphJson {
        nodes: snapshot.nodes.iter().map(NodeJson::from).collect(),
        links: snapshot.links.iter().map(LinkJson::from).collect(),
    };
    serde_json::to_string_pretty(&graph).context("failed to serialize graph snapshot")
}
