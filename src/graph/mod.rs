mod model;
mod payload;
mod prefix;
mod store;
mod transform;

pub use model::{GraphSnapshot, GroupInfo, Link, Node, NodeType, group_node_id};
pub use payload::{load_graph_file, parse_graph_payload, snapshot_to_json};
pub use prefix::{ExternalConnection, Group, GroupMap, compute_groups, group_prefix};
pub use store::GraphStore;
pub use transform::GroupingTransformer;
