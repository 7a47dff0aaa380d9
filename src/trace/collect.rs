use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

use super::imports::ImportScanner;
use crate::graph::{GraphSnapshot, Link, Node, NodeType};

#[derive(Clone, Debug)]
pub struct TraceOptions {
    pub project_root: PathBuf,
    pub include_third_party: bool,
    pub include_conditional_imports: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            include_third_party: false,
            include_conditional_imports: false,
        }
    }
}

/// Follows Python imports from `entry` and returns the resulting graph.
///
/// Node ids are paths relative to the project root. A relative `entry` is
/// resolved against the project root, not the working directory.
pub fn build_import_graph(entry: &Path, options: &TraceOptions) -> Result<GraphSnapshot> {
    let root = fs::canonicalize(&options.project_root).with_context(|| {
        format!(
            "project root {} does not exist",
            options.project_root.display()
        )
    })?;

    let entry_path = if entry.is_absolute() {
        entry.to_path_buf()
    } else {
        root.join(entry)
    };
    let entry_path = fs::canonicalize(&entry_path)
        .with_context(|| format!("entry file {} does not exist", entry.display()))?;
    if !entry_path.is_file() {
        bail!("entry {} is not a file", entry.display());
    }

    let relative = entry_path.strip_prefix(&root).map_err(|_| {
        anyhow!(
            "entry {} is outside the project root {}",
            entry.display(),
            root.display()
        )
    })?;
    let entry_id = relative_id(relative);

    let scanner = ImportScanner::new()?;
    let mut tracer = Tracer::new(&root, options, scanner);
    tracer.add_node(&entry_id, NodeType::Root);
    tracer.trace_file(&entry_id);

    info!(
        entry = %entry_id,
        nodes = tracer.nodes.len(),
        links = tracer.links.len(),
        "traced imports"
    );
    Ok(GraphSnapshot::new(tracer.nodes, tracer.links))
}

fn relative_id(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

struct Tracer<'a> {
    root: &'a Path,
    options: &'a TraceOptions,
    scanner: ImportScanner,
    nodes: Vec<Node>,
    node_ids: HashSet<String>,
    links: Vec<Link>,
    link_keys: HashSet<(String, String)>,
    traced: HashSet<String>,
}

impl<'a> Tracer<'a> {
    fn new(root: &'a Path, options: &'a TraceOptions, scanner: ImportScanner) -> Self {
        Self {
            root,
            options,
            scanner,
            nodes: Vec::new(),
            node_ids: HashSet::new(),
            links: Vec::new(),
            link_keys: HashSet::new(),
            traced: HashSet::new(),
        }
    }

    fn add_node(&mut self, id: &str, node_type: NodeType) {
        if self.node_ids.insert(id.to_owned()) {
            self.nodes.push(Node::new(id, id, node_type));
        }
    }

    fn add_link(&mut self, source: &str, target: &str) {
        if self
            .link_keys
            .insert((source.to_owned(), target.to_owned()))
        {
            self.links.push(Link::new(source, target));
        }
    }

    fn connect(&mut self, current: &str, id: &str, node_type: NodeType) {
        self.add_node(id, node_type);
        self.add_link(current, id);
    }

    fn trace_file(&mut self, id: &str) {
        if !self.traced.insert(id.to_owned()) {
            return;
        }

        let path = self.root.join(id);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) => {
                warn!(file = %path.display(), %error, "skipping unreadable module");
                return;
            }
        };

        let imports = match self.scanner.scan(&source) {
            Ok(imports) => imports,
            Err(error) => {
                warn!(file = %path.display(), "skipping unparsable module: {error:#}");
                return;
            }
        };

        for import in imports {
            if import.conditional && !self.options.include_conditional_imports {
                debug!(file = id, address = %import.address, "skipping conditional import");
                continue;
            }
            self.follow(id, &import.address);
        }
    }

    fn follow(&mut self, current: &str, address: &str) {
        let segments = address.split('.').collect::<Vec<_>>();
        let Some(package) = segments.first().copied() else {
            return;
        };

        if package.is_empty() {
            return;
        }

        if !self.root.join(package).is_dir() {
            if self.options.include_third_party {
                self.connect(current, package, NodeType::ThirdParty);
            }
            return;
        }

        let last = segments.len() - 1;
        for depth in 1..=last {
            let base = segments[..depth].join("/");

            if depth == last {
                let module = format!("{base}.py");
                self.connect(current, &module, NodeType::Local);
                self.trace_file(&module);
                continue;
            }

            if Path::new(current).starts_with(&base) {
                continue;
            }

            let init = format!("{base}/__init__.py");
            if self.root.join(&init).is_file() {
                self.connect(current, &init, NodeType::Local);
                self.trace_file(&init);
            }
        }
    }
}
