use std::path::PathBuf;

use anyhow::Result;

use crate::graph::{GraphSnapshot, load_graph_file};
use crate::trace::{TraceOptions, build_import_graph};

/// Where the viewer gets its graph from. Loading is repeatable so the viewer
/// can reload.
#[derive(Clone, Debug)]
pub enum GraphSource {
    Trace { entry: PathBuf, options: TraceOptions },
    File(PathBuf),
}

impl GraphSource {
    pub fn load(&self) -> Result<GraphSnapshot> {
        match self {
            Self::Trace { entry, options } => build_import_graph(entry, options),
            Self::File(path) => load_graph_file(path),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Trace { entry, .. } => entry.display().to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}
