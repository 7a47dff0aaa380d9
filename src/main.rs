use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{ArgGroup, Parser};
use depmap::app::DepMapApp;
use depmap::controller::SimulationConfig;
use depmap::graph::{GroupingTransformer, snapshot_to_json};
use depmap::source::GraphSource;
use depmap::trace::TraceOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("input").required(true).args(["entry", "graph"])))]
struct Args {
    /// Python file to trace imports from.
    entry: Option<PathBuf>,

    /// Load a `{nodes, links}` JSON graph instead of tracing.
    #[arg(long)]
    graph: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[arg(long)]
    include_third_party: bool,

    #[arg(long)]
    include_conditional_imports: bool,

    /// Print the graph as JSON and exit without opening a window.
    #[arg(long)]
    dump: bool,

    /// With --dump, print the grouped graph.
    #[arg(long, requires = "dump")]
    grouped: bool,

    #[arg(long, default_value_t = 100.0)]
    link_distance: f32,

    #[arg(long, default_value_t = 0.5)]
    link_strength: f32,

    /// Repulsion magnitude between nodes.
    #[arg(long, default_value_t = 1500.0)]
    repulsion: f32,

    #[arg(long, default_value_t = 0.02)]
    center_strength: f32,
}

impl Args {
    fn source(&self) -> Result<GraphSource> {
        if let Some(path) = &self.graph {
            return Ok(GraphSource::File(path.clone()));
        }

        let entry = self
            .entry
            .clone()
            .ok_or_else(|| anyhow!("either an entry file or --graph is required"))?;
        Ok(GraphSource::Trace {
            entry,
            options: TraceOptions {
                project_root: self.project_root.clone(),
                include_third_party: self.include_third_party,
                include_conditional_imports: self.include_conditional_imports,
            },
        })
    }

    fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            link_distance: self.link_distance,
            link_strength: self.link_strength,
            repulsion: -self.repulsion.abs(),
            center_strength: self.center_strength,
        }
    }
}

fn dump(source: &GraphSource, grouped: bool) -> Result<()> {
    let mut snapshot = source.load()?;
    if grouped {
        snapshot = GroupingTransformer::new().apply_grouping(&snapshot);
    }

    let json = snapshot_to_json(&snapshot)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("depmap=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let source = args.source()?;

    if args.dump {
        return dump(&source, args.grouped);
    }

    info!(source = %source.label(), "starting viewer");
    let config = args.simulation();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "depmap",
        options,
        Box::new(move |cc| Ok(Box::new(DepMapApp::new(cc, source.clone(), config)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}
