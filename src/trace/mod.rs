mod collect;
mod imports;

pub use collect::{TraceOptions, build_import_graph};
