pub mod app;
pub mod controller;
pub mod graph;
pub mod source;
pub mod trace;
mod util;
