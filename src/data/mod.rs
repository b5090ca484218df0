//! Raw input loading

pub mod loader;

pub use loader::{load_graph, parse_graph};
