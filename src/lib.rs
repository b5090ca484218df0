//! Topology normalization and geographic clustering for network graphs

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod geo;
pub mod graph;
pub mod spatial;

pub use cluster::{cluster, Cluster, ClusterOutput};
pub use config::{ClusterConfig, NormalizeConfig, SymbolSize};
pub use error::{GraphError, Result};
pub use geo::{Equirectangular, Point, Projector, WebMercator};
pub use graph::{normalize, Graph, Link, Location, NormalizedGraph, Node};
