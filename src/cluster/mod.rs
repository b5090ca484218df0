//! Geographic clustering of located nodes

pub mod builder;
pub mod overlap;

pub use builder::build_clusters;
pub use overlap::resolve_overlaps;

use crate::config::ClusterConfig;
use crate::geo::Projector;
use crate::graph::{Link, Location, NormalizedGraph, Node};
use serde::Serialize;

/// Attribute value used when no clustering attribute applies
pub const DEFAULT_GROUP: &str = "default";

/// Co-located nodes drawn as one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Sequence number, unique within one clustering pass
    pub id: u32,

    /// Position of the symbol; moved by overlap resolution
    pub centroid: Location,

    /// Members of this cluster (always two or more)
    pub member_nodes: Vec<Node>,

    /// Shared clustering attribute value, or [`DEFAULT_GROUP`]
    pub attribute_value: String,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.member_nodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.member_nodes.iter().any(|n| n.id == id)
    }
}

/// Result of a clustering pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterOutput {
    pub clusters: Vec<Cluster>,

    /// Located nodes drawn individually, possibly moved by overlap resolution
    pub non_cluster_nodes: Vec<Node>,

    /// Links whose endpoints are both non-cluster nodes
    pub non_cluster_links: Vec<Link>,

    /// Ids of nodes left out for lacking a usable location
    pub excluded: Vec<String>,
}

/// Cluster a normalized graph and spread the result apart on screen.
///
/// Node records in `graph` are never modified; positions in the output are
/// copies.
pub fn cluster(
    graph: &NormalizedGraph,
    projector: &dyn Projector,
    config: &ClusterConfig,
) -> ClusterOutput {
    let mut output = build_clusters(&graph.nodes, &graph.links, projector, config);
    resolve_overlaps(
        &mut output.clusters,
        &mut output.non_cluster_nodes,
        projector,
        &config.symbol_size,
        config.max_overlap_iterations,
        config.overlap_padding,
    );
    output
}
