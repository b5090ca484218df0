//! Export of a normalized graph to petgraph for downstream analysis

use crate::graph::NormalizedGraph;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

/// Undirected view of a normalized graph. Node weights are canonical ids,
/// edge weights are link costs.
pub struct Adjacency {
    pub graph: UnGraph<String, Option<f64>>,
    pub index: HashMap<String, NodeIndex>,
}

impl Adjacency {
    pub fn degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map(|&idx| self.graph.neighbors(idx).count())
            .unwrap_or(0)
    }
}

impl NormalizedGraph {
    /// Build an undirected petgraph graph with one edge per link
    pub fn to_undirected(&self) -> Adjacency {
        let mut graph = UnGraph::with_capacity(self.nodes.len(), self.links.len());
        let mut index = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let idx = graph.add_node(node.id.clone());
            index.insert(node.id.clone(), idx);
        }

        for link in &self.links {
            // Endpoints always exist after normalization
            if let (Some(&a), Some(&b)) = (index.get(&link.source), index.get(&link.target)) {
                graph.add_edge(a, b, link.cost);
            }
        }

        Adjacency { graph, index }
    }
}
