//! Link endpoint rewriting, deduplication and degree annotation

use crate::error::{GraphError, Result};
use crate::graph::dedup::{dedupe, KeyStrategy};
use crate::graph::identity::{AddressCollision, IdentityIndex};
use crate::graph::{Graph, Link, Node};
use serde::Serialize;
use std::collections::HashMap;

/// Diagnostics collected during normalization. Nothing here is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    /// Ids of dropped duplicate nodes
    pub duplicate_nodes: Vec<String>,
    /// Number of links dropped as duplicates of an earlier link
    pub duplicate_links: usize,
    /// Links that became self-loops after address rewriting, as (source, target) before rewriting
    pub collapsed_self_loops: Vec<(String, String)>,
    /// Number of endpoints rewritten from an address to a canonical id
    pub rewritten_endpoints: usize,
    /// Addresses claimed by more than one node
    #[serde(skip)]
    pub address_collisions: Vec<AddressCollision>,
}

/// A graph whose links all join two distinct, existing canonical ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    #[serde(skip)]
    pub report: NormalizeReport,
}

impl NormalizedGraph {
    /// Drop the report and return the plain graph
    pub fn into_graph(self) -> Graph {
        Graph::new(self.nodes, self.links)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Normalize a raw graph.
///
/// Nodes are deduplicated by id (first wins), link endpoints given as
/// secondary addresses are rewritten to canonical ids, self-loops created by
/// that rewrite are dropped, links are deduplicated regardless of direction,
/// and `link_count` is recomputed from the surviving links.
///
/// A link that is a self-loop in the raw input fails the whole call with
/// [`GraphError::DuplicateLinkSourceTarget`]; an unresolvable endpoint fails
/// it with [`GraphError::MissingNode`].
pub fn normalize(graph: Graph) -> Result<NormalizedGraph> {
    let Graph { nodes, links } = graph;
    log::info!("Normalizing graph with {} nodes and {} links", nodes.len(), links.len());

    let mut report = NormalizeReport::default();

    // 1. Nodes by id, first occurrence wins
    let deduped = dedupe(nodes, &KeyStrategy::fields(["id"]), true);
    report.duplicate_nodes = deduped.dropped;
    let mut nodes = deduped.items;

    // 2-4. Resolve endpoints against the surviving nodes
    let resolved = {
        let index = IdentityIndex::build(&nodes)?;
        report.address_collisions = index.collisions().to_vec();
        resolve_links(&index, links, &mut report)?
    };

    // 5. Links regardless of direction, first occurrence wins
    let deduped = dedupe(resolved, &KeyStrategy::fields(["source", "target"]), false);
    report.duplicate_links = deduped.dropped.len();
    let links = deduped.items;

    // 6. Degree from the output link set
    let mut counts: HashMap<&str, u32> = HashMap::with_capacity(nodes.len());
    for link in &links {
        *counts.entry(link.source.as_str()).or_insert(0) += 1;
        *counts.entry(link.target.as_str()).or_insert(0) += 1;
    }
    for node in &mut nodes {
        node.link_count = counts.get(node.id.as_str()).copied().unwrap_or(0);
    }

    log::info!(
        "Normalized graph has {} nodes and {} links ({} duplicate nodes, {} duplicate links, {} collapsed self-loops)",
        nodes.len(),
        links.len(),
        report.duplicate_nodes.len(),
        report.duplicate_links,
        report.collapsed_self_loops.len()
    );

    Ok(NormalizedGraph { nodes, links, report })
}

fn resolve_links(
    index: &IdentityIndex<'_>,
    links: Vec<Link>,
    report: &mut NormalizeReport,
) -> Result<Vec<Link>> {
    let mut resolved = Vec::with_capacity(links.len());

    for (link_index, mut link) in links.into_iter().enumerate() {
        if link.source.is_empty() || link.target.is_empty() {
            return Err(GraphError::validation(format!(
                "link {} has an empty endpoint",
                link_index
            )));
        }
        if link.source == link.target {
            return Err(GraphError::DuplicateLinkSourceTarget {
                node: link.source,
                link_index,
            });
        }

        let source = resolve_endpoint(index, &link.source, link_index)?;
        let target = resolve_endpoint(index, &link.target, link_index)?;

        if source == target {
            log::debug!(
                "Dropping link {} -> {}: both endpoints belong to {}",
                link.source, link.target, source
            );
            report.collapsed_self_loops.push((link.source, link.target));
            continue;
        }

        if source != link.source {
            report.rewritten_endpoints += 1;
            link.source = source.to_string();
        }
        if target != link.target {
            report.rewritten_endpoints += 1;
            link.target = target.to_string();
        }
        resolved.push(link);
    }

    Ok(resolved)
}

fn resolve_endpoint<'a>(
    index: &IdentityIndex<'a>,
    endpoint: &str,
    link_index: usize,
) -> Result<&'a str> {
    index.resolve(endpoint).ok_or_else(|| GraphError::MissingNode {
        endpoint: endpoint.to_string(),
        link_index,
    })
}
