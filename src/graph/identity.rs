//! Canonical id and secondary address lookup

use crate::error::{GraphError, Result};
use crate::graph::Node;
use rayon::prelude::*;
use std::collections::HashMap;

/// Node count from which address collection fans out across threads
const PARALLEL_THRESHOLD: usize = 10_000;

/// A secondary address declared by more than one node
#[derive(Debug, Clone, PartialEq)]
pub struct AddressCollision {
    pub address: String,
    /// Node that owned the address before being overridden
    pub previous: String,
    /// Node that owns the address now
    pub current: String,
}

/// Lookup from canonical ids and secondary addresses to their nodes.
///
/// When two nodes declare the same address, the later node wins.
#[derive(Debug)]
pub struct IdentityIndex<'a> {
    by_id: HashMap<&'a str, &'a Node>,
    by_address: HashMap<&'a str, &'a Node>,
    collisions: Vec<AddressCollision>,
}

impl<'a> IdentityIndex<'a> {
    /// Index the given nodes. Every node needs a non-empty id.
    pub fn build(nodes: &'a [Node]) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(GraphError::validation(format!(
                    "node at position {} has an empty id",
                    position
                )));
            }
            by_id.entry(node.id.as_str()).or_insert(node);
        }

        // Collected in input order so that last-write-wins is stable
        let pairs: Vec<(&'a str, &'a Node)> = if nodes.len() >= PARALLEL_THRESHOLD {
            nodes
                .par_iter()
                .flat_map_iter(|node| {
                    node.secondary_addresses.iter().map(move |a| (a.as_str(), node))
                })
                .collect()
        } else {
            nodes
                .iter()
                .flat_map(|node| {
                    node.secondary_addresses.iter().map(move |a| (a.as_str(), node))
                })
                .collect()
        };

        let mut by_address: HashMap<&'a str, &'a Node> = HashMap::with_capacity(pairs.len());
        let mut collisions = Vec::new();
        for (address, node) in pairs {
            if let Some(previous) = by_address.insert(address, node) {
                if previous.id != node.id {
                    log::warn!(
                        "Address {} declared by both {} and {}; keeping {}",
                        address, previous.id, node.id, node.id
                    );
                    collisions.push(AddressCollision {
                        address: address.to_string(),
                        previous: previous.id.clone(),
                        current: node.id.clone(),
                    });
                }
            }
        }

        log::debug!(
            "Indexed {} node ids and {} secondary addresses",
            by_id.len(),
            by_address.len()
        );

        Ok(Self { by_id, by_address, collisions })
    }

    pub fn by_id(&self, id: &str) -> Option<&'a Node> {
        self.by_id.get(id).copied()
    }

    pub fn by_address(&self, address: &str) -> Option<&'a Node> {
        self.by_address.get(address).copied()
    }

    /// Canonical id for an endpoint. Known ids take precedence over
    /// addresses.
    pub fn resolve(&self, endpoint: &str) -> Option<&'a str> {
        self.by_id(endpoint)
            .or_else(|| self.by_address(endpoint))
            .map(|node| node.id.as_str())
    }

    pub fn collisions(&self) -> &[AddressCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
