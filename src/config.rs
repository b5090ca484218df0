//! Configuration for normalization and clustering passes

use serde::{Deserialize, Serialize};

/// Name of the node field holding secondary addresses in raw input
pub const DEFAULT_ADDRESS_FIELD: &str = "local_addresses";

/// Settings for turning raw JSON into a [`crate::graph::Graph`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Node field listing secondary addresses
    pub address_field: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            address_field: DEFAULT_ADDRESS_FIELD.to_string(),
        }
    }
}

impl NormalizeConfig {
    /// Builder: set the address field name.
    pub fn with_address_field(mut self, field: impl Into<String>) -> Self {
        self.address_field = field.into();
        self
    }
}

/// Rendered symbol diameter, in pixels, as a function of member count.
///
/// Singleton nodes use a count of 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolSize {
    Fixed(f64),
    Scaled { base: f64, per_member: f64, max: f64 },
    #[serde(skip)]
    Custom(fn(usize) -> f64),
}

impl SymbolSize {
    pub fn diameter(&self, count: usize) -> f64 {
        let size = match *self {
            SymbolSize::Fixed(size) => size,
            SymbolSize::Scaled { base, per_member, max } => {
                (base + per_member * count as f64).min(max)
            }
            SymbolSize::Custom(f) => f(count),
        };
        if size.is_finite() { size.max(0.0) } else { 0.0 }
    }
}

impl Default for SymbolSize {
    fn default() -> Self {
        SymbolSize::Fixed(30.0)
    }
}

/// Settings for a clustering pass. Distances are in projected pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Neighbor search radius
    pub cluster_radius: f64,

    /// Node attribute used to split co-located groups
    pub clustering_attribute: Option<String>,

    /// Minimum offset of a group from its shared anchor
    pub cluster_separation: f64,

    /// Symbol diameter used for separation and overlap checks
    pub symbol_size: SymbolSize,

    /// Extra room added to the computed separation radius
    pub separation_padding: f64,

    /// Gap enforced between discs by the overlap pass
    pub overlap_padding: f64,

    /// Upper bound on overlap passes
    pub max_overlap_iterations: usize,

    /// Located node count from which projection runs in parallel
    pub parallel_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_radius: 30.0,
            clustering_attribute: None,
            cluster_separation: 20.0,
            symbol_size: SymbolSize::default(),
            separation_padding: 10.0,
            overlap_padding: 5.0,
            max_overlap_iterations: 5,
            parallel_threshold: 1000,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration with the given radius and defaults elsewhere
    pub fn new(cluster_radius: f64) -> Self {
        Self {
            cluster_radius: cluster_radius.max(0.0),
            ..Self::default()
        }
    }

    /// Builder: set the clustering attribute.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.clustering_attribute = Some(attribute.into());
        self
    }

    /// Builder: set the base separation.
    pub fn with_separation(mut self, separation: f64) -> Self {
        self.cluster_separation = separation.max(0.0);
        self
    }

    /// Builder: set the symbol size.
    pub fn with_symbol_size(mut self, symbol_size: SymbolSize) -> Self {
        self.symbol_size = symbol_size;
        self
    }

    /// Builder: set overlap padding.
    pub fn with_overlap_padding(mut self, padding: f64) -> Self {
        self.overlap_padding = padding.max(0.0);
        self
    }

    /// Builder: set the overlap iteration cap.
    pub fn with_max_overlap_iterations(mut self, iterations: usize) -> Self {
        self.max_overlap_iterations = iterations;
        self
    }
}
