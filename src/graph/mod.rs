//! Graph representation, identity resolution and normalization

pub mod adjacency;
pub mod dedup;
pub mod identity;
pub mod normalize;

pub use dedup::{dedupe, Deduplicated, FieldLookup, KeyStrategy};
pub use identity::IdentityIndex;
pub use normalize::{normalize, NormalizeReport, NormalizedGraph};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within the usual latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A device in the topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical identity
    pub id: String,

    /// Alternate identifiers that may appear as link endpoints
    #[serde(
        default,
        rename = "local_addresses",
        alias = "secondaryAddresses",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub secondary_addresses: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// Free-form properties, one of which may drive clustering
    #[serde(flatten)]
    pub attributes: Map<String, Value>,

    /// Number of normalized links touching this node
    #[serde(default)]
    pub link_count: u32,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secondary_addresses: Vec::new(),
            location: None,
            attributes: Map::new(),
            link_count: 0,
        }
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some(Location::new(lat, lng));
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Location if present and usable for projection
    pub fn valid_location(&self) -> Option<Location> {
        self.location.filter(Location::is_valid)
    }

    /// Look up an attribute by dot-separated path
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.attributes, path)
    }
}

/// A connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Link {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            cost: None,
            attributes: Map::new(),
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Whether this link touches the given node id
    pub fn touches(&self, id: &str) -> bool {
        self.source == id || self.target == id
    }
}

/// Raw or normalized topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }
}

/// Walk a dot-separated path through nested JSON objects
pub(crate) fn lookup_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = map.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// String form of a JSON value used for keys and grouping
pub(crate) fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_validity() {
        assert!(Location::new(45.0, 9.0).is_valid());
        assert!(!Location::new(91.0, 9.0).is_valid());
        assert!(!Location::new(f64::NAN, 9.0).is_valid());
    }

    #[test]
    fn test_nested_attribute_lookup() {
        let node = Node::new("n1").with_attribute("site", json!({"rack": {"row": 3}}));
        assert_eq!(node.attribute("site.rack.row"), Some(&json!(3)));
        assert_eq!(node.attribute("site.missing"), None);
    }

    #[test]
    fn test_attributes_serialize_at_top_level() {
        let node = Node::new("n1").with_attribute("status", "up");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value, json!({"id": "n1", "status": "up", "link_count": 0}));

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);

        let mut link = Link::new("a", "b").with_cost(2.0);
        link.attributes.insert("type".to_string(), json!("wired"));
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            json!({"source": "a", "target": "b", "cost": 2.0, "type": "wired"})
        );
    }

    #[test]
    fn test_node_deserializes_address_alias() {
        let node: Node =
            serde_json::from_value(json!({"id": "a", "secondaryAddresses": ["10.0.0.1"]}))
                .unwrap();
        assert_eq!(node.secondary_addresses, vec!["10.0.0.1".to_string()]);
        assert_eq!(node.link_count, 0);
    }
}
