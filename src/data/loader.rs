//! JSON ingestion of raw topology descriptions

use crate::config::NormalizeConfig;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, Link, Location, Node};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Node fields that are not copied into `attributes`
const NODE_FIELDS: &[&str] = &["id", "location", "link_count", "linkCount", "secondaryAddresses"];
const LINK_FIELDS: &[&str] = &["source", "target", "cost"];

/// Read and validate a raw graph from a JSON file
pub fn load_graph(path: impl AsRef<Path>, config: &NormalizeConfig) -> anyhow::Result<Graph> {
    let path = path.as_ref();
    log::info!("Loading graph from {}", path.display());

    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let graph = parse_graph(&value, config)?;

    log::info!("Loaded {} nodes and {} links", graph.nodes.len(), graph.links.len());
    Ok(graph)
}

/// Validate the shape of a raw JSON graph and convert it.
///
/// `nodes` is required, `links` defaults to empty. A malformed `location` is
/// treated as no location rather than an error.
pub fn parse_graph(value: &Value, config: &NormalizeConfig) -> Result<Graph> {
    let root = value
        .as_object()
        .ok_or_else(|| GraphError::validation("graph must be a JSON object"))?;

    let nodes = match root.get("nodes") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_node(item, i, &config.address_field))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(GraphError::validation("'nodes' must be an array")),
        None => return Err(GraphError::validation("graph has no 'nodes' array")),
    };

    let links = match root.get("links") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_link(item, i))
            .collect::<Result<Vec<_>>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(GraphError::validation("'links' must be an array")),
    };

    Ok(Graph::new(nodes, links))
}

fn parse_node(value: &Value, position: usize, address_field: &str) -> Result<Node> {
    let obj = value
        .as_object()
        .ok_or_else(|| GraphError::validation(format!("node {} is not an object", position)))?;

    let id = match obj.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => {
            return Err(GraphError::validation(format!(
                "node {} is missing a string 'id'",
                position
            )))
        }
    };

    let addresses = obj
        .get(address_field)
        .or_else(|| obj.get("secondaryAddresses"))
        .map(|v| parse_addresses(v, &id))
        .transpose()?
        .unwrap_or_default();

    let attributes: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !NODE_FIELDS.contains(&k.as_str()) && k.as_str() != address_field)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut node = Node::new(id).with_addresses(addresses);
    node.location = obj.get("location").and_then(parse_location);
    node.attributes = attributes;
    Ok(node)
}

fn parse_addresses(value: &Value, id: &str) -> Result<Vec<String>> {
    let invalid = || GraphError::validation(format!("addresses of node '{}' must be an array of strings", id));
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|a| a.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn parse_location(value: &Value) -> Option<Location> {
    let lat = value.get("lat")?.as_f64()?;
    let lng = value.get("lng")?.as_f64()?;
    Some(Location::new(lat, lng))
}

fn parse_link(value: &Value, position: usize) -> Result<Link> {
    let obj = value
        .as_object()
        .ok_or_else(|| GraphError::validation(format!("link {} is not an object", position)))?;

    let endpoint = |key: &str| match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(GraphError::validation(format!(
            "link {} is missing a string '{}'",
            position, key
        ))),
    };
    let mut link = Link::new(endpoint("source")?, endpoint("target")?);

    link.cost = match obj.get("cost") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_f64().ok_or_else(|| {
            GraphError::validation(format!("link {} has a non-numeric cost", position))
        })?),
    };

    link.attributes = obj
        .iter()
        .filter(|(k, _)| !LINK_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_graph() {
        let raw = json!({
            "nodes": [
                {"id": "n1", "local_addresses": ["10.0.0.1"], "location": {"lat": 45.0, "lng": 9.0}, "status": "up"},
                {"id": "n2", "location": "somewhere"}
            ],
            "links": [{"source": "10.0.0.1", "target": "n2", "cost": 1.5, "type": "wireless"}]
        });
        let graph = parse_graph(&raw, &NormalizeConfig::default()).unwrap();

        assert_eq!(graph.nodes[0].secondary_addresses, vec!["10.0.0.1".to_string()]);
        assert_eq!(graph.nodes[0].location, Some(Location::new(45.0, 9.0)));
        assert_eq!(graph.nodes[0].attribute("status"), Some(&json!("up")));
        assert!(graph.nodes[0].attribute("local_addresses").is_none());
        assert_eq!(graph.nodes[1].location, None);
        assert_eq!(graph.links[0].cost, Some(1.5));
        assert_eq!(graph.links[0].attributes.get("type"), Some(&json!("wireless")));
    }

    #[test]
    fn test_serialized_graph_loads_back() {
        let graph = Graph::new(
            vec![
                Node::new("n1")
                    .with_addresses(["10.0.0.1"])
                    .with_location(45.0, 9.0)
                    .with_attribute("status", "up"),
                Node::new("n2"),
            ],
            vec![Link::new("n1", "n2").with_cost(3.0)],
        );
        let normalized = crate::graph::normalize(graph).unwrap();
        let raw = serde_json::to_value(&normalized).unwrap();
        let reloaded = parse_graph(&raw, &NormalizeConfig::default()).unwrap();

        assert_eq!(reloaded.nodes[0].attribute("status"), Some(&json!("up")));
        assert!(reloaded.nodes[0].attribute("attributes").is_none());
        assert!(reloaded.nodes[0].attribute("link_count").is_none());
        assert_eq!(reloaded.nodes[0].secondary_addresses, vec!["10.0.0.1".to_string()]);
        assert_eq!(reloaded.links, normalized.links);
    }

    #[test]
    fn test_custom_address_field() {
        let raw = json!({"nodes": [{"id": "n1", "macs": ["aa:bb"]}]});
        let config = NormalizeConfig::default().with_address_field("macs");
        let graph = parse_graph(&raw, &config).unwrap();
        assert_eq!(graph.nodes[0].secondary_addresses, vec!["aa:bb".to_string()]);
        assert!(graph.links.is_empty());
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let config = NormalizeConfig::default();
        let cases = [
            json!([]),
            json!({"links": []}),
            json!({"nodes": {}}),
            json!({"nodes": [{"name": "no id"}]}),
            json!({"nodes": [{"id": 7}]}),
            json!({"nodes": [{"id": "a", "local_addresses": "10.0.0.1"}]}),
            json!({"nodes": [{"id": "a"}], "links": [{"source": "a"}]}),
            json!({"nodes": [{"id": "a"}], "links": [{"source": "a", "target": "b", "cost": "x"}]}),
        ];
        for raw in &cases {
            assert!(
                matches!(parse_graph(raw, &config), Err(GraphError::Validation(_))),
                "expected validation error for {}",
                raw
            );
        }
    }
}
