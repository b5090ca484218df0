//! Grouping of nearby nodes into clusters

use crate::cluster::{Cluster, ClusterOutput, DEFAULT_GROUP};
use crate::config::{ClusterConfig, SymbolSize};
use crate::geo::{Point, Projector};
use crate::graph::{value_key, Link, Location, Node};
use crate::spatial::build_index;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

/// Located node with its projected position
struct Placed<'a> {
    node: &'a Node,
    location: Location,
    point: Point,
}

/// Nodes of one neighbourhood sharing a clustering attribute value
struct AttributeGroup {
    value: String,
    members: Vec<usize>,
}

/// Project every node with a usable location. Returns placed nodes in input
/// order and the ids of nodes left out.
fn project_nodes<'a>(
    nodes: &'a [Node],
    projector: &dyn Projector,
    parallel_threshold: usize,
) -> (Vec<Placed<'a>>, Vec<String>) {
    let project = |node: &'a Node| {
        node.valid_location()
            .map(|location| (location, projector.project(location)))
            .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
    };

    // For small inputs, project sequentially
    let points: Vec<Option<(Location, Point)>> = if nodes.len() >= parallel_threshold {
        nodes.par_iter().map(project).collect()
    } else {
        nodes.iter().map(project).collect()
    };

    let mut placed = Vec::with_capacity(nodes.len());
    let mut excluded = Vec::new();
    for (node, point) in nodes.iter().zip(points) {
        match point {
            Some((location, point)) => placed.push(Placed { node, location, point }),
            None => {
                log::debug!("Node {} has no usable location; excluded from clustering", node.id);
                excluded.push(node.id.clone());
            }
        }
    }
    (placed, excluded)
}

/// Split a neighbourhood into location buckets: nodes whose pixel positions
/// round to the same coordinate. Buckets keep first-seen order.
fn group_by_location(placed: &[Placed<'_>], members: &[usize]) -> Vec<Vec<usize>> {
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut positions: HashMap<(i64, i64), usize> = HashMap::new();

    for &i in members {
        let p = placed[i].point;
        let key = (p.x.round() as i64, p.y.round() as i64);
        match positions.get(&key) {
            Some(&pos) => buckets[pos].push(i),
            None => {
                positions.insert(key, buckets.len());
                buckets.push(vec![i]);
            }
        }
    }
    buckets
}

/// Split a location bucket by clustering attribute, keeping first-seen order
fn group_by_attribute(
    placed: &[Placed<'_>],
    members: &[usize],
    attribute: Option<&str>,
) -> Vec<AttributeGroup> {
    let mut groups: Vec<AttributeGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for &i in members {
        let value = attribute
            .and_then(|attr| placed[i].node.attribute(attr))
            .map(value_key)
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());

        match positions.get(&value) {
            Some(&pos) => groups[pos].members.push(i),
            None => {
                positions.insert(value.clone(), groups.len());
                groups.push(AttributeGroup { value, members: vec![i] });
            }
        }
    }
    groups
}

/// Distance from a shared anchor at which `n` groups sit on a circle without
/// their symbols touching.
pub fn separation_distance(
    group_sizes: &[usize],
    symbol_size: &SymbolSize,
    base_separation: f64,
    padding: f64,
) -> f64 {
    let n = group_sizes.len();
    if n < 2 {
        return 0.0;
    }
    let max_size = group_sizes
        .iter()
        .map(|&count| symbol_size.diameter(count))
        .fold(0.0, f64::max);
    // 2 * R * sin(pi / n) >= max_size
    let radius = max_size / (2.0 * (PI / n as f64).sin());
    base_separation.max(radius + padding)
}

fn mean_point(placed: &[Placed<'_>], members: &[usize]) -> Point {
    let n = members.len() as f64;
    let (sx, sy) = members
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &i| (sx + placed[i].point.x, sy + placed[i].point.y));
    Point::new(sx / n, sy / n)
}

/// Turn one location bucket into clusters and unclustered nodes
fn place_bucket(
    placed: &[Placed<'_>],
    bucket: &[usize],
    projector: &dyn Projector,
    config: &ClusterConfig,
    clusters: &mut Vec<Cluster>,
    non_cluster_nodes: &mut Vec<Node>,
) {
    let groups = group_by_attribute(placed, bucket, config.clustering_attribute.as_deref());
    let n = groups.len();
    let anchor = mean_point(placed, bucket);
    let sizes: Vec<usize> = groups.iter().map(|g| g.members.len()).collect();
    let separation = separation_distance(
        &sizes,
        &config.symbol_size,
        config.cluster_separation,
        config.separation_padding,
    );

    for (group_index, group) in groups.into_iter().enumerate() {
        if group.members.len() < 2 {
            for &j in &group.members {
                non_cluster_nodes.push(placed[j].node.clone());
            }
            continue;
        }

        let count = group.members.len() as f64;
        let centroid = if n > 1 {
            let angle = 2.0 * PI * group_index as f64 / n as f64;
            projector.unproject(Point::new(
                anchor.x + separation * angle.cos(),
                anchor.y + separation * angle.sin(),
            ))
        } else {
            let (lat, lng) = group.members.iter().fold((0.0, 0.0), |(lat, lng), &j| {
                (lat + placed[j].location.lat, lng + placed[j].location.lng)
            });
            Location::new(lat / count, lng / count)
        };

        clusters.push(Cluster {
            id: clusters.len() as u32,
            centroid,
            member_nodes: group.members.iter().map(|&j| placed[j].node.clone()).collect(),
            attribute_value: group.value,
        });
    }
}

/// Group located nodes that lie within `cluster_radius` pixels of each other.
///
/// Each neighbourhood is split into location buckets by rounded pixel
/// position, and each bucket by the clustering attribute. When a bucket holds
/// several attribute groups, they are spaced evenly on a circle around the
/// bucket's position. Groups of one node stay unclustered. Only links between
/// two unclustered nodes are kept.
pub fn build_clusters(
    nodes: &[Node],
    links: &[Link],
    projector: &dyn Projector,
    config: &ClusterConfig,
) -> ClusterOutput {
    let (placed, excluded) = project_nodes(nodes, projector, config.parallel_threshold);
    log::info!(
        "Clustering {} located nodes ({} excluded) with radius {}",
        placed.len(),
        excluded.len(),
        config.cluster_radius
    );

    let points: Vec<Point> = placed.iter().map(|p| p.point).collect();
    let index = build_index(&points, config.cluster_radius.max(1.0));

    let mut visited = vec![false; placed.len()];
    let mut clusters = Vec::new();
    let mut non_cluster_nodes = Vec::new();

    for i in 0..placed.len() {
        if visited[i] {
            continue;
        }

        let p = placed[i].point;
        let mut neighbors: Vec<usize> = index
            .within(p.x, p.y, config.cluster_radius)
            .into_iter()
            .filter(|&j| !visited[j])
            .collect();
        neighbors.sort_unstable();

        if neighbors.len() <= 1 {
            visited[i] = true;
            non_cluster_nodes.push(placed[i].node.clone());
            continue;
        }

        for &j in &neighbors {
            visited[j] = true;
        }

        for bucket in group_by_location(&placed, &neighbors) {
            place_bucket(&placed, &bucket, projector, config, &mut clusters, &mut non_cluster_nodes);
        }
    }

    let visible: HashSet<&str> = non_cluster_nodes.iter().map(|n| n.id.as_str()).collect();
    let non_cluster_links: Vec<Link> = links
        .iter()
        .filter(|l| visible.contains(l.source.as_str()) && visible.contains(l.target.as_str()))
        .cloned()
        .collect();

    log::info!(
        "Built {} clusters, {} unclustered nodes, {} visible links",
        clusters.len(),
        non_cluster_nodes.len(),
        non_cluster_links.len()
    );

    ClusterOutput { clusters, non_cluster_nodes, non_cluster_links, excluded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Equirectangular;

    fn located(id: &str, lat: f64, lng: f64) -> Node {
        Node::new(id).with_location(lat, lng)
    }

    #[test]
    fn test_separation_for_two_groups() {
        // Two groups face each other, so R only needs half a symbol
        let d = separation_distance(&[2, 2], &SymbolSize::Fixed(30.0), 20.0, 10.0);
        assert_eq!(d, 25.0);
        let d = separation_distance(&[2, 2], &SymbolSize::Fixed(30.0), 40.0, 10.0);
        assert_eq!(d, 40.0);
        assert_eq!(separation_distance(&[3], &SymbolSize::Fixed(30.0), 40.0, 10.0), 0.0);
    }

    #[test]
    fn test_separation_keeps_neighbors_apart() {
        let sizes = [2, 3, 4, 5, 6];
        let symbol = SymbolSize::Scaled { base: 10.0, per_member: 4.0, max: 60.0 };
        let d = separation_distance(&sizes, &symbol, 0.0, 0.0);
        let chord = 2.0 * d * (PI / sizes.len() as f64).sin();
        assert!(chord >= symbol.diameter(6) - 1e-9);
    }

    #[test]
    fn test_sub_pixel_offsets_share_a_bucket() {
        let projector = Equirectangular::new(10.0);
        // Pixel positions (0, 0), (0.2, -0.2) and (0, -0.1) all round to the origin
        let nodes = vec![located("a", 0.0, 0.0), located("b", 0.02, 0.02), located("c", 0.01, 0.0)];
        let output = build_clusters(&nodes, &[], &projector, &ClusterConfig::new(10.0));

        assert_eq!(output.clusters.len(), 1);
        let cluster = &output.clusters[0];
        assert_eq!(cluster.size(), 3);
        assert_eq!(cluster.attribute_value, DEFAULT_GROUP);
        assert!((cluster.centroid.lat - 0.01).abs() < 1e-9);
        assert!((cluster.centroid.lng - 0.02 / 3.0).abs() < 1e-9);
        assert!(output.non_cluster_nodes.is_empty());
    }

    #[test]
    fn test_colocated_pairs_in_one_neighbourhood_form_separate_clusters() {
        let projector = Equirectangular::new(10.0);
        // a, b at pixel (0, 0) and c, d at pixel (5, 0), all within the radius
        let nodes = vec![
            located("a", 0.0, 0.0),
            located("b", 0.0, 0.0),
            located("c", 0.0, 0.5),
            located("d", 0.0, 0.5),
        ];
        let output = build_clusters(&nodes, &[], &projector, &ClusterConfig::new(10.0));

        assert_eq!(output.clusters.len(), 2);
        let members: Vec<Vec<&str>> = output
            .clusters
            .iter()
            .map(|c| c.member_nodes.iter().map(|n| n.id.as_str()).collect())
            .collect();
        assert_eq!(members, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(output.clusters[0].centroid, Location::new(0.0, 0.0));
        assert_eq!(output.clusters[1].centroid, Location::new(0.0, 0.5));
        assert!(output.non_cluster_nodes.is_empty());
    }

    #[test]
    fn test_distinct_nearby_nodes_stay_unclustered() {
        let projector = Equirectangular::new(10.0);
        // Pixel (0, 0) and (3, 0): neighbours, but different buckets
        let nodes = vec![located("a", 0.0, 0.0), located("b", 0.0, 0.3)];
        let links = vec![Link::new("a", "b")];
        let output = build_clusters(&nodes, &links, &projector, &ClusterConfig::new(10.0));

        assert!(output.clusters.is_empty());
        let ids: Vec<&str> = output.non_cluster_nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(output.non_cluster_links, links);
    }

    #[test]
    fn test_unlocated_nodes_are_excluded() {
        let projector = Equirectangular::new(10.0);
        let nodes = vec![
            located("a", 0.0, 0.0),
            Node::new("b"),
            located("c", 95.0, 0.0),
            located("d", 50.0, 50.0),
        ];
        let links = vec![Link::new("a", "b"), Link::new("a", "d")];
        let output = build_clusters(&nodes, &links, &projector, &ClusterConfig::new(10.0));

        assert_eq!(output.excluded, vec!["b".to_string(), "c".to_string()]);
        let ids: Vec<&str> = output.non_cluster_nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(output.non_cluster_links, vec![Link::new("a", "d")]);
    }

    #[test]
    fn test_singleton_attribute_group_stays_unclustered() {
        let projector = Equirectangular::new(10.0);
        let nodes = vec![
            located("a", 0.0, 0.0).with_attribute("status", "up"),
            located("b", 0.0, 0.0).with_attribute("status", "up"),
            located("c", 0.0, 0.0).with_attribute("status", "down"),
        ];
        let links = vec![Link::new("a", "c"), Link::new("b", "c")];
        let config = ClusterConfig::new(10.0).with_attribute("status");
        let output = build_clusters(&nodes, &links, &projector, &config);

        assert_eq!(output.clusters.len(), 1);
        assert_eq!(output.clusters[0].attribute_value, "up");
        assert_eq!(output.non_cluster_nodes.len(), 1);
        assert_eq!(output.non_cluster_nodes[0].id, "c");
        // Links touching clustered nodes are hidden
        assert!(output.non_cluster_links.is_empty());
    }

    #[test]
    fn test_parallel_projection_matches_sequential() {
        let projector = Equirectangular::new(10.0);
        let nodes: Vec<Node> = (0..50)
            .map(|i| located(&format!("n{}", i), (i / 10) as f64 * 5.0, (i % 10) as f64 * 5.0))
            .collect();
        let sequential = build_clusters(&nodes, &[], &projector, &ClusterConfig::new(10.0));
        let mut config = ClusterConfig::new(10.0);
        config.parallel_threshold = 1;
        let parallel = build_clusters(&nodes, &[], &projector, &config);
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.non_cluster_nodes.len(), 50);
    }
}
