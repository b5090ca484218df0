//! Pairwise repulsion of cluster and node symbols in pixel space
//!
//! Discs are visited in a fixed order: clusters in emission order, then
//! unclustered nodes in input order, pairs as (i, j) with i < j. Each
//! adjustment is visible to the pairs that follow it in the same pass, so
//! the pass is sequential.

use crate::cluster::Cluster;
use crate::config::SymbolSize;
use crate::geo::{Point, Projector};
use crate::graph::Node;

/// Step used to pick a push direction for discs sharing a centre
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Below this distance two centres are treated as coincident
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
enum Owner {
    Cluster(usize),
    Node(usize),
}

#[derive(Debug, Clone)]
struct Disc {
    owner: Owner,
    center: Point,
    radius: f64,
    moved: bool,
}

fn collect_discs(
    clusters: &[Cluster],
    nodes: &[Node],
    projector: &dyn Projector,
    symbol_size: &SymbolSize,
) -> Vec<Disc> {
    let mut discs = Vec::with_capacity(clusters.len() + nodes.len());

    for (i, cluster) in clusters.iter().enumerate() {
        discs.push(Disc {
            owner: Owner::Cluster(i),
            center: projector.project(cluster.centroid),
            radius: symbol_size.diameter(cluster.size()) / 2.0,
            moved: false,
        });
    }

    for (i, node) in nodes.iter().enumerate() {
        // Nodes without a location have no disc
        if let Some(location) = node.valid_location() {
            discs.push(Disc {
                owner: Owner::Node(i),
                center: projector.project(location),
                radius: symbol_size.diameter(1) / 2.0,
                moved: false,
            });
        }
    }

    discs.retain(|d| d.center.x.is_finite() && d.center.y.is_finite());
    discs
}

/// Push overlapping discs apart, one pass over all pairs at a time.
/// Returns whether any disc moved during the pass.
fn relax(discs: &mut [Disc], padding: f64) -> bool {
    let mut adjusted = false;

    for i in 0..discs.len() {
        for j in (i + 1)..discs.len() {
            let dx = discs[j].center.x - discs[i].center.x;
            let dy = discs[j].center.y - discs[i].center.y;
            let distance = dx.hypot(dy);
            let required = discs[i].radius + discs[j].radius + padding;

            if distance >= required {
                continue;
            }

            let (ux, uy) = if distance > EPSILON {
                (dx / distance, dy / distance)
            } else {
                let angle = (i + j) as f64 * GOLDEN_ANGLE;
                (angle.cos(), angle.sin())
            };
            let half = (required - distance) / 2.0;

            discs[i].center.x -= ux * half;
            discs[i].center.y -= uy * half;
            discs[j].center.x += ux * half;
            discs[j].center.y += uy * half;
            discs[i].moved = true;
            discs[j].moved = true;
            adjusted = true;
        }
    }

    adjusted
}

/// Nudge clusters and unclustered nodes apart until no two symbols overlap
/// by more than `padding`, or `max_iterations` passes have run.
///
/// Moved positions are written back onto `Cluster::centroid` and
/// `Node::location`. Returns the number of passes run.
pub fn resolve_overlaps(
    clusters: &mut [Cluster],
    nodes: &mut [Node],
    projector: &dyn Projector,
    symbol_size: &SymbolSize,
    max_iterations: usize,
    padding: f64,
) -> usize {
    let mut discs = collect_discs(clusters, nodes, projector, symbol_size);
    if discs.len() < 2 {
        return 0;
    }

    let mut passes = 0;
    while passes < max_iterations {
        passes += 1;
        if !relax(&mut discs, padding) {
            break;
        }
    }

    let mut moved = 0;
    for disc in discs.iter().filter(|d| d.moved) {
        let location = projector.unproject(disc.center);
        match disc.owner {
            Owner::Cluster(i) => clusters[i].centroid = location,
            Owner::Node(i) => nodes[i].location = Some(location),
        }
        moved += 1;
    }

    log::debug!(
        "Overlap resolution moved {} of {} symbols in {} passes",
        moved,
        discs.len(),
        passes
    );

    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Equirectangular;
    use crate::graph::Location;

    fn pixel(projector: &Equirectangular, node: &Node) -> Point {
        projector.project(node.location.unwrap())
    }

    #[test]
    fn test_overlapping_nodes_are_pushed_apart() {
        let projector = Equirectangular::new(1.0);
        let mut nodes = vec![
            Node::new("a").with_location(0.0, 0.0),
            Node::new("b").with_location(0.0, 10.0),
        ];
        let passes = resolve_overlaps(&mut [], &mut nodes, &projector, &SymbolSize::Fixed(20.0), 5, 4.0);

        let a = pixel(&projector, &nodes[0]);
        let b = pixel(&projector, &nodes[1]);
        // Shortfall of 14 is split evenly between both discs
        assert!((a.x + 7.0).abs() < 1e-9);
        assert!((b.x - 17.0).abs() < 1e-9);
        assert!(a.distance(&b) >= 24.0 - 1e-9);
        assert_eq!(passes, 2);
    }

    #[test]
    fn test_separated_discs_are_untouched() {
        let projector = Equirectangular::new(1.0);
        let original = Location::new(0.0, 100.0);
        let mut nodes = vec![Node::new("a").with_location(0.0, 0.0), Node::new("b")];
        nodes[1].location = Some(original);

        let passes = resolve_overlaps(&mut [], &mut nodes, &projector, &SymbolSize::Fixed(20.0), 5, 4.0);
        assert_eq!(passes, 1);
        assert_eq!(nodes[1].location, Some(original));
    }

    #[test]
    fn test_coincident_discs_separate_deterministically() {
        let projector = Equirectangular::new(1.0);
        let make = || {
            vec![
                Node::new("a").with_location(5.0, 5.0),
                Node::new("b").with_location(5.0, 5.0),
                Node::new("c").with_location(5.0, 5.0),
            ]
        };
        let mut first = make();
        let mut second = make();
        resolve_overlaps(&mut [], &mut first, &projector, &SymbolSize::Fixed(10.0), 5, 0.0);
        resolve_overlaps(&mut [], &mut second, &projector, &SymbolSize::Fixed(10.0), 5, 0.0);

        assert_eq!(first, second);
        assert_ne!(first[0].location, first[1].location);
    }

    #[test]
    fn test_cluster_centroid_is_moved() {
        let projector = Equirectangular::new(1.0);
        let members = vec![Node::new("a").with_location(0.0, 0.0), Node::new("b").with_location(0.0, 0.0)];
        let mut clusters = vec![Cluster {
            id: 0,
            centroid: Location::new(0.0, 0.0),
            member_nodes: members,
            attribute_value: "default".to_string(),
        }];
        let mut nodes = vec![Node::new("c").with_location(0.0, 1.0)];

        resolve_overlaps(&mut clusters, &mut nodes, &projector, &SymbolSize::Fixed(10.0), 5, 0.0);

        let c = projector.project(clusters[0].centroid);
        let n = pixel(&projector, &nodes[0]);
        assert!(c.distance(&n) >= 10.0 - 1e-9);
        // Member records keep their original positions
        assert_eq!(clusters[0].member_nodes[0].location, Some(Location::new(0.0, 0.0)));
    }
}
