use std::collections::HashMap;

use eframe::egui::Vec2;

use super::filter::FilteredGraph;
use crate::kg::GraphSnapshot;

/// Below this zoom the view switches to the low-detail encoding.
pub const CLUSTER_ZOOM_THRESHOLD: f32 = 0.5;
/// Grid cell size in world units for spatial grouping.
pub const CLUSTER_CELL_SIZE: f32 = 160.0;
/// At low zoom, nodes at or below this degree are hidden outright.
pub const LOW_ZOOM_MIN_DEGREE: usize = 2;

#[derive(Clone, Debug)]
pub struct ClusterNode {
    /// Derived from the sorted member ids, so identical input produces
    /// identical clusters.
    pub id: String,
    pub members: Vec<usize>,
    pub pos: Vec2,
    pub weight: f32,
}

#[derive(Clone, Debug, Default)]
pub struct LodView {
    pub singles: Vec<usize>,
    pub clusters: Vec<ClusterNode>,
    pub link_indices: Vec<usize>,
}

/// Recomputed from scratch on every zoom or data change; never incremental.
pub fn build_lod(snapshot: &GraphSnapshot, filtered: &FilteredGraph, zoom: f32) -> LodView {
    if zoom >= CLUSTER_ZOOM_THRESHOLD {
        return LodView {
            singles: filtered.node_indices.clone(),
            clusters: Vec::new(),
            link_indices: filtered.link_indices.clone(),
        };
    }

    let mut cells: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for &index in &filtered.node_indices {
        if snapshot.degree(index) <= LOW_ZOOM_MIN_DEGREE {
            continue;
        }
        let pos = snapshot.nodes[index].pos;
        let key = (
            (pos.x / CLUSTER_CELL_SIZE).round() as i32,
            (pos.y / CLUSTER_CELL_SIZE).round() as i32,
        );
        cells.entry(key).or_default().push(index);
    }

    let mut singles = Vec::new();
    let mut clusters = Vec::new();
    for members in cells.into_values() {
        if let [only] = members.as_slice() {
            singles.push(*only);
            continue;
        }

        let mut member_ids = members
            .iter()
            .map(|&index| snapshot.nodes[index].id.as_str())
            .collect::<Vec<_>>();
        member_ids.sort_unstable();
        let id = format!("cluster:{}", member_ids.join("|"));

        let mut centroid = Vec2::ZERO;
        for &index in &members {
            centroid += snapshot.nodes[index].pos;
        }
        centroid /= members.len() as f32;

        clusters.push(ClusterNode {
            id,
            weight: (members.len() as f32).sqrt(),
            members,
            pos: centroid,
        });
    }
    singles.sort_unstable();
    clusters.sort_by(|a, b| a.id.cmp(&b.id));

    let link_indices = filtered
        .link_indices
        .iter()
        .copied()
        .filter(|&link_index| {
            let link = &snapshot.links[link_index];
            snapshot.degree(link.source) > LOW_ZOOM_MIN_DEGREE
                || snapshot.degree(link.target) > LOW_ZOOM_MIN_DEGREE
        })
        .collect();

    LodView {
        singles,
        clusters,
        link_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::filter::{self, CategoryFlags};
    use crate::kg::testkit::{link, node, snapshot};
    use crate::kg::{NodeKind, NodeRecord};
    use eframe::egui::vec2;

    fn hub(id: &str, pos: Vec2) -> NodeRecord {
        let mut record = node(id, NodeKind::Person);
        record.pos = pos;
        record
    }

    /// Star-shaped graph: each listed node linked to three leaves so its
    /// degree exceeds the low-zoom cutoff.
    fn clustered_snapshot(hubs: Vec<NodeRecord>) -> crate::kg::GraphSnapshot {
        let mut nodes = Vec::new();
        let mut links = Vec::new();
        for hub in &hubs {
            for leaf in 0..3 {
                let leaf_id = format!("{}-leaf{leaf}", hub.id);
                nodes.push(node(&leaf_id, NodeKind::Event));
                links.push(link(&hub.id, &leaf_id));
            }
        }
        nodes.extend(hubs);
        snapshot(nodes, links)
    }

    fn filtered(graph: &crate::kg::GraphSnapshot) -> FilteredGraph {
        filter::apply(graph, CategoryFlags::default(), graph.node_count())
    }

    #[test]
    fn high_zoom_is_identity() {
        let graph = clustered_snapshot(vec![hub("a", vec2(0.0, 0.0)), hub("b", vec2(10.0, 0.0))]);
        let filtered = filtered(&graph);
        let lod = build_lod(&graph, &filtered, 0.5);
        assert_eq!(lod.singles, filtered.node_indices);
        assert!(lod.clusters.is_empty());
        assert_eq!(lod.link_indices, filtered.link_indices);
    }

    #[test]
    fn colocated_nodes_collapse_into_one_cluster() {
        let graph = clustered_snapshot(vec![
            hub("a", vec2(1.0, 1.0)),
            hub("b", vec2(4.0, -2.0)),
            hub("far", vec2(2000.0, 2000.0)),
        ]);
        let lod = build_lod(&graph, &filtered(&graph), 0.2);
        assert_eq!(lod.clusters.len(), 1);
        let cluster = &lod.clusters[0];
        assert_eq!(cluster.members.len(), 2);
        assert!((cluster.weight - 2f32.sqrt()).abs() < 1e-6);
        assert_eq!(lod.singles.len(), 1);
    }

    #[test]
    fn clustering_is_idempotent() {
        let graph = clustered_snapshot(vec![
            hub("a", vec2(0.0, 0.0)),
            hub("b", vec2(5.0, 5.0)),
            hub("c", vec2(900.0, 0.0)),
            hub("d", vec2(905.0, 3.0)),
        ]);
        let filtered = filtered(&graph);
        let first = build_lod(&graph, &filtered, 0.3);
        let second = build_lod(&graph, &filtered, 0.3);
        let ids = |view: &LodView| {
            view.clusters
                .iter()
                .map(|cluster| cluster.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert!(!first.clusters.is_empty());
    }

    #[test]
    fn cluster_members_never_overlap() {
        let graph = clustered_snapshot(vec![
            hub("a", vec2(0.0, 0.0)),
            hub("b", vec2(2.0, 2.0)),
            hub("c", vec2(800.0, 0.0)),
            hub("d", vec2(803.0, 1.0)),
        ]);
        let lod = build_lod(&graph, &filtered(&graph), 0.1);
        let mut seen = std::collections::HashSet::new();
        for cluster in &lod.clusters {
            assert!(!cluster.members.is_empty());
            for &member in &cluster.members {
                assert!(seen.insert(member), "member {member} in two clusters");
            }
        }
    }

    #[test]
    fn low_degree_elements_are_hidden_at_low_zoom() {
        let graph = clustered_snapshot(vec![hub("a", vec2(0.0, 0.0))]);
        let lod = build_lod(&graph, &filtered(&graph), 0.2);
        // Leaves have degree 1; only the hub survives.
        for &index in &lod.singles {
            assert!(graph.degree(index) > LOW_ZOOM_MIN_DEGREE);
        }
        for cluster in &lod.clusters {
            for &member in &cluster.members {
                assert!(graph.degree(member) > LOW_ZOOM_MIN_DEGREE);
            }
        }
        // Hub-to-leaf links stay visible because the hub end is above the cutoff.
        assert_eq!(lod.link_indices.len(), 3);
    }
}
