//! R-tree over street edge envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

use crate::domain::{Coordinate, METERS_PER_DEGREE_LAT, bounding_box, meters_per_degree_lon};
use crate::graph::{Edge, EdgeId, Graph};

type Entry = GeomWithData<Rectangle<[f64; 2]>, EdgeId>;

/// Spatial index of the street edges in a graph.
///
/// The index does not follow the graph by itself; whoever splits or
/// removes street edges keeps it current.
#[derive(Default)]
pub struct StreetIndex {
    tree: RTree<Entry>,
    edges: HashMap<EdgeId, Arc<Edge>>,
}

fn entry(edge: &Edge) -> Option<Entry> {
    let street = edge.as_street()?;
    let rect = bounding_box(&street.geometry)?;
    let (min, max) = (rect.min(), rect.max());
    Some(GeomWithData::new(
        Rectangle::from_corners([min.x, min.y], [max.x, max.y]),
        edge.id(),
    ))
}

impl StreetIndex {
    /// Index every street edge currently in the graph.
    pub fn build(graph: &Graph) -> Self {
        let mut edges = HashMap::new();
        let entries: Vec<Entry> = graph
            .edges()
            .into_iter()
            .filter_map(|e| {
                let entry = entry(&e)?;
                edges.insert(e.id(), e);
                Some(entry)
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            edges,
        }
    }

    /// Add a street edge. Other edge kinds are ignored.
    pub fn insert(&mut self, edge: Arc<Edge>) {
        if let Some(entry) = entry(&edge)
            && self.edges.insert(edge.id(), edge).is_none()
        {
            self.tree.insert(entry);
        }
    }

    /// Remove an edge. Returns whether it was indexed.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        if self.edges.remove(&edge.id()).is_none() {
            return false;
        }
        if let Some(entry) = entry(edge) {
            self.tree.remove(&entry);
        }
        true
    }

    /// Street edges whose envelope comes within `radius_m` of a point,
    /// ordered by edge id.
    pub fn query_around(&self, point: &Coordinate, radius_m: f64) -> Vec<Arc<Edge>> {
        let dy = radius_m / METERS_PER_DEGREE_LAT;
        // Close to the poles a degree of longitude shrinks towards zero
        let dx = radius_m / meters_per_degree_lon(point.y).max(1.0);
        let envelope = AABB::from_corners([point.x - dx, point.y - dy], [point.x + dx, point.y + dy]);

        let mut found: Vec<Arc<Edge>> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| self.edges.get(&entry.data).cloned())
            .collect();
        found.sort_by_key(|e| e.id());
        found
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StreetTraversalPermission;
    use crate::graph::{EdgeKind, StreetSegment, VertexKind};

    fn street_graph() -> (Graph, Arc<Edge>, Arc<Edge>) {
        let graph = Graph::new();
        let a = graph
            .add_vertex("a", None, Coordinate::new(0.0, 0.0), VertexKind::Intersection)
            .unwrap();
        let b = graph
            .add_vertex("b", None, Coordinate::new(0.01, 0.0), VertexKind::Intersection)
            .unwrap();
        let c = graph
            .add_vertex("c", None, Coordinate::new(1.0, 1.0), VertexKind::Intersection)
            .unwrap();
        let near = graph
            .add_edge(
                a.id(),
                b.id(),
                EdgeKind::Street(StreetSegment::new(
                    "near",
                    vec![a.coordinate(), b.coordinate()],
                    StreetTraversalPermission::ALL,
                )),
            )
            .unwrap();
        let far = graph
            .add_edge(
                b.id(),
                c.id(),
                EdgeKind::Street(StreetSegment::new(
                    "far",
                    vec![b.coordinate(), c.coordinate()],
                    StreetTraversalPermission::ALL,
                )),
            )
            .unwrap();
        (graph, near, far)
    }

    #[test]
    fn build_indexes_only_streets() {
        let (graph, _, _) = street_graph();
        let stop = graph
            .add_vertex(
                "s",
                None,
                Coordinate::new(0.0, 0.0001),
                VertexKind::TransitStop {
                    stop_id: "1".into(),
                },
            )
            .unwrap();
        let a = graph.vertex_by_label("a").unwrap();
        graph
            .add_edge(stop.id(), a.id(), EdgeKind::StreetLink { length_m: 11.0 })
            .unwrap();

        let index = StreetIndex::build(&graph);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn query_finds_nearby_edges_in_id_order() {
        let (graph, near, far) = street_graph();
        let index = StreetIndex::build(&graph);

        let found = index.query_around(&Coordinate::new(0.005, 0.0005), 100.0);
        assert_eq!(found.len(), 1);
        assert!(Arc::ptr_eq(&found[0], &near));

        let found = index.query_around(&Coordinate::new(0.01, 0.0), 10.0);
        let ids: Vec<EdgeId> = found.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![near.id(), far.id()]);
    }

    #[test]
    fn insert_and_remove() {
        let (graph, near, _) = street_graph();
        let mut index = StreetIndex::build(&graph);
        assert!(index.remove(&near));
        assert!(!index.remove(&near));
        assert!(
            index
                .query_around(&Coordinate::new(0.005, 0.0), 50.0)
                .is_empty()
        );
        index.insert(near.clone());
        index.insert(near.clone());
        assert_eq!(index.len(), 2);
        assert_eq!(index.query_around(&Coordinate::new(0.005, 0.0), 50.0).len(), 1);
    }
}
