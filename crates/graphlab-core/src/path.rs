//! Dijkstra shortest path over the current graph snapshot
//!
//! Weights are assumed non-negative. Among vertices with equal tentative
//! distance the one inserted into the graph first is settled first, which
//! makes the returned path deterministic when several shortest paths exist.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::graph::GraphStore;
use crate::model::{Edge, VertexId};

/// A path from start to end with its accumulated weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortestPath {
    /// Vertices from start to end, inclusive.
    pub vertices: Vec<VertexId>,
    pub cost: f32,
}

impl ShortestPath {
    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
}

/// Heap entry; ordered so that the smallest distance, then the earliest
/// inserted vertex, pops first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    rank: usize,
    vertex: VertexId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.rank.cmp(&self.rank))
    }
}

/// Find the cheapest path from `start` to `end`.
///
/// Directed graphs relax only outgoing edges; undirected graphs relax every
/// incident edge towards its other endpoint. `start == end` yields a
/// single-vertex path of cost zero.
pub fn shortest_path(graph: &GraphStore, start: VertexId, end: VertexId) -> GraphResult<ShortestPath> {
    if !graph.contains_vertex(start) {
        return Err(GraphError::VertexNotFound(start));
    }
    if !graph.contains_vertex(end) {
        return Err(GraphError::VertexNotFound(end));
    }
    if start == end {
        return Ok(ShortestPath {
            vertices: vec![start],
            cost: 0.0,
        });
    }

    let rank: HashMap<VertexId, usize> = graph
        .vertices()
        .enumerate()
        .map(|(i, v)| (v.id, i))
        .collect();
    let mut distance: HashMap<VertexId, f32> = HashMap::new();
    let mut previous: HashMap<VertexId, VertexId> = HashMap::new();
    let mut visited: HashSet<VertexId> = HashSet::new();
    let mut heap = BinaryHeap::new();

    distance.insert(start, 0.0);
    heap.push(Candidate {
        distance: 0.0,
        rank: rank[&start],
        vertex: start,
    });

    while let Some(Candidate { distance: d, vertex: current, .. }) = heap.pop() {
        if !visited.insert(current) {
            continue;
        }
        if current == end {
            break;
        }

        let edges: Vec<&Edge> = if graph.is_directed() {
            graph.outgoing_edges(current)?.collect()
        } else {
            graph.incident_edges(current)?.collect()
        };

        for edge in edges {
            let neighbor = if graph.is_directed() { edge.to } else { edge.other(current) };
            if visited.contains(&neighbor) {
                continue;
            }
            let alt = d + edge.weight;
            let better = distance.get(&neighbor).is_none_or(|&known| alt < known);
            if better {
                distance.insert(neighbor, alt);
                previous.insert(neighbor, current);
                heap.push(Candidate {
                    distance: alt,
                    rank: rank[&neighbor],
                    vertex: neighbor,
                });
            }
        }
    }

    if !previous.contains_key(&end) {
        debug!(%start, %end, "no path");
        return Err(GraphError::PathNotFound { start, end });
    }

    let mut vertices = vec![end];
    let mut cursor = end;
    while let Some(&prev) = previous.get(&cursor) {
        vertices.push(prev);
        cursor = prev;
    }
    vertices.reverse();

    let cost = distance[&end];
    debug!(%start, %end, cost, hops = vertices.len() - 1, "shortest path found");
    Ok(ShortestPath { vertices, cost })
}

/// The edges traversed by consecutive vertices of `path`, using the same
/// directedness rule as adjacency. Steps without a connecting edge are skipped.
pub fn path_edges<'g>(graph: &'g GraphStore, path: &[VertexId]) -> Vec<&'g Edge> {
    path.windows(2)
        .filter_map(|pair| graph.edge(pair[0], pair[1]))
        .collect()
}
