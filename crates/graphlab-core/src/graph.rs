//! Graph store built on petgraph::StableDiGraph with user-facing VertexIds

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::events::GraphEvent;
use crate::model::*;
use crate::spawn::{SpawnPositionProvider, SpiralSpawner};

/// Mutation surface shared by the store and anything that wraps it.
///
/// The bulk importer and the action log are written against this trait so
/// that wrappers (for example an engine that records every mutation) see the
/// same calls a user would make.
pub trait GraphMutator {
    fn contains_vertex(&self, id: VertexId) -> bool;
    fn add_vertex(&mut self, id: VertexId) -> GraphResult<()>;
    fn remove_vertex(&mut self, id: VertexId) -> GraphResult<()>;
    fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f32) -> GraphResult<()>;
    fn remove_edge(&mut self, from: VertexId, to: VertexId) -> GraphResult<()>;
}

/// Owns every vertex and edge of one graph.
///
/// Vertices iterate in insertion order and edges iterate in insertion order;
/// both orders are relied on by the layout and the path finder.
pub struct GraphStore {
    inner: StableDiGraph<Vertex, Edge>,
    index: HashMap<VertexId, NodeIndex>,
    vertex_order: Vec<VertexId>,
    edge_order: Vec<EdgeIndex>,
    directed: bool,
    weighted: bool,
    spawner: Box<dyn SpawnPositionProvider>,
    recording: bool,
    pending: Vec<GraphEvent>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("order", &self.order())
            .field("size", &self.size())
            .field("directed", &self.directed)
            .field("weighted", &self.weighted)
            .finish()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_spawner(Box::new(SpiralSpawner::default()))
    }

    pub fn with_spawner(spawner: Box<dyn SpawnPositionProvider>) -> Self {
        GraphStore {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
            vertex_order: Vec::new(),
            edge_order: Vec::new(),
            directed: false,
            weighted: false,
            spawner,
            recording: false,
            pending: Vec::new(),
        }
    }

    /// Start or stop buffering [`GraphEvent`]s for [`take_events`](Self::take_events).
    pub fn record_events(&mut self, on: bool) {
        self.recording = on;
        if !on {
            self.pending.clear();
        }
    }

    /// Drain the notifications buffered since the last call.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.pending)
    }

    fn emit(&mut self, event: GraphEvent) {
        if self.recording {
            self.pending.push(event);
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Switch directedness and rebuild every vertex's incoming/outgoing lists.
    ///
    /// Leaving directed mode fails with `DuplicateEdge` while both `a -> b`
    /// and `b -> a` exist, since they would collapse onto one unordered pair.
    /// The mode is left unchanged in that case.
    pub fn set_directed(&mut self, directed: bool) -> GraphResult<()> {
        if !directed {
            if let Some((from, to)) = self.reciprocal_pair() {
                return Err(GraphError::DuplicateEdge { from, to });
            }
        }
        self.directed = directed;
        for vertex in self.inner.node_weights_mut() {
            vertex.incoming.clear();
            vertex.outgoing.clear();
        }
        for i in 0..self.edge_order.len() {
            let e = self.edge_order[i];
            let edge = &mut self.inner[e];
            edge.directed = directed;
            if directed {
                let (from, to) = (edge.from, edge.to);
                let (a, b) = (self.index[&from], self.index[&to]);
                self.inner[a].outgoing.push(e);
                self.inner[b].incoming.push(e);
            }
        }
        debug!(directed, "graph directedness changed");
        Ok(())
    }

    /// The first edge, in insertion order, whose reverse was added before it.
    fn reciprocal_pair(&self) -> Option<(VertexId, VertexId)> {
        let mut seen = HashSet::new();
        self.edges().find_map(|e| {
            if !e.is_loop() && seen.contains(&(e.to, e.from)) {
                return Some((e.from, e.to));
            }
            seen.insert((e.from, e.to));
            None
        })
    }

    pub fn set_weighted(&mut self, weighted: bool) {
        self.weighted = weighted;
    }

    fn node_index(&self, id: VertexId) -> GraphResult<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// Create a vertex at the next spawn position. Returns that position.
    pub fn add_vertex(&mut self, id: VertexId) -> GraphResult<Vec2> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateId(id));
        }
        let position = self
            .spawner
            .next()
            .filter(|p| p.is_finite())
            .ok_or(GraphError::NoSpawnPosition(id))?;

        let idx = self.inner.add_node(Vertex::new(id, position));
        self.index.insert(id, idx);
        self.vertex_order.push(id);
        debug!(%id, x = position.x, y = position.y, "vertex added");
        self.emit(GraphEvent::VertexAdded { id, position });
        Ok(position)
    }

    /// Remove a vertex after removing all incident edges.
    /// Returns the removed edges in the order they were detached.
    pub fn remove_vertex(&mut self, id: VertexId) -> GraphResult<Vec<Edge>> {
        let idx = self.node_index(id)?;
        let incident = self.inner[idx].incident.clone();
        let removed: Vec<Edge> = incident
            .into_iter()
            .filter_map(|e| self.detach_edge(e))
            .collect();

        self.inner.remove_node(idx);
        self.index.remove(&id);
        self.vertex_order.retain(|v| *v != id);
        debug!(%id, cascaded = removed.len(), "vertex removed");
        self.emit(GraphEvent::VertexRemoved { id });
        Ok(removed)
    }

    /// Connect two existing vertices.
    ///
    /// A pair may be connected at most once: in directed mode `(a, b)` and
    /// `(b, a)` are different pairs, in undirected mode they are the same.
    /// Weights must be finite and non-negative.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f32) -> GraphResult<()> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(GraphError::InvalidWeight { from, to, weight });
        }
        if self.find_edge(from, to).is_some() {
            return Err(GraphError::DuplicateEdge { from, to });
        }

        let edge = Edge {
            from,
            to,
            weight,
            directed: self.directed,
        };
        let e = self.inner.add_edge(a, b, edge);
        self.edge_order.push(e);
        self.inner[a].incident.push(e);
        if a != b {
            self.inner[b].incident.push(e);
        }
        if self.directed {
            self.inner[a].outgoing.push(e);
            self.inner[b].incoming.push(e);
        }
        debug!(%from, %to, weight, "edge added");
        self.emit(GraphEvent::EdgeAdded { from, to, weight });
        Ok(())
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> GraphResult<Edge> {
        self.node_index(from)?;
        self.node_index(to)?;
        let e = self
            .find_edge(from, to)
            .ok_or(GraphError::EdgeNotFound { from, to })?;
        self.detach_edge(e)
            .ok_or(GraphError::EdgeNotFound { from, to })
    }

    fn detach_edge(&mut self, e: EdgeIndex) -> Option<Edge> {
        let edge = self.inner.remove_edge(e)?;
        for id in [edge.from, edge.to] {
            if let Some(&n) = self.index.get(&id) {
                let vertex = &mut self.inner[n];
                vertex.incident.retain(|x| *x != e);
                vertex.incoming.retain(|x| *x != e);
                vertex.outgoing.retain(|x| *x != e);
            }
        }
        self.edge_order.retain(|x| *x != e);
        debug!(from = %edge.from, to = %edge.to, "edge removed");
        self.emit(GraphEvent::EdgeRemoved {
            from: edge.from,
            to: edge.to,
        });
        Some(edge)
    }

    /// Remove every edge, then every vertex.
    pub fn clear(&mut self) -> (Vec<Edge>, Vec<VertexId>) {
        let edges: Vec<Edge> = self
            .edge_order
            .clone()
            .into_iter()
            .filter_map(|e| self.detach_edge(e))
            .collect();
        let ids = self.vertex_order.clone();
        for id in &ids {
            let cascaded = self.remove_vertex(*id);
            debug_assert!(matches!(cascaded, Ok(ref edges) if edges.is_empty()));
        }
        (edges, ids)
    }

    fn find_edge(&self, from: VertexId, to: VertexId) -> Option<EdgeIndex> {
        let idx = self.index.get(&from)?;
        self.inner[*idx]
            .incident
            .iter()
            .copied()
            .find(|&e| self.inner[e].connects(from, to, self.directed))
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index.get(&id).map(|&idx| &self.inner[idx])
    }

    /// The edge connecting `from` to `to` under the current directedness rule.
    pub fn edge(&self, from: VertexId, to: VertexId) -> Option<&Edge> {
        self.find_edge(from, to).map(|e| &self.inner[e])
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertex_order
            .iter()
            .filter_map(move |id| self.vertex(*id))
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertex_order.clone()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().map(move |&e| &self.inner[e])
    }

    /// Number of vertices.
    pub fn order(&self) -> usize {
        self.vertex_order.len()
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.edge_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_order.is_empty()
    }

    pub fn incident_edges(&self, id: VertexId) -> GraphResult<impl Iterator<Item = &Edge>> {
        let idx = self.node_index(id)?;
        Ok(self.inner[idx].incident.iter().map(move |&e| &self.inner[e]))
    }

    pub fn outgoing_edges(&self, id: VertexId) -> GraphResult<impl Iterator<Item = &Edge>> {
        let idx = self.node_index(id)?;
        Ok(self.inner[idx].outgoing.iter().map(move |&e| &self.inner[e]))
    }

    pub fn incoming_edges(&self, id: VertexId) -> GraphResult<impl Iterator<Item = &Edge>> {
        let idx = self.node_index(id)?;
        Ok(self.inner[idx].incoming.iter().map(move |&e| &self.inner[e]))
    }

    pub fn degree(&self, id: VertexId) -> GraphResult<Degree> {
        let vertex = self.vertex(id).ok_or(GraphError::VertexNotFound(id))?;
        let (in_degree, out_degree) = (vertex.in_degree(), vertex.out_degree());
        let degree = if self.directed {
            in_degree + out_degree
        } else {
            let loops = self.incident_edges(id)?.filter(|e| e.is_loop()).count();
            vertex.incident.len() + loops
        };
        Ok(Degree {
            degree,
            in_degree,
            out_degree,
        })
    }

    /// One neighbour per edge endpoint, in edge insertion order.
    /// A self-loop lists the vertex itself twice.
    pub fn adjacent_vertices(&self, id: VertexId) -> GraphResult<Vec<VertexId>> {
        let mut adjacent = Vec::new();
        for edge in self.incident_edges(id)? {
            adjacent.push(edge.other(id));
            if edge.is_loop() {
                adjacent.push(id);
            }
        }
        Ok(adjacent)
    }

    /// Directed graphs only look at edges leaving `a`. Missing vertices are never adjacent.
    pub fn are_adjacent(&self, a: VertexId, b: VertexId) -> bool {
        if !self.contains_vertex(b) {
            return false;
        }
        if self.directed {
            self.outgoing_edges(a)
                .map(|mut edges| edges.any(|e| e.to == b))
                .unwrap_or(false)
        } else {
            self.incident_edges(a)
                .map(|mut edges| edges.any(|e| e.connects(a, b, false)))
                .unwrap_or(false)
        }
    }

    pub fn position(&self, id: VertexId) -> Option<Vec2> {
        self.vertex(id).map(|v| v.position)
    }

    pub fn set_position(&mut self, id: VertexId, position: Vec2) -> GraphResult<()> {
        let idx = self.node_index(id)?;
        self.inner[idx].position = position;
        self.emit(GraphEvent::PositionChanged { id, position });
        Ok(())
    }

    pub fn set_dragging(&mut self, id: VertexId, dragging: bool) -> GraphResult<()> {
        let idx = self.node_index(id)?;
        self.inner[idx].dragging = dragging;
        Ok(())
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphMutator for GraphStore {
    fn contains_vertex(&self, id: VertexId) -> bool {
        GraphStore::contains_vertex(self, id)
    }

    fn add_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        GraphStore::add_vertex(self, id).map(|_| ())
    }

    fn remove_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        GraphStore::remove_vertex(self, id).map(|_| ())
    }

    fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f32) -> GraphResult<()> {
        GraphStore::add_edge(self, from, to, weight)
    }

    fn remove_edge(&mut self, from: VertexId, to: VertexId) -> GraphResult<()> {
        GraphStore::remove_edge(self, from, to).map(|_| ())
    }
}
