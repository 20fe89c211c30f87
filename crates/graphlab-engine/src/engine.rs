//! The engine: sole owner of the graph, its action log and the layout simulation

use graphlab_core::{
    path_edges, shortest_path, Action, ActionLog, Degree, Edge, GraphError, GraphEvent,
    GraphMutator, GraphResult, GraphStore, ImportReport, ShortestPath, SpawnPositionProvider,
    SpiralSpawner, Vec2, VertexId,
};
use graphlab_layout::{EulerIntegrator, ForceLayout, PhysicsIntegrator};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::state::SimulationState;

/// Serializable view of the whole graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSnapshot {
    pub directed: bool,
    pub weighted: bool,
    pub state: SimulationState,
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VertexSnapshot {
    pub id: VertexId,
    pub position: Vec2,
    pub dragging: bool,
}

/// Owns one graph and everything that acts on it.
///
/// All topology changes go through the engine so that each successful one is
/// appended to the action log exactly once, the physics bodies stay in step
/// with the vertex set, and observers are notified.
pub struct Engine {
    pub(crate) graph: GraphStore,
    pub(crate) log: ActionLog,
    pub(crate) layout: ForceLayout,
    pub(crate) physics: Box<dyn PhysicsIntegrator>,
    pub(crate) state: SimulationState,
    config: EngineConfig,
    events: broadcast::Sender<GraphEvent>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("graph", &self.graph)
            .field("log_len", &self.log.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let physics = Box::new(EulerIntegrator::new(config.physics.body()));
        Self::with_parts(config, Box::new(SpiralSpawner::default()), physics)
    }

    pub fn with_parts(
        config: EngineConfig,
        spawner: Box<dyn SpawnPositionProvider>,
        physics: Box<dyn PhysicsIntegrator>,
    ) -> Self {
        let mut graph = GraphStore::with_spawner(spawner);
        graph.record_events(true);
        let (events, _) = broadcast::channel(config.events.capacity.max(1));
        Engine {
            graph,
            log: ActionLog::new(),
            layout: ForceLayout::new(config.layout),
            physics,
            state: SimulationState::Running,
            config,
            events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<GraphEvent> {
        self.events.clone()
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn physics(&self) -> &dyn PhysicsIntegrator {
        self.physics.as_ref()
    }

    pub(crate) fn publish(&self, event: GraphEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn flush_events(&mut self) {
        for event in self.graph.take_events() {
            self.publish(event);
        }
    }

    pub(crate) fn ensure_mutable(&self) -> EngineResult<()> {
        if self.state == SimulationState::Replaying {
            Err(EngineError::Replaying)
        } else {
            Ok(())
        }
    }

    fn record(&mut self, action: Action) {
        if self.state != SimulationState::Replaying {
            self.log.push(action);
        }
    }

    /// Apply one structural action, keep physics in step and log it unless replaying.
    pub(crate) fn apply(&mut self, action: Action) -> GraphResult<()> {
        let result = self.apply_inner(action);
        self.flush_events();
        result
    }

    fn apply_inner(&mut self, action: Action) -> GraphResult<()> {
        match action {
            Action::AddVertex(id) => {
                let position = self.graph.add_vertex(id)?;
                self.physics.insert_body(id, position);
                if !self.layout.is_enabled() {
                    self.physics.set_kinematic(id, true);
                }
            }
            Action::RemoveVertex(id) => {
                let cascaded = self.graph.remove_vertex(id)?;
                self.physics.remove_body(id);
                for edge in cascaded {
                    self.record(Action::RemoveEdge {
                        from: edge.from,
                        to: edge.to,
                    });
                }
            }
            Action::AddEdge { from, to, weight } => self.graph.add_edge(from, to, weight)?,
            Action::RemoveEdge { from, to } => {
                self.graph.remove_edge(from, to)?;
            }
        }
        self.record(action);
        Ok(())
    }

    /// Perform a recorded command as if the user had issued it.
    pub fn apply_action(&mut self, action: Action) -> EngineResult<()> {
        self.ensure_mutable()?;
        Ok(self.apply(action)?)
    }

    pub fn add_vertex(&mut self, id: VertexId) -> EngineResult<()> {
        self.apply_action(Action::AddVertex(id))
    }

    pub fn remove_vertex(&mut self, id: VertexId) -> EngineResult<()> {
        self.apply_action(Action::RemoveVertex(id))
    }

    pub fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f32) -> EngineResult<()> {
        self.apply_action(Action::AddEdge { from, to, weight })
    }

    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) -> EngineResult<()> {
        self.apply_action(Action::RemoveEdge { from, to })
    }

    /// Remove every edge and then every vertex, logging each removal.
    pub fn clear(&mut self) -> EngineResult<()> {
        self.ensure_mutable()?;
        let (edges, vertices) = self.graph.clear();
        self.physics.clear();
        for edge in edges {
            self.record(Action::RemoveEdge {
                from: edge.from,
                to: edge.to,
            });
        }
        for id in vertices {
            self.record(Action::RemoveVertex(id));
        }
        self.flush_events();
        Ok(())
    }

    pub fn set_directed(&mut self, directed: bool) -> EngineResult<()> {
        self.ensure_mutable()?;
        self.graph.set_directed(directed)?;
        Ok(())
    }

    pub fn set_weighted(&mut self, weighted: bool) -> EngineResult<()> {
        self.ensure_mutable()?;
        self.graph.set_weighted(weighted);
        Ok(())
    }

    /// Bulk-import an edge list. Every mutation it performs is logged.
    pub fn import_document(&mut self, text: &str) -> EngineResult<ImportReport> {
        self.ensure_mutable()?;
        Ok(graphlab_core::import_document(&mut Applier(self), text))
    }

    pub fn degree(&self, id: VertexId) -> EngineResult<Degree> {
        Ok(self.graph.degree(id)?)
    }

    pub fn adjacent_vertices(&self, id: VertexId) -> EngineResult<Vec<VertexId>> {
        Ok(self.graph.adjacent_vertices(id)?)
    }

    pub fn are_adjacent(&self, a: VertexId, b: VertexId) -> bool {
        self.graph.are_adjacent(a, b)
    }

    pub fn shortest_path(&self, start: VertexId, end: VertexId) -> EngineResult<ShortestPath> {
        Ok(shortest_path(&self.graph, start, end)?)
    }

    pub fn path_edges(&self, path: &ShortestPath) -> Vec<Edge> {
        path_edges(&self.graph, &path.vertices)
            .into_iter()
            .copied()
            .collect()
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            directed: self.graph.is_directed(),
            weighted: self.graph.is_weighted(),
            state: self.state,
            vertices: self
                .graph
                .vertices()
                .map(|v| VertexSnapshot {
                    id: v.id,
                    position: v.position,
                    dragging: v.dragging,
                })
                .collect(),
            edges: self.graph.edges().copied().collect(),
        }
    }

    // ── Simulation ─────────────────────────────────────────

    /// Freeze the layout.
    pub fn pause(&mut self) -> EngineResult<()> {
        self.state = self.state.transition(SimulationState::Paused)?;
        self.layout.disable(&self.graph, self.physics.as_mut());
        info!("Simulation paused");
        Ok(())
    }

    /// Unfreeze the layout, dropping residual velocity.
    pub fn resume(&mut self) -> EngineResult<()> {
        self.state = self.state.transition(SimulationState::Running)?;
        self.layout.enable(&self.graph, self.physics.as_mut());
        info!("Simulation resumed");
        Ok(())
    }

    /// Flip between running and paused. Returns the new state.
    pub fn toggle_simulation(&mut self) -> EngineResult<SimulationState> {
        match self.state {
            SimulationState::Running => self.pause()?,
            SimulationState::Paused => self.resume()?,
            SimulationState::Replaying => return Err(EngineError::Replaying),
        }
        Ok(self.state)
    }

    /// One fixed-interval layout step. Only positions and velocities change.
    /// Returns the number of vertices that received a force.
    pub fn tick(&mut self) -> usize {
        if self.state != SimulationState::Running {
            return 0;
        }
        let dt = self.config.physics.fixed_dt().as_secs_f32();
        let pushed = self.layout.tick(&self.graph, self.physics.as_mut());
        self.physics.step(dt);

        let moved: Vec<(VertexId, Vec2)> = self
            .graph
            .vertices()
            .filter(|v| !v.dragging)
            .filter_map(|v| {
                self.physics
                    .position(v.id)
                    .filter(|p| *p != v.position)
                    .map(|p| (v.id, p))
            })
            .collect();
        for (id, position) in moved {
            if let Err(error) = self.graph.set_position(id, position) {
                warn!(%id, %error, "layout moved a vertex the graph does not hold");
            }
        }
        self.flush_events();
        pushed
    }

    // ── Dragging ───────────────────────────────────────────

    /// Take hold of a vertex: it stops receiving forces and follows `update_drag`.
    pub fn begin_drag(&mut self, id: VertexId) -> EngineResult<()> {
        self.ensure_mutable()?;
        self.graph.set_dragging(id, true)?;
        self.physics.set_kinematic(id, true);
        self.physics.set_velocity(id, Vec2::ZERO);
        debug!(%id, "drag started");
        Ok(())
    }

    pub fn update_drag(&mut self, id: VertexId, position: Vec2) -> EngineResult<()> {
        self.ensure_mutable()?;
        let vertex = self
            .graph
            .vertex(id)
            .ok_or(GraphError::VertexNotFound(id))?;
        if !vertex.dragging {
            return Err(EngineError::NotDragging(id));
        }
        self.graph.set_position(id, position)?;
        self.physics.set_position(id, position);
        self.flush_events();
        Ok(())
    }

    /// Let go of a vertex. It rejoins the simulation unless the layout is paused.
    pub fn end_drag(&mut self, id: VertexId) -> EngineResult<()> {
        let vertex = self
            .graph
            .vertex(id)
            .ok_or(GraphError::VertexNotFound(id))?;
        if !vertex.dragging {
            return Err(EngineError::NotDragging(id));
        }
        self.graph.set_dragging(id, false)?;
        if self.layout.is_enabled() {
            self.physics.set_kinematic(id, false);
        }
        debug!(%id, "drag ended");
        Ok(())
    }

    pub fn is_dragging(&self, id: VertexId) -> bool {
        self.graph.vertex(id).is_some_and(|v| v.dragging)
    }
}

/// Routes importer and replay mutations through [`Engine::apply`] without the
/// replay guard, so each call is logged (or not) by the engine's state alone.
pub(crate) struct Applier<'a>(pub(crate) &'a mut Engine);

impl GraphMutator for Applier<'_> {
    fn contains_vertex(&self, id: VertexId) -> bool {
        self.0.graph.contains_vertex(id)
    }

    fn add_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        self.0.apply(Action::AddVertex(id))
    }

    fn remove_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        self.0.apply(Action::RemoveVertex(id))
    }

    fn add_edge(&mut self, from: VertexId, to: VertexId, weight: f32) -> GraphResult<()> {
        self.0.apply(Action::AddEdge { from, to, weight })
    }

    fn remove_edge(&mut self, from: VertexId, to: VertexId) -> GraphResult<()> {
        self.0.apply(Action::RemoveEdge { from, to })
    }
}
