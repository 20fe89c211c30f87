//! Force-directed layout: center pull, pairwise repulsion and edge springs

use std::collections::HashMap;

use graphlab_core::{GraphStore, Vec2, VertexId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::physics::PhysicsIntegrator;

/// Tuning for the three force terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
    pub center_multiplier: f32,
    pub repel_multiplier: f32,
    pub spring_stiffness: f32,
    pub rest_length: f32,
    /// Floor applied to pair distance in the repulsion term so coincident
    /// vertices yield a bounded force.
    pub min_distance: f32,
    pub origin: Vec2,
}

impl Default for ForceParams {
    fn default() -> Self {
        ForceParams {
            center_multiplier: 0.5,
            repel_multiplier: 0.5,
            spring_stiffness: 0.5,
            rest_length: 1.0,
            min_distance: 0.1,
            origin: Vec2::ZERO,
        }
    }
}

impl ForceParams {
    /// Pull towards the origin.
    pub fn center_force(&self, position: Vec2) -> Vec2 {
        (self.origin - position) * self.center_multiplier
    }

    /// Force pushing `a` away from `b`; `b` receives the negation.
    pub fn repulsion(&self, a: Vec2, b: Vec2) -> Vec2 {
        let direction = a - b;
        let distance = direction.length().max(self.min_distance);
        direction.normalized() / (distance * distance) * self.repel_multiplier
    }

    /// Force pulling `a` towards `b` when stretched past the rest length;
    /// `b` receives the negation.
    pub fn spring(&self, a: Vec2, b: Vec2) -> Vec2 {
        let direction = b - a;
        let distance = direction.length();
        direction.normalized() * ((distance - self.rest_length) * self.spring_stiffness)
    }
}

/// Per-tick force computation. Vertices being dragged neither receive forces
/// nor push others away, but still anchor springs to their neighbours.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    params: ForceParams,
    enabled: bool,
}

impl ForceLayout {
    pub fn new(params: ForceParams) -> Self {
        ForceLayout {
            params,
            enabled: true,
        }
    }

    pub fn params(&self) -> &ForceParams {
        &self.params
    }

    pub fn set_params(&mut self, params: ForceParams) {
        self.params = params;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Net force for every non-dragged vertex, in graph vertex order.
    pub fn compute_forces(&self, graph: &GraphStore) -> Vec<(VertexId, Vec2)> {
        let free: Vec<(VertexId, Vec2)> = graph
            .vertices()
            .filter(|v| !v.dragging)
            .map(|v| (v.id, v.position))
            .collect();
        let mut forces: HashMap<VertexId, Vec2> = free
            .iter()
            .map(|&(id, position)| (id, self.params.center_force(position)))
            .collect();

        for (i, &(a, pa)) in free.iter().enumerate() {
            for &(b, pb) in &free[i + 1..] {
                let repel = self.params.repulsion(pa, pb);
                forces.entry(a).and_modify(|f| *f += repel);
                forces.entry(b).and_modify(|f| *f -= repel);
            }
        }

        for edge in graph.edges() {
            let (Some(va), Some(vb)) = (graph.vertex(edge.from), graph.vertex(edge.to)) else {
                continue;
            };
            if va.dragging && vb.dragging {
                continue;
            }
            let spring = self.params.spring(va.position, vb.position);
            if !va.dragging {
                forces.entry(va.id).and_modify(|f| *f += spring);
            }
            if !vb.dragging {
                forces.entry(vb.id).and_modify(|f| *f -= spring);
            }
        }

        free.iter()
            .map(|&(id, _)| (id, forces[&id]))
            .collect()
    }

    /// Compute forces and hand them to the integrator. A disabled layout does nothing.
    /// Returns the number of vertices that received a force.
    pub fn tick(&self, graph: &GraphStore, physics: &mut dyn PhysicsIntegrator) -> usize {
        if !self.enabled {
            return 0;
        }
        let forces = self.compute_forces(graph);
        for &(id, force) in &forces {
            physics.apply_force(id, force);
        }
        forces.len()
    }

    /// Freeze every body in place. Ticks become no-ops until [`enable`](Self::enable).
    pub fn disable(&mut self, graph: &GraphStore, physics: &mut dyn PhysicsIntegrator) {
        self.enabled = false;
        for vertex in graph.vertices() {
            physics.set_kinematic(vertex.id, true);
        }
        debug!(vertices = graph.order(), "force layout disabled");
    }

    /// Unfreeze every body that is not being dragged and drop residual velocity.
    pub fn enable(&mut self, graph: &GraphStore, physics: &mut dyn PhysicsIntegrator) {
        self.enabled = true;
        for vertex in graph.vertices() {
            physics.set_velocity(vertex.id, Vec2::ZERO);
            if !vertex.dragging {
                physics.set_kinematic(vertex.id, false);
            }
        }
        debug!(vertices = graph.order(), "force layout enabled");
    }

    pub fn toggle(&mut self, graph: &GraphStore, physics: &mut dyn PhysicsIntegrator) -> bool {
        if self.enabled {
            self.disable(graph, physics);
        } else {
            self.enable(graph, physics);
        }
        self.enabled
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceParams::default())
    }
}
