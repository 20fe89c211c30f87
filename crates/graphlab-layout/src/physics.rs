//! Rigid-body integration contract and a reference implementation

use std::collections::HashMap;

use graphlab_core::{Vec2, VertexId};
use serde::{Deserialize, Serialize};

/// Actuation surface of the simulation. One body per vertex.
pub trait PhysicsIntegrator: Send {
    fn insert_body(&mut self, id: VertexId, position: Vec2);
    fn remove_body(&mut self, id: VertexId);
    fn clear(&mut self);

    /// Accumulate a force for the next [`step`](Self::step).
    fn apply_force(&mut self, id: VertexId, force: Vec2);

    /// Kinematic bodies ignore forces and only move through `set_position`.
    fn set_kinematic(&mut self, id: VertexId, kinematic: bool);
    fn is_kinematic(&self, id: VertexId) -> bool;

    fn position(&self, id: VertexId) -> Option<Vec2>;
    fn set_position(&mut self, id: VertexId, position: Vec2);
    fn velocity(&self, id: VertexId) -> Option<Vec2>;
    fn set_velocity(&mut self, id: VertexId, velocity: Vec2);

    /// Advance every dynamic body by `dt` seconds and clear accumulated forces.
    fn step(&mut self, dt: f32);
}

/// Mass and linear damping shared by every body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    pub mass: f32,
    pub damping: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        BodyParams {
            mass: 0.1,
            damping: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    force: Vec2,
    kinematic: bool,
}

/// Semi-implicit Euler with linear damping:
///
/// ```text
/// velocity += force / mass * dt
/// velocity *= 1 - damping * dt
/// position += velocity * dt
/// ```
#[derive(Debug, Clone, Default)]
pub struct EulerIntegrator {
    params: BodyParams,
    bodies: HashMap<VertexId, Body>,
}

impl EulerIntegrator {
    pub fn new(params: BodyParams) -> Self {
        EulerIntegrator {
            params,
            bodies: HashMap::new(),
        }
    }

    pub fn params(&self) -> BodyParams {
        self.params
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsIntegrator for EulerIntegrator {
    fn insert_body(&mut self, id: VertexId, position: Vec2) {
        self.bodies.insert(
            id,
            Body {
                position,
                velocity: Vec2::ZERO,
                force: Vec2::ZERO,
                kinematic: false,
            },
        );
    }

    fn remove_body(&mut self, id: VertexId) {
        self.bodies.remove(&id);
    }

    fn clear(&mut self) {
        self.bodies.clear();
    }

    fn apply_force(&mut self, id: VertexId, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.force += force;
        }
    }

    fn set_kinematic(&mut self, id: VertexId, kinematic: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.kinematic = kinematic;
            if kinematic {
                body.force = Vec2::ZERO;
            }
        }
    }

    fn is_kinematic(&self, id: VertexId) -> bool {
        self.bodies.get(&id).is_some_and(|b| b.kinematic)
    }

    fn position(&self, id: VertexId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn set_position(&mut self, id: VertexId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn velocity(&self, id: VertexId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, id: VertexId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn step(&mut self, dt: f32) {
        let BodyParams { mass, damping } = self.params;
        let retain = (1.0 - damping * dt).max(0.0);
        for body in self.bodies.values_mut() {
            let force = std::mem::replace(&mut body.force, Vec2::ZERO);
            if body.kinematic {
                continue;
            }
            body.velocity += force / mass * dt;
            body.velocity = body.velocity * retain;
            body.position += body.velocity * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_step_follows_semi_implicit_euler() {
        let mut physics = EulerIntegrator::new(BodyParams {
            mass: 2.0,
            damping: 0.5,
        });
        let id = VertexId(1);
        physics.insert_body(id, Vec2::ZERO);
        physics.apply_force(id, Vec2::new(4.0, 0.0));
        physics.step(0.1);

        // v = 4/2*0.1 = 0.2, damped by (1 - 0.05) = 0.19, x = 0.019
        assert!(approx(physics.velocity(id).unwrap(), Vec2::new(0.19, 0.0)));
        assert!(approx(physics.position(id).unwrap(), Vec2::new(0.019, 0.0)));

        // Forces do not carry over between steps.
        physics.step(0.1);
        assert!(approx(physics.velocity(id).unwrap(), Vec2::new(0.1805, 0.0)));
    }

    #[test]
    fn test_kinematic_bodies_ignore_forces() {
        let mut physics = EulerIntegrator::default();
        let id = VertexId(3);
        physics.insert_body(id, Vec2::new(1.0, 1.0));
        physics.set_kinematic(id, true);
        physics.apply_force(id, Vec2::new(100.0, 100.0));
        physics.step(0.02);
        assert_eq!(physics.position(id), Some(Vec2::new(1.0, 1.0)));
        assert!(physics.is_kinematic(id));

        physics.set_position(id, Vec2::new(5.0, 0.0));
        assert_eq!(physics.position(id), Some(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_unknown_bodies_are_ignored() {
        let mut physics = EulerIntegrator::default();
        physics.apply_force(VertexId(9), Vec2::new(1.0, 0.0));
        physics.set_kinematic(VertexId(9), true);
        assert_eq!(physics.position(VertexId(9)), None);
        assert!(!physics.is_kinematic(VertexId(9)));
        assert_eq!(physics.body_count(), 0);
    }
}
