//! Graphlab Layout: force-directed positioning and the physics contract it drives

pub mod physics;
pub mod force;

pub use physics::{PhysicsIntegrator, EulerIntegrator, BodyParams};
pub use force::{ForceLayout, ForceParams};
