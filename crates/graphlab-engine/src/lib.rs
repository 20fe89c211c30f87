//! Graphlab Engine: owns a graph, its action log and the layout simulation

pub mod error;
pub mod state;
pub mod config;
pub mod engine;
pub mod replay;
pub mod service;


pub use error::{EngineError, EngineResult};
pub use state::SimulationState;
pub use config::{EngineConfig, PhysicsConfig, ReplayConfig, EventConfig};
pub use engine::{Engine, GraphSnapshot, VertexSnapshot};
pub use replay::{ReplayCursor, ReplayFailure, ReplayOutcome};
pub use service::{EngineService, EngineHandle, PendingReplay};
