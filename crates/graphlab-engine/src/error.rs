//! Engine-level errors

use graphlab_core::{GraphError, VertexId};
use thiserror::Error;

use crate::state::SimulationState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("cannot move simulation from {from} to {to}")]
    InvalidTransition {
        from: SimulationState,
        to: SimulationState,
    },

    /// External mutations and interaction are suspended while a replay runs.
    #[error("a replay is in progress")]
    Replaying,

    #[error("vertex {0} is not being dragged")]
    NotDragging(VertexId),

    #[error("engine service has shut down")]
    ServiceClosed,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
