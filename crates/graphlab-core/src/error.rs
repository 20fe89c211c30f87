//! Error types for graph mutation, import and queries

use thiserror::Error;

use crate::model::VertexId;

/// Errors produced by graph operations. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("vertex {0} already exists")]
    DuplicateId(VertexId),

    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("no edge between {from} and {to}")]
    EdgeNotFound { from: VertexId, to: VertexId },

    #[error("edge between {from} and {to} already exists")]
    DuplicateEdge { from: VertexId, to: VertexId },

    #[error("edge between {from} and {to} has invalid weight {weight}")]
    InvalidWeight { from: VertexId, to: VertexId, weight: f32 },

    #[error("no spawn position available for vertex {0}")]
    NoSpawnPosition(VertexId),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: ParseReason },

    #[error("no path from {start} to {end}")]
    PathNotFound { start: VertexId, end: VertexId },
}

/// Why a line of text could not be used as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseReason {
    #[error("expected at least two numbers, found {found}")]
    NotEnoughNumbers { found: usize },

    #[error("invalid source id '{0}'")]
    InvalidSourceId(String),

    #[error("invalid target id '{0}'")]
    InvalidTargetId(String),

    /// Non-fatal: the default weight was used instead.
    #[error("invalid weight '{0}', default weight used")]
    InvalidWeight(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected trailing field '{0}'")]
    TrailingField(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
