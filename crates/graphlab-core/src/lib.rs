//! Graphlab Core: graph store, shortest paths, bulk import and the action log

pub mod model;
pub mod error;
pub mod graph;
pub mod spawn;
pub mod events;
pub mod path;
pub mod import;
pub mod action_log;

#[cfg(test)]
pub mod tests;

pub use model::{VertexId, Vec2, Vertex, Edge, Degree};
pub use error::{GraphError, GraphResult, ParseReason};
pub use graph::{GraphStore, GraphMutator};
pub use spawn::{SpawnPositionProvider, SpiralSpawner, ScriptedSpawner};
pub use events::GraphEvent;
pub use path::{ShortestPath, shortest_path, path_edges};
pub use import::{ImportReport, ImportDiagnostic, EdgeRecord, DEFAULT_WEIGHT, import_document, import_lines, parse_line};
pub use action_log::{Action, ActionLog};
