//! Structural and positional change notifications

use serde::{Deserialize, Serialize};

use crate::model::{Vec2, VertexId};

/// A change that renderers and other observers may want to hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    VertexAdded { id: VertexId, position: Vec2 },
    VertexRemoved { id: VertexId },
    EdgeAdded { from: VertexId, to: VertexId, weight: f32 },
    EdgeRemoved { from: VertexId, to: VertexId },
    PositionChanged { id: VertexId, position: Vec2 },
    ReplayStarted,
    ReplayFinished { applied: usize, failed: usize, stopped: bool },
}

impl GraphEvent {
    /// Whether this event reflects a topology change.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphEvent::VertexAdded { .. }
                | GraphEvent::VertexRemoved { .. }
                | GraphEvent::EdgeAdded { .. }
                | GraphEvent::EdgeRemoved { .. }
        )
    }
}
