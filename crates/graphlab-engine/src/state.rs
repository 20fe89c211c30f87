//! Simulation state machine

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// What the engine is currently doing.
///
/// `Running` ticks the force layout, `Paused` freezes every body, and
/// `Replaying` rebuilds the graph from the action log while rejecting
/// outside mutations. A replay always returns to the state it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SimulationState {
    #[default]
    Running,
    Paused,
    Replaying,
}

impl SimulationState {
    pub fn can_transition_to(self, to: SimulationState) -> bool {
        use SimulationState::*;
        matches!(
            (self, to),
            (Running, Paused)
                | (Paused, Running)
                | (Running, Replaying)
                | (Paused, Replaying)
                | (Replaying, Running)
                | (Replaying, Paused)
        )
    }

    /// Validate and return the new state.
    pub fn transition(self, to: SimulationState) -> EngineResult<SimulationState> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(EngineError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationState::Running => "running",
            SimulationState::Paused => "paused",
            SimulationState::Replaying => "replaying",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SimulationState::*;

    #[test]
    fn test_valid_transitions() {
        assert_eq!(Running.transition(Paused), Ok(Paused));
        assert_eq!(Paused.transition(Running), Ok(Running));
        assert_eq!(Paused.transition(Replaying), Ok(Replaying));
        assert_eq!(Replaying.transition(Paused), Ok(Paused));
    }

    #[test]
    fn test_self_transitions_rejected() {
        for state in [Running, Paused, Replaying] {
            assert_eq!(
                state.transition(state),
                Err(EngineError::InvalidTransition {
                    from: state,
                    to: state
                })
            );
        }
    }
}
