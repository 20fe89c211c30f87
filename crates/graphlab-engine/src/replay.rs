//! Replaying the action log against an empty graph ("timelapse")
//!
//! A replay is a cursor over a snapshot of the log. Each step applies one
//! command through the normal mutation path; between steps the caller is free
//! to yield for the pacing interval. A stop request ends the replay early and
//! leaves whatever the last applied command produced.

use std::time::Duration;

use graphlab_core::{Action, GraphError, GraphEvent};
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::engine::{Applier, Engine};
use crate::error::EngineResult;
use crate::state::SimulationState;

/// A recorded command that could not be re-applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFailure {
    pub index: usize,
    pub action: Action,
    pub error: GraphError,
}

/// Summary of a finished (or stopped) replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub total: usize,
    pub applied: usize,
    pub failures: Vec<ReplayFailure>,
    /// True when a stop request cut the replay short.
    pub stopped: bool,
}

impl ReplayOutcome {
    pub fn is_complete(&self) -> bool {
        !self.stopped && self.applied + self.failures.len() == self.total
    }
}

/// Progress through a replay. Obtained from [`Engine::begin_replay`].
#[derive(Debug)]
pub struct ReplayCursor {
    actions: Vec<Action>,
    next: usize,
    applied: usize,
    failures: Vec<ReplayFailure>,
    resume_to: SimulationState,
    stopped: bool,
}

impl ReplayCursor {
    pub fn is_finished(&self) -> bool {
        self.stopped || self.next >= self.actions.len()
    }

    pub fn remaining(&self) -> usize {
        self.actions.len().saturating_sub(self.next)
    }

    pub fn position(&self) -> usize {
        self.next
    }

    /// Abandon the remaining commands.
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}

impl Engine {
    /// Enter the replaying state and clear the graph without logging.
    pub fn begin_replay(&mut self) -> EngineResult<ReplayCursor> {
        let resume_to = self.state;
        self.state = self.state.transition(SimulationState::Replaying)?;
        self.layout.disable(&self.graph, self.physics.as_mut());
        self.publish(GraphEvent::ReplayStarted);

        self.graph.clear();
        self.physics.clear();
        self.flush_events();

        let actions = self.log.as_slice().to_vec();
        info!(commands = actions.len(), "Replay started");
        Ok(ReplayCursor {
            actions,
            next: 0,
            applied: 0,
            failures: Vec::new(),
            resume_to,
            stopped: false,
        })
    }

    /// Apply the next command. Returns `false` once nothing is left to do.
    ///
    /// A failing command is recorded and skipped; the replay carries on.
    pub fn replay_step(&mut self, cursor: &mut ReplayCursor) -> bool {
        if cursor.is_finished() {
            return false;
        }
        let index = cursor.next;
        let action = cursor.actions[index];
        cursor.next += 1;

        match action.apply(&mut Applier(self)) {
            Ok(()) => cursor.applied += 1,
            Err(error) => {
                warn!(index, %action, %error, "Replay command failed, skipping");
                cursor.failures.push(ReplayFailure {
                    index,
                    action,
                    error,
                });
            }
        }
        true
    }

    /// Leave the replaying state, restoring whatever state preceded it.
    pub fn finish_replay(&mut self, cursor: ReplayCursor) -> ReplayOutcome {
        // Replaying always transitions back to Running or Paused.
        self.state = cursor.resume_to;
        if self.state == SimulationState::Running {
            self.layout.enable(&self.graph, self.physics.as_mut());
        }

        let outcome = ReplayOutcome {
            total: cursor.actions.len(),
            applied: cursor.applied,
            failures: cursor.failures,
            stopped: cursor.stopped,
        };
        self.publish(GraphEvent::ReplayFinished {
            applied: outcome.applied,
            failed: outcome.failures.len(),
            stopped: outcome.stopped,
        });
        info!(
            applied = outcome.applied,
            failed = outcome.failures.len(),
            stopped = outcome.stopped,
            "Replay finished"
        );
        outcome
    }

    /// Replay the whole log, yielding for `pacing` between commands.
    ///
    /// Setting `stop` to `true` aborts the remaining commands; the graph keeps
    /// the state produced by the last applied one.
    pub async fn replay(
        &mut self,
        pacing: Duration,
        mut stop: watch::Receiver<bool>,
    ) -> EngineResult<ReplayOutcome> {
        let mut cursor = self.begin_replay()?;
        loop {
            if *stop.borrow() {
                cursor.stop();
                break;
            }
            if !self.replay_step(&mut cursor) || cursor.is_finished() {
                break;
            }
            if pause_or_stop(pacing, &mut stop).await {
                cursor.stop();
                break;
            }
        }
        Ok(self.finish_replay(cursor))
    }
}

/// Wait out the pacing interval. Returns `true` if a stop was requested first.
async fn pause_or_stop(pacing: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    let deadline = Instant::now() + pacing;
    tokio::select! {
        _ = sleep_until(deadline) => false,
        requested = async { stop.wait_for(|stop| *stop).await.is_ok() } => {
            if !requested {
                // Sender dropped: nobody can ask us to stop any more.
                sleep_until(deadline).await;
            }
            requested
        }
    }
}
