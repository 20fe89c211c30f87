//! Single-writer engine task
//!
//! The [`Engine`] lives on one tokio task. Callers talk to it through a
//! cloneable [`EngineHandle`]; every request is a message, so mutations,
//! layout ticks and replay steps are strictly serialized.

use graphlab_core::{Degree, GraphEvent, ImportReport, ShortestPath, Vec2, VertexId};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{Engine, GraphSnapshot};
use crate::error::{EngineError, EngineResult};
use crate::replay::{ReplayCursor, ReplayOutcome};
use crate::state::SimulationState;

const COMMAND_BUFFER: usize = 64;

type EngineFn = Box<dyn FnOnce(&mut Engine) + Send>;

enum Command {
    Run(EngineFn),
    StartReplay {
        reply: oneshot::Sender<EngineResult<usize>>,
        done: oneshot::Sender<ReplayOutcome>,
    },
    StopReplay {
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

struct ActiveReplay {
    cursor: ReplayCursor,
    due: Instant,
    done: oneshot::Sender<ReplayOutcome>,
}

/// The running engine task.
pub struct EngineService {
    handle: EngineHandle,
    task: JoinHandle<Engine>,
}

impl EngineService {
    /// Move `engine` onto its own task. Must be called inside a tokio runtime.
    pub fn spawn(engine: Engine) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let handle = EngineHandle {
            tx,
            events: engine.event_sender(),
        };
        let task = tokio::spawn(run(engine, rx));
        EngineService { handle, task }
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the task and get the engine back.
    pub async fn shutdown(self) -> EngineResult<Engine> {
        // The task may already be gone if every handle was dropped.
        let _ = self.handle.tx.send(Command::Shutdown).await;
        self.task.await.map_err(|e| {
            warn!("Engine task failed: {}", e);
            EngineError::ServiceClosed
        })
    }
}

async fn run(mut engine: Engine, mut rx: mpsc::Receiver<Command>) -> Engine {
    let mut ticker = interval(engine.config().physics.fixed_dt());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let pacing = engine.config().replay.pacing();
    let mut replay: Option<ActiveReplay> = None;

    info!("Engine service started");
    loop {
        let due = replay.as_ref().map(|r| r.due);
        tokio::select! {
            command = rx.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(Command::Run(f)) => f(&mut engine),
                Some(Command::StartReplay { reply, done }) => {
                    let started = engine.begin_replay().map(|cursor| {
                        let total = cursor.remaining();
                        replay = Some(ActiveReplay {
                            cursor,
                            due: Instant::now(),
                            done,
                        });
                        total
                    });
                    let _ = reply.send(started);
                }
                Some(Command::StopReplay { reply }) => {
                    let stopped = match replay.take() {
                        Some(active) => {
                            stop_replay(&mut engine, active);
                            true
                        }
                        None => false,
                    };
                    let _ = reply.send(stopped);
                }
            },
            _ = ticker.tick() => {
                engine.tick();
            }
            _ = sleep_until(due.unwrap_or_else(Instant::now)), if due.is_some() => {
                if let Some(mut active) = replay.take() {
                    engine.replay_step(&mut active.cursor);
                    if active.cursor.is_finished() {
                        let outcome = engine.finish_replay(active.cursor);
                        let _ = active.done.send(outcome);
                    } else {
                        active.due = Instant::now() + pacing;
                        replay = Some(active);
                    }
                }
            }
        }
    }

    if let Some(active) = replay.take() {
        stop_replay(&mut engine, active);
    }
    info!("Engine service stopped");
    engine
}

fn stop_replay(engine: &mut Engine, mut active: ActiveReplay) {
    debug!(position = active.cursor.position(), "stopping replay");
    active.cursor.stop();
    let outcome = engine.finish_replay(active.cursor);
    let _ = active.done.send(outcome);
}

/// A replay that has been started on the service.
#[derive(Debug)]
pub struct PendingReplay {
    total: usize,
    done: oneshot::Receiver<ReplayOutcome>,
}

impl PendingReplay {
    /// Number of logged commands being replayed.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Wait until the replay completes or is stopped.
    pub async fn finished(self) -> EngineResult<ReplayOutcome> {
        self.done.await.map_err(|_| EngineError::ServiceClosed)
    }
}

/// Cloneable client for an [`EngineService`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<GraphEvent>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl EngineHandle {
    /// Run `f` on the engine task and return its result.
    pub async fn call<R, F>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&mut Engine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let command = Command::Run(Box::new(move |engine: &mut Engine| {
            let _ = reply.send(f(engine));
        }));
        self.tx
            .send(command)
            .await
            .map_err(|_| EngineError::ServiceClosed)?;
        rx.await.map_err(|_| EngineError::ServiceClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    pub async fn add_vertex(&self, id: VertexId) -> EngineResult<()> {
        self.call(move |engine| engine.add_vertex(id)).await?
    }

    pub async fn remove_vertex(&self, id: VertexId) -> EngineResult<()> {
        self.call(move |engine| engine.remove_vertex(id)).await?
    }

    pub async fn add_edge(&self, from: VertexId, to: VertexId, weight: f32) -> EngineResult<()> {
        self.call(move |engine| engine.add_edge(from, to, weight)).await?
    }

    pub async fn remove_edge(&self, from: VertexId, to: VertexId) -> EngineResult<()> {
        self.call(move |engine| engine.remove_edge(from, to)).await?
    }

    pub async fn clear(&self) -> EngineResult<()> {
        self.call(|engine| engine.clear()).await?
    }

    pub async fn set_directed(&self, directed: bool) -> EngineResult<()> {
        self.call(move |engine| engine.set_directed(directed)).await?
    }

    pub async fn import_document(&self, text: impl Into<String>) -> EngineResult<ImportReport> {
        let text = text.into();
        self.call(move |engine| engine.import_document(&text)).await?
    }

    pub async fn degree(&self, id: VertexId) -> EngineResult<Degree> {
        self.call(move |engine| engine.degree(id)).await?
    }

    pub async fn shortest_path(&self, start: VertexId, end: VertexId) -> EngineResult<ShortestPath> {
        self.call(move |engine| engine.shortest_path(start, end)).await?
    }

    pub async fn snapshot(&self) -> EngineResult<GraphSnapshot> {
        self.call(|engine| engine.snapshot()).await
    }

    pub async fn state(&self) -> EngineResult<SimulationState> {
        self.call(|engine| engine.state()).await
    }

    pub async fn pause(&self) -> EngineResult<()> {
        self.call(|engine| engine.pause()).await?
    }

    pub async fn resume(&self) -> EngineResult<()> {
        self.call(|engine| engine.resume()).await?
    }

    pub async fn begin_drag(&self, id: VertexId) -> EngineResult<()> {
        self.call(move |engine| engine.begin_drag(id)).await?
    }

    pub async fn update_drag(&self, id: VertexId, position: Vec2) -> EngineResult<()> {
        self.call(move |engine| engine.update_drag(id, position)).await?
    }

    pub async fn end_drag(&self, id: VertexId) -> EngineResult<()> {
        self.call(move |engine| engine.end_drag(id)).await?
    }

    /// Start replaying the action log at the configured pacing.
    ///
    /// The first command is applied right away; the graph is rebuilt in the
    /// background while queries keep being answered.
    pub async fn start_replay(&self) -> EngineResult<PendingReplay> {
        let (reply, rx) = oneshot::channel();
        let (done, done_rx) = oneshot::channel();
        self.tx
            .send(Command::StartReplay { reply, done })
            .await
            .map_err(|_| EngineError::ServiceClosed)?;
        let total = rx.await.map_err(|_| EngineError::ServiceClosed)??;
        Ok(PendingReplay {
            total,
            done: done_rx,
        })
    }

    /// Abort the running replay. Returns `false` if none was running.
    pub async fn stop_replay(&self) -> EngineResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::StopReplay { reply })
            .await
            .map_err(|_| EngineError::ServiceClosed)?;
        rx.await.map_err(|_| EngineError::ServiceClosed)
    }
}
