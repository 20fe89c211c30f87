//! CLI command implementations

use anyhow::Context;
use graphlab_core::{ActionLog, GraphEvent, ImportReport, VertexId};
use graphlab_engine::{Engine, EngineConfig, EngineService};
use serde::Serialize;
use std::path::Path;
use tokio::sync::broadcast;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read an edge list and import it into a fresh engine.
fn build_engine(
    config: EngineConfig,
    file: &Path,
    directed: bool,
) -> anyhow::Result<(Engine, ImportReport)> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading edge list {}", file.display()))?;

    let mut engine = Engine::new(config);
    engine.set_directed(directed)?;
    let report = engine.import_document(&text)?;
    for diagnostic in &report.diagnostics {
        tracing::warn!("{}:{}: {}", file.display(), diagnostic.line, diagnostic.error);
    }
    tracing::info!(
        "Imported {} vertices, {} edges from {}",
        engine.graph().order(),
        engine.graph().size(),
        file.display()
    );
    Ok((engine, report))
}

pub fn import(
    config: EngineConfig,
    file: &Path,
    directed: bool,
    log_out: Option<&Path>,
) -> anyhow::Result<()> {
    let (engine, report) = build_engine(config, file, directed)?;

    if let Some(out) = log_out {
        std::fs::write(out, engine.log().to_text())
            .with_context(|| format!("writing action log {}", out.display()))?;
        tracing::info!("Wrote {} log records to {}", engine.log().len(), out.display());
    }

    print_json(&serde_json::json!({
        "order": engine.graph().order(),
        "size": engine.graph().size(),
        "report": report,
    }))
}

pub fn path(
    config: EngineConfig,
    file: &Path,
    start: i64,
    end: i64,
    directed: bool,
) -> anyhow::Result<()> {
    let (engine, _) = build_engine(config, file, directed)?;
    let path = engine.shortest_path(VertexId(start), VertexId(end))?;
    let edges = engine.path_edges(&path);

    print_json(&serde_json::json!({
        "vertices": path.vertices,
        "cost": path.cost,
        "hops": path.hops(),
        "edges": edges,
    }))
}

pub fn layout(config: EngineConfig, file: &Path, ticks: usize, directed: bool) -> anyhow::Result<()> {
    let (mut engine, _) = build_engine(config, file, directed)?;
    for _ in 0..ticks {
        engine.tick();
    }
    tracing::debug!("Layout ran for {} ticks", ticks);
    print_json(&engine.snapshot())
}

pub fn stats(config: EngineConfig, file: &Path, directed: bool) -> anyhow::Result<()> {
    let (engine, _) = build_engine(config, file, directed)?;
    let mut degrees = Vec::with_capacity(engine.graph().order());
    for id in engine.graph().vertex_ids() {
        let degree = engine.degree(id)?;
        degrees.push(serde_json::json!({
            "id": id,
            "degree": degree.degree,
            "in": degree.in_degree,
            "out": degree.out_degree,
        }));
    }

    print_json(&serde_json::json!({
        "directed": engine.graph().is_directed(),
        "order": engine.graph().order(),
        "size": engine.graph().size(),
        "vertices": degrees,
    }))
}

/// Rebuild the logged graph, then play it back as a timelapse on the engine
/// service. Structural events are printed one JSON object per line; Ctrl-C
/// stops the replay early.
pub async fn replay(
    mut config: EngineConfig,
    log_path: &Path,
    pacing_ms: Option<u64>,
) -> anyhow::Result<()> {
    if let Some(ms) = pacing_ms {
        config.replay.pacing_ms = ms;
    }
    let text = std::fs::read_to_string(log_path)
        .with_context(|| format!("reading action log {}", log_path.display()))?;
    let log = ActionLog::from_text(&text)
        .with_context(|| format!("parsing action log {}", log_path.display()))?;

    let mut engine = Engine::new(config);
    for action in &log {
        if let Err(e) = engine.apply_action(*action) {
            tracing::warn!("Skipping log record `{}`: {}", action, e);
        }
    }

    let service = EngineService::spawn(engine);
    let handle = service.handle();
    let mut events = handle.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(GraphEvent::PositionChanged { .. }) => continue,
                Ok(event) => {
                    let done = matches!(event, GraphEvent::ReplayFinished { .. });
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::warn!("Failed to serialize event: {}", e),
                    }
                    if done {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event stream lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let pending = handle.start_replay().await?;
    tracing::info!("Replaying {} commands from {}", pending.total(), log_path.display());

    let finished = pending.finished();
    tokio::pin!(finished);
    let outcome = tokio::select! {
        outcome = &mut finished => outcome?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping replay");
            handle.stop_replay().await?;
            finished.await?
        }
    };
    printer.await?;

    for failure in &outcome.failures {
        tracing::warn!("Record {} (`{}`) failed: {}", failure.index + 1, failure.action, failure.error);
    }
    tracing::info!(
        "Replay {}: {} applied, {} failed",
        if outcome.stopped { "stopped" } else { "finished" },
        outcome.applied,
        outcome.failures.len()
    );

    service.shutdown().await?;
    Ok(())
}
