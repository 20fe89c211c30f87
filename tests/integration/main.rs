//! Integration tests for Graphlab
//!
//! These exercise the crates together and drive the CLI binary end to end.

use std::process::Command;
use std::time::Duration;

use graphlab_core::{ActionLog, GraphEvent, ScriptedSpawner, Vec2, VertexId};
use graphlab_engine::{Engine, EngineConfig, EngineService, SimulationState};
use graphlab_layout::EulerIntegrator;
use tempfile::TempDir;

const EDGES: &str = "# roads\n1,2,4\n1,3,1\n3,2,1\n\n2,4,5\nnot an edge\n";

fn graphlab(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_graphlab"))
        .args(args)
        .output()
        .expect("Failed to execute graphlab")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

fn structure(engine: &Engine) -> (Vec<i64>, Vec<(i64, i64)>) {
    (
        engine.graph().vertices().map(|v| v.id.0).collect(),
        engine.graph().edges().map(|e| (e.from.0, e.to.0)).collect(),
    )
}

#[test]
fn test_log_text_rebuilds_same_graph() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.import_document(EDGES).unwrap();
    engine.remove_vertex(VertexId(3)).unwrap();

    let text = engine.log().to_text();
    let log = ActionLog::from_text(&text).unwrap();
    assert_eq!(&log, engine.log());

    let mut rebuilt = Engine::new(EngineConfig::default());
    for action in &log {
        rebuilt.apply_action(*action).unwrap();
    }
    assert_eq!(structure(&rebuilt), structure(&engine));
    assert_eq!(rebuilt.log(), engine.log());
}

#[test]
fn test_layout_settles_connected_pair() {
    let config = EngineConfig::default();
    let spawner = ScriptedSpawner::new([Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0)]);
    let physics = EulerIntegrator::new(config.physics.body());
    let mut engine = Engine::with_parts(config, Box::new(spawner), Box::new(physics));
    engine.add_vertex(VertexId(1)).unwrap();
    engine.add_vertex(VertexId(2)).unwrap();
    engine.add_edge(VertexId(1), VertexId(2), 1.0).unwrap();

    for _ in 0..2_000 {
        engine.tick();
    }
    let a = engine.graph().position(VertexId(1)).unwrap();
    let b = engine.graph().position(VertexId(2)).unwrap();
    assert!(a.is_finite() && b.is_finite());
    assert!((a - b).length() < 10.0);
    assert!((a + b).length() < 1.0, "pair should straddle the origin");
}

#[tokio::test(start_paused = true)]
async fn test_service_timelapse_matches_live_graph() {
    let mut engine = Engine::new(EngineConfig::default());
    engine.import_document(EDGES).unwrap();
    engine.remove_edge(VertexId(1), VertexId(3)).unwrap();
    let expected = structure(&engine);
    let logged = engine.log().len();

    let service = EngineService::spawn(engine);
    let handle = service.handle();
    let mut events = handle.subscribe();

    let pending = handle.start_replay().await.unwrap();
    assert_eq!(pending.total(), logged);
    let outcome = pending.finished().await.unwrap();
    assert!(outcome.is_complete());
    assert!(outcome.failures.is_empty());

    let mut started = false;
    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            GraphEvent::ReplayStarted => started = true,
            GraphEvent::ReplayFinished { stopped, .. } => finished = !stopped,
            _ => {}
        }
    }
    assert!(started && finished);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.state().await.unwrap(), SimulationState::Running);

    let engine = service.shutdown().await.unwrap();
    assert_eq!(structure(&engine), expected);
    assert_eq!(engine.log().len(), logged);
}

#[test]
fn test_cli_help() {
    let output = graphlab(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("graphlab"));
    for command in ["import", "path", "layout", "replay", "stats"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn test_cli_import_path_and_stats() {
    let dir = TempDir::new().unwrap();
    let edges = write(&dir, "roads.csv", EDGES);
    let log_path = dir.path().join("roads.log");
    let log_arg = log_path.to_string_lossy().into_owned();

    let output = graphlab(&["import", &edges, "--log-out", &log_arg]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["order"], 4);
    assert_eq!(report["size"], 4);
    assert_eq!(report["report"]["diagnostics"].as_array().unwrap().len(), 2);

    let log = ActionLog::from_text(&std::fs::read_to_string(&log_path).unwrap()).unwrap();
    assert_eq!(log.len(), 8);

    let output = graphlab(&["path", &edges, "1", "2"]);
    assert!(output.status.success());
    let path: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(path["vertices"], serde_json::json!([1, 3, 2]));
    assert_eq!(path["cost"], 2.0);
    assert_eq!(path["hops"], 2);

    let output = graphlab(&["path", &edges, "4", "1", "--directed"]);
    assert!(!output.status.success());

    let output = graphlab(&["stats", &edges, "--directed"]);
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["directed"], true);
    let first = &stats["vertices"][0];
    assert_eq!(first["id"], 1);
    assert_eq!(first["out"], 2);
    assert_eq!(first["in"], 0);
}

#[test]
fn test_cli_layout_with_config_file() {
    let dir = TempDir::new().unwrap();
    let edges = write(&dir, "pair.csv", "1,2\n");
    let config = write(&dir, "graphlab.toml", "[physics]\nfixed_dt_ms = 10\n");

    let output = graphlab(&["layout", &edges, "--ticks", "50", "--config", &config]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["vertices"].as_array().unwrap().len(), 2);
    assert_eq!(snapshot["state"], "Running");

    let bad = write(&dir, "bad.toml", "[physics]\nmass = -1.0\n");
    let output = graphlab(&["layout", &edges, "--config", &bad]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_replay_streams_events() {
    let dir = TempDir::new().unwrap();
    let log = write(
        &dir,
        "session.log",
        "AddVertex,1\nAddVertex,2\nAddEdge,1,2,3\nRemoveEdge,1,2\n",
    );

    let output = graphlab(&["replay", &log, "--pacing-ms", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(kinds.first(), Some(&"replay_started"));
    assert_eq!(kinds.last(), Some(&"replay_finished"));
    assert!(kinds.contains(&"edge_added"));
    assert!(kinds.contains(&"edge_removed"));
    let last = events.last().unwrap();
    assert_eq!(last["applied"], 4);
    assert_eq!(last["stopped"], false);
}

#[test]
fn test_cli_rejects_malformed_log() {
    let dir = TempDir::new().unwrap();
    let log = write(&dir, "broken.log", "AddVertex,1\nJump,2\n");
    let output = graphlab(&["replay", &log]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("parsing action log"));
    assert!(output.stdout.is_empty());
}
