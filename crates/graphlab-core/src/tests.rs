//! Unit tests for the graph store

use crate::*;

fn v(id: i64) -> VertexId {
    VertexId(id)
}

fn store_with_vertices(ids: &[i64]) -> GraphStore {
    let mut graph = GraphStore::new();
    for &id in ids {
        graph.add_vertex(v(id)).unwrap();
    }
    graph
}

/// Every edge must appear in the relation lists of both endpoints, and the
/// directed lists must be empty in undirected mode.
fn assert_relations_consistent(graph: &GraphStore) {
    let mut incident_total = 0;
    for vertex in graph.vertices() {
        let incident: Vec<&Edge> = graph.incident_edges(vertex.id).unwrap().collect();
        incident_total += incident.len();
        for edge in &incident {
            assert!(edge.touches(vertex.id));
            assert!(graph.contains_vertex(edge.from));
            assert!(graph.contains_vertex(edge.to));
            assert_eq!(edge.directed, graph.is_directed());
        }
        if graph.is_directed() {
            assert!(graph.outgoing_edges(vertex.id).unwrap().all(|e| e.from == vertex.id));
            assert!(graph.incoming_edges(vertex.id).unwrap().all(|e| e.to == vertex.id));
        } else {
            assert_eq!(vertex.in_degree(), 0);
            assert_eq!(vertex.out_degree(), 0);
        }
    }
    let self_loops = graph.edges().filter(|e| e.from == e.to).count();
    assert_eq!(incident_total, graph.size() * 2 - self_loops);
}

#[test]
fn test_add_vertex_rejects_duplicate_id() {
    let mut graph = store_with_vertices(&[1]);
    assert_eq!(graph.add_vertex(v(1)), Err(GraphError::DuplicateId(v(1))));
    assert_eq!(graph.order(), 1);
}

#[test]
fn test_add_vertex_without_spawn_position() {
    let mut graph = GraphStore::with_spawner(Box::new(ScriptedSpawner::default()));
    assert_eq!(graph.add_vertex(v(1)), Err(GraphError::NoSpawnPosition(v(1))));
    assert!(graph.is_empty());
}

#[test]
fn test_vertex_uses_spawn_position() {
    let spawner = ScriptedSpawner::new([Vec2::new(3.0, -2.0)]);
    let mut graph = GraphStore::with_spawner(Box::new(spawner));
    let position = graph.add_vertex(v(5)).unwrap();
    assert_eq!(position, Vec2::new(3.0, -2.0));
    assert_eq!(graph.position(v(5)), Some(position));
    assert!(!graph.vertex(v(5)).unwrap().dragging);
}

#[test]
fn test_add_then_remove_vertex_restores_count() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();

    graph.add_vertex(v(9)).unwrap();
    graph.add_edge(v(9), v(1), 2.0).unwrap();
    graph.add_edge(v(3), v(9), 2.0).unwrap();
    let removed = graph.remove_vertex(v(9)).unwrap();

    assert_eq!(removed.len(), 2);
    assert_eq!(graph.order(), 3);
    assert_eq!(graph.size(), 1);
    assert!(graph.edges().all(|e| !e.touches(v(9))));
    assert_eq!(graph.adjacent_vertices(v(1)).unwrap(), vec![v(2)]);
    assert_relations_consistent(&graph);
}

#[test]
fn test_remove_missing_vertex_changes_nothing() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(2), v(3), 1.0).unwrap();
    let before: Vec<Vec<VertexId>> = graph
        .vertex_ids()
        .into_iter()
        .map(|id| graph.adjacent_vertices(id).unwrap())
        .collect();

    assert_eq!(graph.remove_vertex(v(42)), Err(GraphError::VertexNotFound(v(42))));

    let after: Vec<Vec<VertexId>> = graph
        .vertex_ids()
        .into_iter()
        .map(|id| graph.adjacent_vertices(id).unwrap())
        .collect();
    assert_eq!(graph.order(), 3);
    assert_eq!(graph.size(), 2);
    assert_eq!(before, after);
}

#[test]
fn test_undirected_adjacency_is_symmetric() {
    let mut graph = store_with_vertices(&[1, 2]);
    graph.add_edge(v(1), v(2), 4.0).unwrap();
    assert!(graph.are_adjacent(v(1), v(2)));
    assert!(graph.are_adjacent(v(2), v(1)));
    assert!(!graph.are_adjacent(v(1), v(3)));
}

#[test]
fn test_directed_adjacency_follows_orientation() {
    let mut graph = store_with_vertices(&[1, 2]);
    graph.set_directed(true).unwrap();
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    assert!(graph.are_adjacent(v(1), v(2)));
    assert!(!graph.are_adjacent(v(2), v(1)));
}

#[test]
fn test_duplicate_edges_rejected_in_both_modes() {
    let mut graph = store_with_vertices(&[1, 2]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    assert_eq!(
        graph.add_edge(v(1), v(2), 7.0),
        Err(GraphError::DuplicateEdge { from: v(1), to: v(2) })
    );
    assert_eq!(
        graph.add_edge(v(2), v(1), 7.0),
        Err(GraphError::DuplicateEdge { from: v(2), to: v(1) })
    );

    let mut directed = store_with_vertices(&[1, 2]);
    directed.set_directed(true).unwrap();
    directed.add_edge(v(1), v(2), 1.0).unwrap();
    assert!(matches!(
        directed.add_edge(v(1), v(2), 1.0),
        Err(GraphError::DuplicateEdge { .. })
    ));
    // The reverse pair is a different edge when directed.
    directed.add_edge(v(2), v(1), 1.0).unwrap();
    assert_eq!(directed.size(), 2);
}

#[test]
fn test_add_edge_requires_both_endpoints() {
    let mut graph = store_with_vertices(&[1]);
    assert_eq!(graph.add_edge(v(1), v(2), 1.0), Err(GraphError::VertexNotFound(v(2))));
    assert_eq!(graph.add_edge(v(3), v(1), 1.0), Err(GraphError::VertexNotFound(v(3))));
    assert_eq!(graph.size(), 0);
}

#[test]
fn test_remove_edge_errors() {
    let mut graph = store_with_vertices(&[1, 2]);
    assert_eq!(graph.remove_edge(v(1), v(9)), Err(GraphError::VertexNotFound(v(9))));
    assert_eq!(
        graph.remove_edge(v(1), v(2)),
        Err(GraphError::EdgeNotFound { from: v(1), to: v(2) })
    );
}

#[test]
fn test_undirected_remove_edge_accepts_either_order() {
    let mut graph = store_with_vertices(&[1, 2]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    let removed = graph.remove_edge(v(2), v(1)).unwrap();
    assert_eq!((removed.from, removed.to), (v(1), v(2)));
    assert_eq!(graph.degree(v(1)).unwrap().degree, 0);
    assert_relations_consistent(&graph);
}

#[test]
fn test_degrees() {
    let mut graph = store_with_vertices(&[1, 2, 3, 4]);
    graph.set_directed(true).unwrap();
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(3), v(1), 1.0).unwrap();
    graph.add_edge(v(1), v(4), 1.0).unwrap();

    assert_eq!(
        graph.degree(v(1)).unwrap(),
        Degree {
            degree: 3,
            in_degree: 1,
            out_degree: 2
        }
    );
    assert_eq!(graph.degree(v(4)), Err(GraphError::VertexNotFound(v(4))));

    graph.set_directed(false).unwrap();
    let undirected = graph.degree(v(1)).unwrap();
    assert_eq!((undirected.degree, undirected.in_degree, undirected.out_degree), (3, 0, 0));
}

#[test]
fn test_adjacent_vertices_one_per_incident_edge() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(2), v(1), 1.0).unwrap();
    graph.add_edge(v(1), v(3), 1.0).unwrap();
    assert_eq!(graph.adjacent_vertices(v(1)).unwrap(), vec![v(2), v(3)]);
    assert_eq!(graph.adjacent_vertices(v(2)).unwrap(), vec![v(1)]);
}

#[test]
fn test_toggle_directed_rebuilds_relations() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(3), v(2), 1.0).unwrap();
    assert_relations_consistent(&graph);

    graph.set_directed(true).unwrap();
    assert!(graph.edges().all(|e| e.directed));
    assert_eq!(graph.degree(v(2)).unwrap().in_degree, 2);
    assert_eq!(graph.degree(v(1)).unwrap().out_degree, 1);
    assert_relations_consistent(&graph);

    graph.set_directed(false).unwrap();
    assert!(graph.edges().all(|e| !e.directed));
    assert_relations_consistent(&graph);
}

#[test]
fn test_self_loop_counts_twice_toward_degree() {
    let mut graph = store_with_vertices(&[1, 2]);
    graph.add_edge(v(1), v(1), 1.0).unwrap();
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    assert_eq!(graph.adjacent_vertices(v(1)).unwrap(), vec![v(1), v(1), v(2)]);
    assert_eq!(graph.degree(v(1)).unwrap().degree, 3);
    assert_relations_consistent(&graph);

    graph.set_directed(true).unwrap();
    let directed = graph.degree(v(1)).unwrap();
    assert_eq!((directed.degree, directed.in_degree, directed.out_degree), (3, 1, 2));
    assert_eq!(directed.degree, directed.in_degree + directed.out_degree);

    graph.remove_vertex(v(1)).unwrap();
    assert_eq!(graph.size(), 0);
    assert_relations_consistent(&graph);
}

#[test]
fn test_undirecting_reciprocal_edges_is_rejected() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.set_directed(true).unwrap();
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(2), v(3), 1.0).unwrap();
    graph.add_edge(v(2), v(1), 4.0).unwrap();

    assert_eq!(
        graph.set_directed(false),
        Err(GraphError::DuplicateEdge { from: v(2), to: v(1) })
    );
    assert!(graph.is_directed());
    assert!(graph.edges().all(|e| e.directed));
    assert_eq!(graph.degree(v(2)).unwrap().in_degree, 1);
    assert_relations_consistent(&graph);

    graph.remove_edge(v(2), v(1)).unwrap();
    graph.set_directed(false).unwrap();
    assert_eq!(graph.adjacent_vertices(v(1)).unwrap(), vec![v(2)]);
    graph.remove_edge(v(2), v(1)).unwrap();
    assert!(!graph.are_adjacent(v(1), v(2)));
    assert_relations_consistent(&graph);
}

#[test]
fn test_add_edge_rejects_invalid_weights() {
    let mut graph = store_with_vertices(&[1, 2]);
    assert_eq!(
        graph.add_edge(v(1), v(2), -3.0),
        Err(GraphError::InvalidWeight { from: v(1), to: v(2), weight: -3.0 })
    );
    assert!(matches!(
        graph.add_edge(v(1), v(2), f32::NAN),
        Err(GraphError::InvalidWeight { .. })
    ));
    assert!(graph.add_edge(v(1), v(2), f32::INFINITY).is_err());
    assert_eq!(graph.size(), 0);
    graph.add_edge(v(1), v(2), 0.0).unwrap();
}

#[test]
fn test_clear_removes_edges_then_vertices() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(2), v(3), 1.0).unwrap();
    graph.record_events(true);

    let (edges, vertices) = graph.clear();

    assert_eq!(edges.len(), 2);
    assert_eq!(vertices, vec![v(1), v(2), v(3)]);
    assert!(graph.is_empty());
    let events = graph.take_events();
    let first_vertex = events
        .iter()
        .position(|e| matches!(e, GraphEvent::VertexRemoved { .. }))
        .unwrap();
    assert!(events[..first_vertex]
        .iter()
        .all(|e| matches!(e, GraphEvent::EdgeRemoved { .. })));
}

#[test]
fn test_vertices_iterate_in_insertion_order() {
    let mut graph = store_with_vertices(&[5, 1, 9]);
    graph.remove_vertex(v(1)).unwrap();
    graph.add_vertex(v(1)).unwrap();
    let ids: Vec<VertexId> = graph.vertices().map(|vx| vx.id).collect();
    assert_eq!(ids, vec![v(5), v(9), v(1)]);
}

#[test]
fn test_events_only_when_recording() {
    let mut graph = store_with_vertices(&[1]);
    assert!(graph.take_events().is_empty());

    graph.record_events(true);
    graph.add_vertex(v(2)).unwrap();
    graph.add_edge(v(1), v(2), 2.5).unwrap();
    graph.set_position(v(1), Vec2::new(1.0, 1.0)).unwrap();
    let events = graph.take_events();
    assert_eq!(events.len(), 3);
    assert!(events[0].is_structural());
    assert_eq!(
        events[1],
        GraphEvent::EdgeAdded {
            from: v(1),
            to: v(2),
            weight: 2.5
        }
    );
    assert!(!events[2].is_structural());
}

#[test]
fn test_edge_kept_in_insertion_order_after_reuse() {
    let mut graph = store_with_vertices(&[1, 2, 3]);
    graph.add_edge(v(1), v(2), 1.0).unwrap();
    graph.add_edge(v(2), v(3), 1.0).unwrap();
    graph.remove_edge(v(1), v(2)).unwrap();
    graph.add_edge(v(3), v(1), 1.0).unwrap();
    let pairs: Vec<(VertexId, VertexId)> = graph.edges().map(|e| (e.from, e.to)).collect();
    assert_eq!(pairs, vec![(v(2), v(3)), (v(3), v(1))]);
    assert_relations_consistent(&graph);
}
