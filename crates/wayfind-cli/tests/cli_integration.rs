//! Integration tests for wayfind-cli functionality.
//! Tests the underlying library functions that the CLI commands invoke.

use wayfind_build::{Edit, apply_edits, build, rebuild};
use wayfind_core::config::{BuildConfig, NavConfig};
use wayfind_core::*;
use wayfind_route::{RouteOptions, route};

fn make_plan() -> PrimitiveSet {
    let mut set = PrimitiveSet::new("eng-building");
    set.insert(Room::new(
        "R1",
        "CSE Library",
        Point::new(0.0, 0.0),
        Point::new(10.0, 10.0),
    ));
    set.insert(Room::new(
        "R2",
        "Room 302",
        Point::new(20.0, 0.0),
        Point::new(30.0, 10.0),
    ));
    set.insert(Door::new("D", Point::new(10.0, 5.0), 1.0));
    set.insert(Hallway::new(
        "H",
        vec![Point::new(15.0, 5.0), Point::new(20.0, 5.0)],
    ));
    set
}

#[test]
fn test_graph_exists_false() {
    let tmpdir = tempfile::tempdir().unwrap();
    assert!(!storage::graph_exists(tmpdir.path()));
    assert!(storage::load_graph(tmpdir.path()).is_err());
}

#[test]
fn test_build_save_and_route_from_disk() {
    let tmpdir = tempfile::tempdir().unwrap();
    let input = tmpdir.path().join("detections.json");
    std::fs::write(&input, make_plan().to_json().unwrap()).unwrap();

    let config = NavConfig::load(tmpdir.path()).unwrap();
    let primitives = storage::read_primitives(&input).unwrap();
    let graph = build(&primitives, &config.build).unwrap();
    storage::save_primitives(tmpdir.path(), &primitives).unwrap();
    storage::save_graph(tmpdir.path(), &graph).unwrap();

    let loaded = storage::load_graph(tmpdir.path()).unwrap();
    let resp = route(&loaded, "cse library", "room 302", &RouteOptions::from(&config));
    assert!(resp.result.success);
    assert_eq!(resp.result.length, 20.0);
    assert_eq!(resp.directions.last().unwrap().text, "Arrive at Room 302");
}

#[test]
fn test_config_file_feeds_build() {
    let tmpdir = tempfile::tempdir().unwrap();
    let dir = storage::wayfind_dir(tmpdir.path());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[build]\nfloor_change_cost = 42.0\n").unwrap();

    let config = NavConfig::load(tmpdir.path()).unwrap();
    assert_eq!(config.build.floor_change_cost, 42.0);
    assert_eq!(config.build.dedup_tolerance, BuildConfig::default().dedup_tolerance);
}

#[test]
fn test_remove_then_rebuild_reports_diff() {
    let tmpdir = tempfile::tempdir().unwrap();
    let config = BuildConfig::default();
    let plan = make_plan();
    let graph = build(&plan, &config).unwrap();
    storage::save_primitives(tmpdir.path(), &plan).unwrap();
    storage::save_graph(tmpdir.path(), &graph).unwrap();

    let stored = storage::load_primitives(tmpdir.path()).unwrap();
    let (edited, summary) = apply_edits(&stored, [Edit::Remove("D".into())]).unwrap();
    assert_eq!(summary.removed, 1);

    let old = storage::load_graph(tmpdir.path()).unwrap();
    let result = rebuild(&old, &edited, &config).unwrap();
    assert!(!result.cached);
    assert_eq!(
        result.diff.removed_nodes,
        vec![NodeId::from("door:D@10000,5000")]
    );
    assert!(!result.diff.touches_node("room:R2@25000,5000"));
}

#[test]
fn test_remove_unknown_id_is_rejected() {
    let err = apply_edits(&make_plan(), [Edit::Remove("nope".into())]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPrimitive);
}

#[test]
fn test_rebuild_unchanged_is_cached() {
    let config = BuildConfig::default();
    let plan = make_plan();
    let graph = build(&plan, &config).unwrap();
    let result = rebuild(&graph, &plan, &config).unwrap();
    assert!(result.cached);
    assert!(result.diff.is_empty());
}

#[test]
fn test_validate_clean_graph() {
    let graph = build(&make_plan(), &BuildConfig::default()).unwrap();
    assert!(integrity::check(&graph).is_empty());
    assert_eq!(graph.stats().components, 1);
}

#[test]
fn test_validate_lists_every_issue_of_corrupt_graph() {
    let tmpdir = tempfile::tempdir().unwrap();
    let root = tmpdir.path();
    std::fs::create_dir_all(storage::wayfind_dir(root)).unwrap();
    std::fs::write(
        storage::graph_file(root),
        r#"{"version": "1.0.0", "source": {"plan_id": "p"}, "nodes": {},
            "edges": [{"id": "e", "from": "a", "to": "b", "weight": -1.0,
                       "kind": "hallway", "bidirectional": true}],
            "bounds": null}"#,
    )
    .unwrap();

    // Routing commands refuse it, validate still reads it.
    assert!(storage::load_graph(root).is_err());
    let graph = storage::load_graph_unchecked(root).unwrap();
    let issues = integrity::check(&graph);
    assert_eq!(issues.len(), 3, "{:?}", issues);
    assert!(issues.iter().any(|i| i.to_string().contains("invalid weight")));
}

#[test]
fn test_add_primitive_json_shape() {
    let json = r#"{"kind": "room", "id": "R3", "label": "Lab", "bounds": {"min": {"x": 15.0, "y": 10.0}, "max": {"x": 20.0, "y": 15.0}}}"#;
    let room: Primitive = serde_json::from_str(json).unwrap();
    assert_eq!(room.id(), "R3");

    let (edited, summary) = apply_edits(&make_plan(), [Edit::Upsert(room)]).unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(edited.len(), 5);
}
