use tempfile::TempDir;
use wayfind_core::fingerprint::fingerprint;
use wayfind_core::graph::GraphSource;
use wayfind_core::storage;
use wayfind_core::*;

fn sample_primitives() -> PrimitiveSet {
    let mut set = PrimitiveSet::new("eng-2");
    set.insert(Room::new(
        "R1",
        "CSE Library",
        Point::new(0.0, 0.0),
        Point::new(10.0, 10.0),
    ));
    set.insert(Door::new("D1", Point::new(10.0, 5.0), 1.0).connecting(&["R1"]));
    set.insert(Hallway::new(
        "H1",
        vec![Point::new(15.0, 5.0), Point::new(20.0, 5.0)],
    ));
    set
}

fn sample_graph(fingerprint: String) -> NavGraph {
    let room = Node {
        id: NodeId::from("room:R1@5000,5000"),
        kind: NodeKind::Room,
        position: Point::new(5.0, 5.0),
        floor: None,
        source_id: Some("R1".into()),
        label: Some("CSE Library".into()),
    };
    let door = Node {
        id: NodeId::from("door:D1@10000,5000"),
        kind: NodeKind::Door,
        position: Point::new(10.0, 5.0),
        floor: None,
        source_id: Some("D1".into()),
        label: None,
    };
    let edge = Edge::new(
        room.id.clone(),
        door.id.clone(),
        5.0,
        EdgeKind::DoorRoom,
        true,
    );
    NavGraph::from_parts(
        GraphSource {
            plan_id: "eng-2".into(),
            fingerprint,
            ..GraphSource::default()
        },
        vec![room, door],
        vec![edge],
    )
    .unwrap()
}

#[test]
fn test_graph_save_and_load_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let graph = sample_graph("abc".into());
    storage::save_graph(root, &graph).unwrap();
    assert!(storage::graph_exists(root));

    let loaded = storage::load_graph(root).unwrap();
    assert_eq!(loaded, graph);
    assert_eq!(loaded.node_count(), 2);
    assert_eq!(loaded.neighbors("room:R1@5000,5000").len(), 1);

    let meta = storage::load_meta(root).unwrap().unwrap();
    assert_eq!(meta.fingerprint, "abc");
    assert_eq!(meta.nodes, 2);
    assert_eq!(meta.edges, 1);
}

#[test]
fn test_saved_graph_is_stable_across_saves() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let graph = sample_graph(String::new());
    storage::save_graph(root, &graph).unwrap();
    let first = std::fs::read_to_string(storage::graph_file(root)).unwrap();
    storage::save_graph(root, &graph).unwrap();
    let second = std::fs::read_to_string(storage::graph_file(root)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_primitives_roundtrip_keeps_fingerprint() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let set = sample_primitives();
    storage::save_primitives(root, &set).unwrap();
    let loaded = storage::load_primitives(root).unwrap();
    assert_eq!(loaded, set);
    assert_eq!(fingerprint(&loaded), fingerprint(&set));
}

#[test]
fn test_graph_exists_false() {
    let tmp = TempDir::new().unwrap();
    assert!(!storage::graph_exists(tmp.path()));
    assert!(storage::load_graph(tmp.path()).is_err());
    assert!(storage::load_meta(tmp.path()).unwrap().is_none());
}

#[test]
fn test_corrupt_graph_rejected() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::create_dir_all(storage::wayfind_dir(root)).unwrap();
    std::fs::write(
        storage::graph_file(root),
        r#"{"version": "1.0.0", "source": {"plan_id": "p"}, "nodes": {},
            "edges": [{"id": "e", "from": "a", "to": "b", "weight": 1.0,
                       "kind": "hallway", "bidirectional": true}],
            "bounds": null}"#,
    )
    .unwrap();

    let err = storage::load_graph(root).unwrap_err();
    assert!(format!("{:#}", err).contains("corrupt"));
}

#[test]
fn test_malformed_primitive_file_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("plan.json");
    std::fs::write(&path, r#"{"primitives": [{"kind": "room", "id": "R1"}]}"#).unwrap();
    assert!(storage::read_primitives(&path).is_err());
}
