use wayfind_build::build;
use wayfind_core::config::BuildConfig;
use wayfind_core::*;
use wayfind_route::export::{ExportFormat, export};

fn make_graph() -> NavGraph {
    let mut set = PrimitiveSet::new("eng");
    let mut lab = Room::new("R1", "Lab", Point::new(0.0, 0.0), Point::new(10.0, 10.0));
    lab.floor = Some(1);
    set.insert(lab);
    let mut door = Door::new("D1", Point::new(10.0, 5.0), 1.0);
    door.floor = Some(1);
    door.one_way = true;
    set.insert(door);
    for (id, floor) in [("S1", 1), ("S2", 2)] {
        let mut stair = Hallway::new(id, vec![Point::new(15.0, 5.0), Point::new(20.0, 5.0)]);
        stair.hallway_type = HallwayKind::Stair;
        stair.floor = Some(floor);
        stair.shaft = Some("A".into());
        set.insert(stair);
    }
    build(&set, &BuildConfig::default()).unwrap()
}

#[test]
fn test_export_dot_styles_edge_kinds() {
    let dot = export(&make_graph(), ExportFormat::Dot);

    assert!(dot.starts_with("graph \"eng\" {"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("pos=\"5,5!\""), "room centroid should be pinned");
    assert!(dot.contains("shape=trapezium"), "stairs use trapezium");
    assert!(dot.contains("style=dotted"), "floor change edges are dotted");
    assert!(dot.contains("dir=forward"), "one-way door edge is directed");
    assert!(dot.contains("floor_change 100.0"));
}

#[test]
fn test_export_dot_escapes_node_ids() {
    let mut set = PrimitiveSet::new("eng");
    set.insert(Room::new(
        "R\"1",
        "Lab",
        Point::new(0.0, 0.0),
        Point::new(10.0, 10.0),
    ));
    set.insert(Door::new("D1", Point::new(10.0, 5.0), 1.0).connecting(&["R\"1"]));
    let dot = export(&build(&set, &BuildConfig::default()).unwrap(), ExportFormat::Dot);

    let escaped = r#""room:R\"1@5000,5000""#;
    assert!(dot.contains(&format!("  {} [shape=", escaped)), "{dot}");
    // One node line plus the door edge.
    assert_eq!(dot.matches(escaped).count(), 2, "{dot}");
    assert!(!dot.contains(r#"R"1"#));
}

#[test]
fn test_export_mermaid_groups_floors() {
    let mermaid = export(&make_graph(), ExportFormat::Mermaid);

    assert!(mermaid.starts_with("flowchart LR"));
    assert!(mermaid.contains("subgraph floor_1[\"Floor 1\"]"));
    assert!(mermaid.contains("subgraph floor_2[\"Floor 2\"]"));
    assert!(mermaid.contains("|floor_change|"));
    assert!(mermaid.contains("==="), "floor change uses thick link");
    assert!(mermaid.contains("-->"), "one-way edge uses arrow");
    assert!(!mermaid.contains("room:R1"), "ids must be mermaid-safe");
}
