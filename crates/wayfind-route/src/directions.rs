//! Turn-by-turn instructions for a route.

use serde::Serialize;
use wayfind_core::config::DirectionConfig;
use wayfind_core::geometry::{bearing, turn_angle};
use wayfind_core::{EdgeKind, NavError, NavGraph, NavResult, Node, NodeId, NodeKind};

/// What the walker does at an instruction's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Straight,
    TurnLeft,
    TurnRight,
    TurnAround,
    ThroughDoor,
    ChangeFloor,
    Arrive,
    AlreadyThere,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// 1-based position in the list.
    pub step: usize,
    pub action: Action,
    pub node: NodeId,
    pub text: String,
    /// Distance walked from the previous instruction's node.
    pub distance: f64,
}

/// Describe `path` with the default thresholds.
pub fn describe(graph: &NavGraph, path: &[NodeId]) -> NavResult<Vec<Instruction>> {
    describe_with(graph, path, &DirectionConfig::default())
}

/// Describe `path`, one instruction per node.
///
/// The angle at each intermediate node is measured between the incoming and
/// outgoing legs. Doors and exits are always passed through, and a floor-change
/// edge leaving a node is always announced, whatever the angle.
pub fn describe_with(
    graph: &NavGraph,
    path: &[NodeId],
    cfg: &DirectionConfig,
) -> NavResult<Vec<Instruction>> {
    let nodes = path
        .iter()
        .map(|id| {
            graph
                .node(id.as_str())
                .ok_or_else(|| NavError::NodeNotFound(id.clone()))
        })
        .collect::<NavResult<Vec<&Node>>>()?;

    let Some((&first, rest)) = nodes.split_first() else {
        return Ok(Vec::new());
    };
    let Some(&last) = rest.last() else {
        return Ok(vec![Instruction {
            step: 1,
            action: Action::AlreadyThere,
            node: first.id.clone(),
            text: format!("You are already at {}", first.display_name()),
            distance: 0.0,
        }]);
    };

    let mut out = vec![instruction(
        Action::Start,
        first,
        format!("Start at {}", first.display_name()),
        0.0,
    )];
    if is_floor_change(graph, first, nodes[1]) {
        out.push(instruction(
            Action::ChangeFloor,
            first,
            floor_change_text(first, nodes[1]),
            0.0,
        ));
    }

    for window in nodes.windows(3) {
        let [prev, cur, next] = [window[0], window[1], window[2]];
        let leg = leg_length(graph, prev, cur);

        let (action, text) = if is_floor_change(graph, cur, next) {
            (Action::ChangeFloor, floor_change_text(cur, next))
        } else if cur.kind.is_doorway() {
            let text = if cur.kind == NodeKind::Exit {
                format!("Exit the building through {}", cur.display_name())
            } else {
                format!("Go through door {}", cur.display_name())
            };
            (Action::ThroughDoor, text)
        } else {
            let action = classify_turn(prev, cur, next, cfg);
            let text = match action {
                Action::TurnLeft => format!("Turn left at {}", cur.display_name()),
                Action::TurnRight => format!("Turn right at {}", cur.display_name()),
                Action::TurnAround => format!("Turn around at {}", cur.display_name()),
                _ => format!("Continue straight past {}", cur.display_name()),
            };
            (action, text)
        };
        out.push(instruction(action, cur, text, leg));
    }

    let prev = nodes[nodes.len() - 2];
    out.push(instruction(
        Action::Arrive,
        last,
        format!("Arrive at {}", last.display_name()),
        leg_length(graph, prev, last),
    ));

    if cfg.merge_straight {
        out = merge_straight_runs(out);
    }
    for (i, ins) in out.iter_mut().enumerate() {
        ins.step = i + 1;
    }
    Ok(out)
}

fn instruction(action: Action, node: &Node, text: String, distance: f64) -> Instruction {
    Instruction {
        step: 0,
        action,
        node: node.id.clone(),
        text,
        distance,
    }
}

fn is_floor_change(graph: &NavGraph, from: &Node, to: &Node) -> bool {
    let edge_says = graph
        .edge_between(from.id.as_str(), to.id.as_str())
        .is_some_and(|e| e.kind == EdgeKind::FloorChange);
    edge_says || (from.floor.is_some() && to.floor.is_some() && from.floor != to.floor)
}

fn floor_change_text(from: &Node, to: &Node) -> String {
    let means = if from.kind == NodeKind::Lift {
        "lift"
    } else {
        "stairs"
    };
    match to.floor {
        Some(f) => format!("Take the {} to floor {}", means, f),
        None => format!("Take the {} to the next floor", means),
    }
}

/// Edge weight when the two nodes are joined, straight-line distance otherwise.
fn leg_length(graph: &NavGraph, from: &Node, to: &Node) -> f64 {
    graph
        .edge_between(from.id.as_str(), to.id.as_str())
        .map_or_else(|| from.position.distance(to.position), |e| e.weight)
}

fn classify_turn(prev: &Node, cur: &Node, next: &Node, cfg: &DirectionConfig) -> Action {
    // Headings are meaningless across floors.
    let incoming = if prev.floor == cur.floor {
        bearing(prev.position, cur.position)
    } else {
        None
    };
    let (Some(incoming), Some(outgoing)) = (incoming, bearing(cur.position, next.position)) else {
        return Action::Straight;
    };

    let angle = turn_angle(incoming, outgoing);
    if angle.abs() < cfg.straight_threshold {
        Action::Straight
    } else if angle.abs() > cfg.turn_around_threshold {
        Action::TurnAround
    } else if (angle > 0.0) == cfg.y_axis_down {
        // Positive angles rotate +x toward +y: clockwise when y points down.
        Action::TurnRight
    } else {
        Action::TurnLeft
    }
}

/// Fold each "continue straight" into the instruction after it.
fn merge_straight_runs(instructions: Vec<Instruction>) -> Vec<Instruction> {
    let mut out: Vec<Instruction> = Vec::with_capacity(instructions.len());
    let mut carried = 0.0;
    for mut ins in instructions {
        if ins.action == Action::Straight {
            carried += ins.distance;
            continue;
        }
        ins.distance += carried;
        carried = 0.0;
        out.push(ins);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::graph::GraphSource;
    use wayfind_core::{Edge, Point};

    fn node(id: &str, kind: NodeKind, x: f64, y: f64) -> Node {
        Node {
            id: NodeId::from(id),
            kind,
            position: Point::new(x, y),
            floor: None,
            source_id: None,
            label: Some(id.to_uppercase()),
        }
    }

    /// a(0,0) -> b(10,0) -> c(10,10) -> d(0,10), plus a spur back from d.
    fn corner_graph() -> NavGraph {
        let nodes = vec![
            node("a", NodeKind::Room, 0.0, 0.0),
            node("b", NodeKind::Waypoint, 10.0, 0.0),
            node("c", NodeKind::Waypoint, 10.0, 10.0),
            node("d", NodeKind::Room, 0.0, 10.0),
            node("e", NodeKind::Waypoint, 20.0, 0.0),
        ];
        let edges = [("a", "b"), ("b", "c"), ("c", "d"), ("b", "e")]
            .into_iter()
            .map(|(x, y)| Edge::new(x.into(), y.into(), 10.0, EdgeKind::Hallway, true))
            .collect();
        NavGraph::from_parts(GraphSource::default(), nodes, edges).unwrap()
    }

    fn ids(list: &[&str]) -> Vec<NodeId> {
        list.iter().map(|s| NodeId::from(*s)).collect()
    }

    fn actions(out: &[Instruction]) -> Vec<Action> {
        out.iter().map(|i| i.action).collect()
    }

    #[test]
    fn test_turns_with_y_axis_down() {
        let out = describe(&corner_graph(), &ids(&["a", "b", "c", "d"])).unwrap();
        // East then south (y down): clockwise, a right turn. South then west: right again.
        assert_eq!(
            actions(&out),
            vec![
                Action::Start,
                Action::TurnRight,
                Action::TurnRight,
                Action::Arrive
            ]
        );
        assert_eq!(out[1].text, "Turn right at B");
        assert_eq!(out[3].text, "Arrive at D");
        assert_eq!(out.iter().map(|i| i.step).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(out.iter().map(|i| i.distance).sum::<f64>(), 30.0);
    }

    #[test]
    fn test_turns_with_y_axis_up() {
        let cfg = DirectionConfig {
            y_axis_down: false,
            ..DirectionConfig::default()
        };
        let out = describe_with(&corner_graph(), &ids(&["a", "b", "c"]), &cfg).unwrap();
        assert_eq!(out[1].action, Action::TurnLeft);
    }

    #[test]
    fn test_straight_and_turn_around() {
        let g = corner_graph();
        let out = describe(&g, &ids(&["a", "b", "e"])).unwrap();
        assert_eq!(out[1].action, Action::Straight);
        assert_eq!(out[1].text, "Continue straight past B");

        let out = describe(&g, &ids(&["e", "b", "e"])).unwrap();
        assert_eq!(out[1].action, Action::TurnAround);
    }

    #[test]
    fn test_merge_straight_carries_distance() {
        let cfg = DirectionConfig {
            merge_straight: true,
            ..DirectionConfig::default()
        };
        let out = describe_with(&corner_graph(), &ids(&["a", "b", "e"]), &cfg).unwrap();
        assert_eq!(actions(&out), vec![Action::Start, Action::Arrive]);
        assert_eq!(out[1].distance, 20.0);
        assert_eq!(out[1].step, 2);
    }

    #[test]
    fn test_single_node_and_empty_path() {
        let g = corner_graph();
        let out = describe(&g, &ids(&["a"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].action, Action::AlreadyThere);
        assert_eq!(out[0].text, "You are already at A");
        assert!(describe(&g, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_node_is_error() {
        let err = describe(&corner_graph(), &ids(&["a", "ghost"])).unwrap_err();
        assert_eq!(err, NavError::NodeNotFound(NodeId::from("ghost")));
    }

    #[test]
    fn test_floor_change_and_door() {
        let mut s1 = node("s1", NodeKind::Stair, 0.0, 0.0);
        s1.floor = Some(1);
        let mut s2 = node("s2", NodeKind::Stair, 0.0, 0.0);
        s2.floor = Some(2);
        let mut door = node("door", NodeKind::Door, 5.0, 0.0);
        door.floor = Some(2);
        let mut room = node("room", NodeKind::Room, 5.0, 5.0);
        room.floor = Some(2);
        let g = NavGraph::from_parts(
            GraphSource::default(),
            vec![s1, s2, door, room],
            vec![
                Edge::new("s1".into(), "s2".into(), 100.0, EdgeKind::FloorChange, true),
                Edge::new("s2".into(), "door".into(), 5.0, EdgeKind::DoorHallway, true),
                Edge::new("door".into(), "room".into(), 5.0, EdgeKind::DoorRoom, true),
            ],
        )
        .unwrap();

        let out = describe(&g, &ids(&["s1", "s2", "door", "room"])).unwrap();
        assert_eq!(
            actions(&out),
            vec![
                Action::Start,
                Action::ChangeFloor,
                Action::Straight,
                Action::ThroughDoor,
                Action::Arrive
            ]
        );
        assert_eq!(out[1].text, "Take the stairs to floor 2");
        assert_eq!(out[2].distance, 100.0);
        assert_eq!(out[3].text, "Go through door DOOR");
    }
}
