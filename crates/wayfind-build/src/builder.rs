//! Primitive set to navigation graph.
//!
//! Nodes are created first (rooms, doors, hallway waypoints), then edges in a fixed
//! rule order:
//!
//! 1. door to room, and door to hallway
//! 2. consecutive waypoints of one hallway
//! 3. doorless room to its nearest waypoint (approximation, may cross walls)
//! 4. stair/lift hallways sharing a shaft, between consecutive floors
//!
//! The first edge created for an unordered endpoint pair wins; self-loops are
//! dropped. Every collection is walked in primitive-id order, so the output is a
//! pure function of the input.

use crate::validate::validate_primitives;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};
use wayfind_core::config::BuildConfig;
use wayfind_core::fingerprint::{fingerprint, settings_digest};
use wayfind_core::geometry::distance;
use wayfind_core::graph::GraphSource;
use wayfind_core::{
    Door, Edge, EdgeKind, Hallway, HallwayKind, NavGraph, NavResult, Node, NodeId, NodeKind,
    Point, Primitive, PrimitiveSet, Room,
};

/// Build the navigation graph for `primitives`.
///
/// Fails with `MalformedPrimitive` on invalid input. An `Invariant` error means the
/// builder produced an inconsistent graph and is always a bug.
pub fn build(primitives: &PrimitiveSet, config: &BuildConfig) -> NavResult<NavGraph> {
    validate_primitives(primitives)?;

    let mut builder = GraphBuilder::new(config);
    for room in primitives.rooms() {
        builder.add_room(room);
    }
    for door in primitives.doors() {
        builder.add_door(door);
    }
    for hallway in primitives.hallways() {
        builder.add_hallway(hallway);
    }

    for door in primitives.doors() {
        builder.connect_door(door, primitives);
    }
    for hallway in primitives.hallways() {
        builder.connect_hallway(hallway);
    }
    for room in primitives.rooms() {
        builder.connect_doorless_room(room);
    }
    builder.connect_shafts(primitives);

    let source = GraphSource {
        plan_id: primitives.plan_id.clone(),
        fingerprint: fingerprint(primitives),
        settings: settings_digest(config),
    };
    let node_count = builder.nodes.len();
    let edge_count = builder.edges.len();
    let graph = NavGraph::from_parts(source, builder.nodes.into_values(), builder.edges)?;

    info!(
        plan = %primitives.plan_id,
        primitives = primitives.len(),
        nodes = node_count,
        edges = edge_count,
        "built navigation graph"
    );
    Ok(graph)
}

/// Grid key: floor plus cell coordinates.
type Cell = (Option<i32>, i64, i64);

struct GraphBuilder<'a> {
    config: &'a BuildConfig,
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    /// Unordered endpoint pairs already joined by an edge.
    linked: HashSet<(NodeId, NodeId)>,
    rooms: HashMap<&'a str, NodeId>,
    doors: HashMap<&'a str, NodeId>,
    /// Per hallway, the node of each waypoint (after dedup).
    hallways: HashMap<&'a str, Vec<NodeId>>,
    /// Every waypoint node in creation order.
    waypoints: Vec<NodeId>,
    grid: HashMap<Cell, Vec<NodeId>>,
    /// Rooms that received at least one door edge.
    doored_rooms: HashSet<NodeId>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            linked: HashSet::new(),
            rooms: HashMap::new(),
            doors: HashMap::new(),
            hallways: HashMap::new(),
            waypoints: Vec::new(),
            grid: HashMap::new(),
            doored_rooms: HashSet::new(),
        }
    }

    fn insert_node(
        &mut self,
        kind: NodeKind,
        source_id: &str,
        position: Point,
        floor: Option<i32>,
        label: Option<String>,
    ) -> NodeId {
        let id = NodeId::derive(
            kind.as_str(),
            source_id,
            position,
            floor,
            self.config.quantum,
        );
        self.nodes.entry(id.clone()).or_insert_with(|| Node {
            id: id.clone(),
            kind,
            position,
            floor,
            source_id: Some(source_id.to_string()),
            label,
        });
        id
    }

    fn add_room(&mut self, room: &'a Room) {
        let label = (!room.label.trim().is_empty()).then(|| room.label.clone());
        let id = self.insert_node(NodeKind::Room, &room.id, room.centroid(), room.floor, label);
        self.rooms.insert(&room.id, id);
    }

    fn add_door(&mut self, door: &'a Door) {
        let kind = if door.exterior {
            NodeKind::Exit
        } else {
            NodeKind::Door
        };
        let id = self.insert_node(kind, &door.id, door.hinge, door.floor, door.label.clone());
        self.doors.insert(&door.id, id);
    }

    fn add_hallway(&mut self, hallway: &'a Hallway) {
        let kind = match hallway.hallway_type {
            HallwayKind::Corridor => NodeKind::Waypoint,
            HallwayKind::Stair => NodeKind::Stair,
            HallwayKind::Lift => NodeKind::Lift,
        };
        let mut ids = Vec::with_capacity(hallway.waypoints.len());
        for &point in &hallway.waypoints {
            let id = match self.find_waypoint(point, hallway.floor) {
                Some(existing) => existing,
                None => {
                    let id = self.insert_node(
                        kind,
                        &hallway.id,
                        point,
                        hallway.floor,
                        hallway.label.clone(),
                    );
                    if !self.waypoints.contains(&id) {
                        let cell = self.cell(point, hallway.floor);
                        self.waypoints.push(id.clone());
                        self.grid.entry(cell).or_default().push(id.clone());
                    }
                    id
                }
            };
            ids.push(id);
        }
        self.hallways.insert(&hallway.id, ids);
    }

    fn cell(&self, p: Point, floor: Option<i32>) -> Cell {
        let size = self.config.dedup_tolerance;
        (
            floor,
            (p.x / size).floor() as i64,
            (p.y / size).floor() as i64,
        )
    }

    /// An existing waypoint on `floor` within the dedup tolerance of `p`.
    fn find_waypoint(&self, p: Point, floor: Option<i32>) -> Option<NodeId> {
        let (f, cx, cy) = self.cell(p, floor);
        let mut best: Option<(f64, &NodeId)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = self.grid.get(&(f, cx + dx, cy + dy)) else {
                    continue;
                };
                for id in bucket {
                    let d = distance(self.nodes[id].position, p);
                    if d <= self.config.dedup_tolerance && best.is_none_or(|(bd, _)| d < bd) {
                        best = Some((d, id));
                    }
                }
            }
        }
        best.map(|(_, id)| id.clone())
    }

    /// Closest waypoint on `floor`, optionally within `radius`. Earlier waypoints
    /// win ties.
    fn nearest_waypoint<'n>(
        &self,
        candidates: impl IntoIterator<Item = &'n NodeId>,
        p: Point,
        floor: Option<i32>,
        radius: Option<f64>,
    ) -> Option<(NodeId, f64)> {
        let mut best: Option<(&NodeId, f64)> = None;
        for id in candidates {
            let node = &self.nodes[id];
            if node.floor != floor {
                continue;
            }
            let d = distance(node.position, p);
            if radius.is_some_and(|r| d > r) {
                continue;
            }
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best.map(|(id, d)| (id.clone(), d))
    }

    fn link(&mut self, from: &NodeId, to: &NodeId, kind: EdgeKind, bidirectional: bool) -> bool {
        if from == to {
            return false;
        }
        let key = if from <= to {
            (from.clone(), to.clone())
        } else {
            (to.clone(), from.clone())
        };
        if !self.linked.insert(key) {
            return false;
        }
        let weight = distance(self.nodes[from].position, self.nodes[to].position);
        self.push_edge(from, to, weight, kind, bidirectional);
        true
    }

    fn push_edge(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        weight: f64,
        kind: EdgeKind,
        bidirectional: bool,
    ) {
        self.edges.push(Edge::new(
            from.clone(),
            to.clone(),
            weight,
            kind,
            bidirectional,
        ));
    }

    fn connect_door(&mut self, door: &Door, primitives: &PrimitiveSet) {
        let door_node = self.doors[door.id.as_str()].clone();

        let mut rooms: Vec<&Room> = primitives
            .rooms()
            .filter(|r| {
                r.floor == door.floor && r.bounds.contains(door.hinge, self.config.door_tolerance)
            })
            .collect();
        for target in &door.connects {
            if let Some(Primitive::Room(r)) = primitives.get(target)
                && !rooms.iter().any(|known| known.id == r.id)
            {
                rooms.push(r);
            }
        }
        rooms.sort_by(|a, b| a.id.cmp(&b.id));

        // One-way doors lead from the corridor side into the room. Between two rooms the
        // first room named in `connects` is the entry side, else the lower id.
        let entry = if door.one_way && rooms.len() >= 2 {
            let named = door
                .connects
                .iter()
                .find(|c| rooms.iter().any(|r| &r.id == *c))
                .map(String::as_str);
            if named.is_none() {
                warn!(
                    door = %door.id,
                    entry = %rooms[0].id,
                    "one-way door between rooms names no entry side, using lowest id"
                );
            }
            Some(named.unwrap_or(rooms[0].id.as_str()))
        } else {
            None
        };
        for room in &rooms {
            let room_node = self.rooms[room.id.as_str()].clone();
            let linked = if entry == Some(room.id.as_str()) {
                self.link(&room_node, &door_node, EdgeKind::DoorRoom, false)
            } else {
                self.link(&door_node, &room_node, EdgeKind::DoorRoom, !door.one_way)
            };
            if linked {
                self.doored_rooms.insert(room_node);
            }
        }

        let named_hallways: Vec<&Hallway> = door
            .connects
            .iter()
            .filter_map(|target| match primitives.get(target) {
                Some(Primitive::Hallway(h)) => Some(h),
                _ => None,
            })
            .collect();

        let mut hallway_links = 0;
        for hallway in &named_hallways {
            let Some(candidates) = self.hallways.get(hallway.id.as_str()) else {
                continue;
            };
            // A named hallway is joined even across floors.
            let floor = hallway.floor;
            if let Some((wp, _)) =
                self.nearest_waypoint(candidates.iter(), door.hinge, floor, None)
                && self.link(&door_node, &wp, EdgeKind::DoorHallway, true)
            {
                hallway_links += 1;
            }
        }

        if rooms.len() < 2 && named_hallways.is_empty() {
            let snapped = self.nearest_waypoint(
                self.waypoints.iter(),
                door.hinge,
                door.floor,
                self.config.door_snap_radius,
            );
            match snapped {
                Some((wp, d)) => {
                    debug!(door = %door.id, waypoint = %wp, distance = d, "snapped door to hallway");
                    if self.link(&door_node, &wp, EdgeKind::DoorHallway, true) {
                        hallway_links += 1;
                    }
                }
                None => debug!(door = %door.id, "no hallway waypoint in reach of door"),
            }
        }

        if rooms.is_empty() && hallway_links == 0 {
            warn!(door = %door.id, "door is not connected to anything");
        }
    }

    fn connect_hallway(&mut self, hallway: &Hallway) {
        let ids = self.hallways[hallway.id.as_str()].clone();
        for pair in ids.windows(2) {
            self.link(&pair[0], &pair[1], EdgeKind::Hallway, true);
        }
    }

    fn connect_doorless_room(&mut self, room: &Room) {
        let room_node = self.rooms[room.id.as_str()].clone();
        if self.doored_rooms.contains(&room_node) {
            return;
        }
        let position = self.nodes[&room_node].position;
        match self.nearest_waypoint(self.waypoints.iter(), position, room.floor, None) {
            Some((wp, d)) => {
                debug!(
                    room = %room.id,
                    waypoint = %wp,
                    distance = d,
                    "room has no door, linking centroid to nearest waypoint"
                );
                self.link(&room_node, &wp, EdgeKind::RoomFallback, true);
            }
            None => warn!(room = %room.id, "room is isolated: no door and no hallway on its floor"),
        }
    }

    fn connect_shafts(&mut self, primitives: &PrimitiveSet) {
        let mut shafts: BTreeMap<&str, Vec<&Hallway>> = BTreeMap::new();
        for hallway in primitives.hallways() {
            if hallway.hallway_type == HallwayKind::Corridor {
                continue;
            }
            let Some(shaft) = hallway.shaft.as_deref() else {
                continue;
            };
            if hallway.floor.is_none() {
                warn!(hallway = %hallway.id, shaft, "shaft hallway has no floor, skipping");
                continue;
            }
            shafts.entry(shaft).or_default().push(hallway);
        }

        for (shaft, mut members) in shafts {
            members.sort_by(|a, b| a.floor.cmp(&b.floor).then_with(|| a.id.cmp(&b.id)));
            members.dedup_by_key(|h| h.floor);
            for pair in members.windows(2) {
                let lower = self.hallways[pair[0].id.as_str()][0].clone();
                let upper = self.hallways[pair[1].id.as_str()][0].clone();
                let planar = distance(self.nodes[&lower].position, self.nodes[&upper].position);
                let weight = self.config.floor_change_cost.max(planar);

                let key = if lower <= upper {
                    (lower.clone(), upper.clone())
                } else {
                    (upper.clone(), lower.clone())
                };
                if lower == upper || !self.linked.insert(key) {
                    continue;
                }
                debug!(shaft, from = %lower, to = %upper, weight, "linked floors");
                self.push_edge(&lower, &upper, weight, EdgeKind::FloorChange, true);
            }
        }
    }
}
