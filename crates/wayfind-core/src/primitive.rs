//! Detected architectural primitives: the sole input of the graph builder.

use crate::error::{NavError, NavResult};
use crate::geometry::{BoundingBox, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A room detected on the plan, as an axis-aligned box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub label: String,
    pub bounds: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
}

impl Room {
    pub fn new(id: impl Into<String>, label: impl Into<String>, min: Point, max: Point) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            bounds: BoundingBox::new(min, max),
            floor: None,
        }
    }

    pub fn centroid(&self) -> Point {
        self.bounds.centroid()
    }
}

fn default_swing() -> f64 {
    90.0
}

/// A door, located by its hinge point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Door {
    pub id: String,
    pub hinge: Point,
    pub width: f64,
    /// Swing angle in degrees.
    #[serde(default = "default_swing")]
    pub swing: f64,
    /// Up to two room or hallway ids this door explicitly joins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connects: Vec<String>,
    /// Entry only: traversable from the corridor side into the room.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub one_way: bool,
    /// Door leads out of the building.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exterior: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Door {
    pub fn new(id: impl Into<String>, hinge: Point, width: f64) -> Self {
        Self {
            id: id.into(),
            hinge,
            width,
            swing: default_swing(),
            connects: Vec::new(),
            one_way: false,
            exterior: false,
            floor: None,
            label: None,
        }
    }

    pub fn connecting(mut self, ids: &[&str]) -> Self {
        self.connects = ids.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// What a hallway polyline represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallwayKind {
    #[default]
    Corridor,
    Stair,
    Lift,
}

/// A walkable polyline (corridor, stairwell landing or lift lobby).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hallway {
    pub id: String,
    pub waypoints: Vec<Point>,
    #[serde(rename = "type", default)]
    pub hallway_type: HallwayKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Stair/lift hallways on different floors sharing a shaft are linked by
    /// floor-change edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaft: Option<String>,
}

impl Hallway {
    pub fn new(id: impl Into<String>, waypoints: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            waypoints,
            hallway_type: HallwayKind::Corridor,
            floor: None,
            label: None,
            shaft: None,
        }
    }
}

/// One detected element, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Room(Room),
    Door(Door),
    Hallway(Hallway),
}

impl Primitive {
    pub fn id(&self) -> &str {
        match self {
            Primitive::Room(r) => &r.id,
            Primitive::Door(d) => &d.id,
            Primitive::Hallway(h) => &h.id,
        }
    }

    pub fn floor(&self) -> Option<i32> {
        match self {
            Primitive::Room(r) => r.floor,
            Primitive::Door(d) => d.floor,
            Primitive::Hallway(h) => h.floor,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Primitive::Room(_) => "room",
            Primitive::Door(_) => "door",
            Primitive::Hallway(_) => "hallway",
        }
    }
}

impl From<Room> for Primitive {
    fn from(r: Room) -> Self {
        Primitive::Room(r)
    }
}

impl From<Door> for Primitive {
    fn from(d: Door) -> Self {
        Primitive::Door(d)
    }
}

impl From<Hallway> for Primitive {
    fn from(h: Hallway) -> Self {
        Primitive::Hallway(h)
    }
}

/// On-disk shape of a primitive set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrimitiveFile {
    #[serde(default)]
    plan_id: String,
    primitives: Vec<Primitive>,
}

/// The primitives of one floor plan, keyed by primitive id.
///
/// Ids are unique across kinds. `insert` replaces an existing primitive with the
/// same id, which is how manual edits are applied before a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "PrimitiveFile", try_from = "PrimitiveFile")]
pub struct PrimitiveSet {
    pub plan_id: String,
    primitives: BTreeMap<String, Primitive>,
}

impl PrimitiveSet {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            primitives: BTreeMap::new(),
        }
    }

    /// Collect primitives, rejecting duplicate ids.
    pub fn from_primitives(
        plan_id: impl Into<String>,
        primitives: impl IntoIterator<Item = Primitive>,
    ) -> NavResult<Self> {
        let mut set = Self::new(plan_id);
        for p in primitives {
            if set.primitives.contains_key(p.id()) {
                return Err(NavError::malformed(p.id(), "duplicate primitive id"));
            }
            set.primitives.insert(p.id().to_string(), p);
        }
        Ok(set)
    }

    /// Parse a primitive document. Unknown kinds, missing fields and duplicate ids
    /// are all reported as `MalformedPrimitive`.
    pub fn from_json(json: &str) -> NavResult<Self> {
        let file: PrimitiveFile = serde_json::from_str(json)
            .map_err(|e| NavError::malformed("<document>", e.to_string()))?;
        Self::try_from(file)
    }

    pub fn to_json(&self) -> NavResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NavError::malformed("<document>", e.to_string()))
    }

    /// Insert or replace a primitive. Returns the previous primitive with that id.
    pub fn insert(&mut self, primitive: impl Into<Primitive>) -> Option<Primitive> {
        let primitive = primitive.into();
        self.primitives.insert(primitive.id().to_string(), primitive)
    }

    pub fn remove(&mut self, id: &str) -> Option<Primitive> {
        self.primitives.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.primitives.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// All primitives in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.primitives.values().filter_map(|p| match p {
            Primitive::Room(r) => Some(r),
            _ => None,
        })
    }

    pub fn doors(&self) -> impl Iterator<Item = &Door> {
        self.primitives.values().filter_map(|p| match p {
            Primitive::Door(d) => Some(d),
            _ => None,
        })
    }

    pub fn hallways(&self) -> impl Iterator<Item = &Hallway> {
        self.primitives.values().filter_map(|p| match p {
            Primitive::Hallway(h) => Some(h),
            _ => None,
        })
    }
}

impl From<PrimitiveSet> for PrimitiveFile {
    fn from(set: PrimitiveSet) -> Self {
        PrimitiveFile {
            plan_id: set.plan_id,
            primitives: set.primitives.into_values().collect(),
        }
    }
}

impl TryFrom<PrimitiveFile> for PrimitiveSet {
    type Error = NavError;

    fn try_from(file: PrimitiveFile) -> NavResult<Self> {
        PrimitiveSet::from_primitives(file.plan_id, file.primitives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_tagged_primitives() {
        let json = r#"{
            "plan_id": "eng-2",
            "primitives": [
                {"kind": "room", "id": "R1", "label": "CSE Library",
                 "bounds": {"min": {"x": 0, "y": 0}, "max": {"x": 10, "y": 10}}},
                {"kind": "door", "id": "D1", "hinge": {"x": 10, "y": 5}, "width": 1.0,
                 "connects": ["R1"]},
                {"kind": "hallway", "id": "H1", "type": "stair", "shaft": "S",
                 "waypoints": [{"x": 15, "y": 5}, {"x": 20, "y": 5}]}
            ]
        }"#;
        let set = PrimitiveSet::from_json(json).unwrap();
        assert_eq!(set.plan_id, "eng-2");
        assert_eq!(set.len(), 3);
        assert_eq!(set.rooms().next().unwrap().centroid(), Point::new(5.0, 5.0));
        let door = set.doors().next().unwrap();
        assert_eq!(door.swing, 90.0);
        assert!(!door.one_way);
        let hall = set.hallways().next().unwrap();
        assert_eq!(hall.hallway_type, HallwayKind::Stair);
        assert_eq!(hall.shaft.as_deref(), Some("S"));
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let json = r#"{"primitives": [{"kind": "window", "id": "W1"}]}"#;
        let err = PrimitiveSet::from_json(json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPrimitive);
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let room = Room::new("X", "a", Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let door = Door::new("X", Point::new(0.0, 0.0), 1.0);
        let err = PrimitiveSet::from_primitives("p", [room.into(), door.into()]).unwrap_err();
        assert_eq!(err, NavError::malformed("X", "duplicate primitive id"));
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let mut set = PrimitiveSet::new("p");
        set.insert(Room::new("R1", "a", Point::new(0.0, 0.0), Point::new(1.0, 1.0)));
        let prev = set.insert(Room::new("R1", "b", Point::new(0.0, 0.0), Point::new(2.0, 2.0)));
        assert!(prev.is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.rooms().next().unwrap().label, "b");
        assert!(set.remove("R1").is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn test_json_roundtrip_preserves_set() {
        let mut set = PrimitiveSet::new("p");
        set.insert(Door::new("D1", Point::new(1.0, 2.0), 0.9).connecting(&["R1"]));
        set.insert(Hallway::new(
            "H1",
            vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0)],
        ));
        let json = set.to_json().unwrap();
        assert_eq!(PrimitiveSet::from_json(&json).unwrap(), set);
    }
}
