//! Input checks run before any node or edge is created.

use wayfind_core::{NavError, NavResult, Primitive, PrimitiveSet};

/// Maximum number of rooms/hallways a single door may name.
pub const MAX_DOOR_CONNECTIONS: usize = 2;

/// Reject the first malformed primitive, in id order.
pub fn validate_primitives(set: &PrimitiveSet) -> NavResult<()> {
    match check_primitives(set).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every problem found in `set`, in id order. Empty when the set is buildable.
pub fn check_primitives(set: &PrimitiveSet) -> Vec<NavError> {
    let mut issues = Vec::new();
    for primitive in set.iter() {
        check_one(set, primitive, &mut issues);
    }
    issues
}

fn check_one(set: &PrimitiveSet, primitive: &Primitive, issues: &mut Vec<NavError>) {
    let id = primitive.id();
    if id.trim().is_empty() {
        issues.push(NavError::malformed(id, "empty primitive id"));
        return;
    }

    match primitive {
        Primitive::Room(room) => {
            if !room.bounds.min.is_finite() || !room.bounds.max.is_finite() {
                issues.push(NavError::malformed(id, "non-finite coordinate"));
            } else if room.bounds.is_degenerate() {
                issues.push(NavError::malformed(id, "degenerate bounding box"));
            }
        }
        Primitive::Door(door) => {
            if !door.hinge.is_finite() {
                issues.push(NavError::malformed(id, "non-finite coordinate"));
            }
            if !door.width.is_finite() || door.width <= 0.0 {
                issues.push(NavError::malformed(
                    id,
                    format!("door width must be positive, got {}", door.width),
                ));
            }
            if door.connects.len() > MAX_DOOR_CONNECTIONS {
                issues.push(NavError::malformed(
                    id,
                    format!(
                        "door connects {} primitives (at most {})",
                        door.connects.len(),
                        MAX_DOOR_CONNECTIONS
                    ),
                ));
            }
            for target in &door.connects {
                match set.get(target) {
                    None => issues.push(NavError::malformed(
                        id,
                        format!("connects unknown primitive '{}'", target),
                    )),
                    Some(Primitive::Door(_)) => issues.push(NavError::malformed(
                        id,
                        format!("connects another door '{}'", target),
                    )),
                    Some(_) => {}
                }
            }
        }
        Primitive::Hallway(hallway) => {
            if hallway.waypoints.len() < 2 {
                issues.push(NavError::malformed(
                    id,
                    format!(
                        "hallway needs at least 2 waypoints, got {}",
                        hallway.waypoints.len()
                    ),
                ));
            }
            if hallway.waypoints.iter().any(|p| !p.is_finite()) {
                issues.push(NavError::malformed(id, "non-finite coordinate"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::{Door, ErrorKind, Hallway, Point, Room};

    fn room(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Room {
        Room::new(id, id, Point::new(x0, y0), Point::new(x1, y1))
    }

    #[test]
    fn test_valid_set_passes() {
        let mut set = PrimitiveSet::new("p");
        set.insert(room("R1", 0.0, 0.0, 10.0, 10.0));
        set.insert(Door::new("D1", Point::new(10.0, 5.0), 1.0).connecting(&["R1", "H1"]));
        set.insert(Hallway::new(
            "H1",
            vec![Point::new(15.0, 5.0), Point::new(20.0, 5.0)],
        ));
        assert!(validate_primitives(&set).is_ok());
    }

    #[test]
    fn test_zero_area_room_rejected() {
        let mut set = PrimitiveSet::new("p");
        set.insert(room("R1", 0.0, 0.0, 0.0, 10.0));
        let err = validate_primitives(&set).unwrap_err();
        assert_eq!(err, NavError::malformed("R1", "degenerate bounding box"));
    }

    #[test]
    fn test_single_waypoint_hallway_rejected() {
        let mut set = PrimitiveSet::new("p");
        set.insert(Hallway::new("H1", vec![Point::new(0.0, 0.0)]));
        let err = validate_primitives(&set).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedPrimitive);
    }

    #[test]
    fn test_non_finite_and_bad_door_collected() {
        let mut set = PrimitiveSet::new("p");
        set.insert(room("R1", 0.0, 0.0, f64::NAN, 10.0));
        set.insert(Door::new("D1", Point::new(1.0, 1.0), 0.0).connecting(&["R1", "R2", "R3"]));
        let issues = check_primitives(&set);
        // D1: width, too many connects, two unknown targets; R1: non-finite.
        assert_eq!(issues.len(), 5);
        assert_eq!(issues[4], NavError::malformed("R1", "non-finite coordinate"));
    }

    #[test]
    fn test_door_to_door_rejected() {
        let mut set = PrimitiveSet::new("p");
        set.insert(Door::new("D1", Point::new(1.0, 1.0), 1.0).connecting(&["D2"]));
        set.insert(Door::new("D2", Point::new(2.0, 1.0), 1.0));
        let err = validate_primitives(&set).unwrap_err();
        assert_eq!(
            err,
            NavError::malformed("D1", "connects another door 'D2'")
        );
    }
}
