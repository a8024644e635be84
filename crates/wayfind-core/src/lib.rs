//! Core types and storage for the wayfind navigation engine.
//!
//! Provides the plan geometry ([`geometry`]), detected architectural primitives
//! ([`primitive::PrimitiveSet`]), the routable graph model ([`graph::NavGraph`]),
//! deterministic node ids, typed errors, configuration and JSON persistence.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod integrity;
pub mod primitive;
pub mod schema;
pub mod storage;

pub use error::{ErrorKind, NavError, NavResult};
pub use geometry::{BoundingBox, Point};
pub use graph::{Edge, EdgeKind, NavGraph, Node, NodeKind};
pub use ids::NodeId;
pub use primitive::{Door, Hallway, HallwayKind, Primitive, PrimitiveSet, Room};
