//! Queries over a built navigation graph.
//!
//! Resolves free-text place names to nodes ([`resolve`]), finds optimal routes
//! with A* ([`pathfind`]), turns them into turn-by-turn instructions
//! ([`directions`]), and ties the three together for callers ([`query`]).

pub mod directions;
pub mod export;
pub mod pathfind;
pub mod query;
pub mod resolve;

pub use directions::{Action, Instruction, describe, describe_with};
pub use pathfind::{
    AStar, FailureReason, PathResult, SearchOptions, SearchState, SubReason, find_path,
    find_path_with,
};
pub use query::{RouteOptions, RouteResponse, route, route_many};
pub use resolve::{Candidate, MatchTier, ResolveOptions, resolve};
