//! Graph construction for wayfind.
//!
//! Turns a validated [`wayfind_core::PrimitiveSet`] into a routable
//! [`wayfind_core::NavGraph`], and rebuilds it after manual edits while reporting
//! what changed.

pub mod builder;
pub mod diff;
pub mod update;
pub mod validate;

pub use builder::build;
pub use diff::{GraphDiff, diff_graphs};
pub use update::{Edit, Rebuild, apply_edits, rebuild};
pub use validate::validate_primitives;
