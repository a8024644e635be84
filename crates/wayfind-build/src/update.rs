//! Manual edits and rebuilds.
//!
//! The graph is never patched in place: edits are applied to the primitive set and
//! the graph is rebuilt from scratch. Node ids are derived from primitive ids and
//! quantized positions, so everything an edit did not touch keeps its id, and the
//! diff between the two graphs names exactly the affected nodes and edges.

use crate::builder::build;
use crate::diff::{GraphDiff, diff_graphs};
use tracing::info;
use wayfind_core::config::BuildConfig;
use wayfind_core::fingerprint::{fingerprint, settings_digest};
use wayfind_core::{NavError, NavGraph, NavResult, Primitive, PrimitiveSet};

/// One manual correction to a detection run.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Add a primitive, or replace the one with the same id.
    Upsert(Primitive),
    /// Delete the primitive with this id.
    Remove(String),
}

/// Summary of applying a batch of edits.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EditSummary {
    pub added: usize,
    pub replaced: usize,
    pub removed: usize,
}

/// Apply `edits` in order to a copy of `primitives`.
///
/// Removing an unknown id is rejected so typos do not silently no-op.
pub fn apply_edits(
    primitives: &PrimitiveSet,
    edits: impl IntoIterator<Item = Edit>,
) -> NavResult<(PrimitiveSet, EditSummary)> {
    let mut set = primitives.clone();
    let mut summary = EditSummary::default();
    for edit in edits {
        match edit {
            Edit::Upsert(p) => {
                if set.insert(p).is_some() {
                    summary.replaced += 1;
                } else {
                    summary.added += 1;
                }
            }
            Edit::Remove(id) => {
                if set.remove(&id).is_none() {
                    return Err(NavError::malformed(id, "no primitive with this id"));
                }
                summary.removed += 1;
            }
        }
    }
    Ok((set, summary))
}

/// Result of [`rebuild`].
#[derive(Debug, Clone)]
pub struct Rebuild {
    pub graph: NavGraph,
    pub diff: GraphDiff,
    /// Primitives and build settings both matched `old`, so `old` was reused as is.
    pub cached: bool,
}

/// Build a new graph for `primitives` and compare it against `old`.
///
/// `old` is left untouched; queries holding it keep seeing the previous snapshot.
pub fn rebuild(
    old: &NavGraph,
    primitives: &PrimitiveSet,
    config: &BuildConfig,
) -> NavResult<Rebuild> {
    let source = old.source();
    if !source.fingerprint.is_empty()
        && source.fingerprint == fingerprint(primitives)
        && source.settings == settings_digest(config)
    {
        info!(plan = %primitives.plan_id, "primitives and settings unchanged, reusing graph");
        return Ok(Rebuild {
            graph: old.clone(),
            diff: GraphDiff::default(),
            cached: true,
        });
    }

    let graph = build(primitives, config)?;
    let diff = diff_graphs(old, &graph);
    info!(plan = %primitives.plan_id, changes = %diff.summary(), "rebuilt navigation graph");
    Ok(Rebuild {
        graph,
        diff,
        cached: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfind_core::{Door, Point, Room};

    fn base() -> PrimitiveSet {
        let mut set = PrimitiveSet::new("p");
        set.insert(Room::new("R1", "Lab", Point::new(0.0, 0.0), Point::new(4.0, 4.0)));
        set
    }

    #[test]
    fn test_apply_edits_counts() {
        let edits = vec![
            Edit::Upsert(Room::new("R1", "Lab 2", Point::new(0.0, 0.0), Point::new(4.0, 4.0)).into()),
            Edit::Upsert(Door::new("D1", Point::new(4.0, 2.0), 1.0).into()),
            Edit::Remove("D1".into()),
        ];
        let (set, summary) = apply_edits(&base(), edits).unwrap();
        assert_eq!(
            summary,
            EditSummary {
                added: 1,
                replaced: 1,
                removed: 1
            }
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_unknown_rejected() {
        let err = apply_edits(&base(), [Edit::Remove("nope".into())]).unwrap_err();
        assert_eq!(err, NavError::malformed("nope", "no primitive with this id"));
    }

    #[test]
    fn test_unchanged_primitives_reuse_graph() {
        let set = base();
        let cfg = BuildConfig::default();
        let old = build(&set, &cfg).unwrap();
        let rebuilt = rebuild(&old, &set, &cfg).unwrap();
        assert!(rebuilt.cached);
        assert!(rebuilt.diff.is_empty());
        assert_eq!(rebuilt.graph, old);
    }
}
