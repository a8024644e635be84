//! Free-text place lookup: "CSE library", "Room 302", "R101".
//!
//! Matching runs in tiers (exact, prefix, substring, fuzzy). Each tier owns a
//! disjoint score band, so a better tier always outranks a worse one:
//!
//! | tier      | score          |
//! |-----------|----------------|
//! | exact     | 1.0            |
//! | prefix    | [0.80, 0.95)   |
//! | substring | [0.60, 0.75)   |
//! | fuzzy     | [0.0, 0.55]    |

use serde::Serialize;
use std::collections::HashSet;
use wayfind_core::config::ResolveConfig;
use wayfind_core::{NavGraph, Node, NodeId, NodeKind};

const PREFIX_BASE: f64 = 0.80;
const SUBSTRING_BASE: f64 = 0.60;
/// Width of the prefix and substring bands.
const BAND_SPAN: f64 = 0.15;
const FUZZY_WEIGHT: f64 = 0.55;

/// How a candidate matched the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
    Fuzzy,
}

/// A node that may be what the user meant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub node: NodeId,
    pub label: String,
    pub kind: NodeKind,
    pub score: f64,
    pub tier: MatchTier,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub limit: usize,
    pub min_similarity: f64,
    pub merge_tiers: bool,
    pub include_waypoints: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::from(&ResolveConfig::default())
    }
}

impl From<&ResolveConfig> for ResolveOptions {
    fn from(cfg: &ResolveConfig) -> Self {
        Self {
            limit: cfg.limit,
            min_similarity: cfg.min_similarity,
            merge_tiers: cfg.merge_tiers,
            include_waypoints: cfg.include_waypoints,
        }
    }
}

/// Rank nodes of `graph` against `query`, best first.
///
/// Only the best non-empty tier is returned unless `merge_tiers` is set. Ties
/// are broken by shorter label, then label, then node id.
pub fn resolve(graph: &NavGraph, query: &str, opts: &ResolveOptions) -> Vec<Candidate> {
    let query = query.trim().to_lowercase();
    if query.is_empty() || opts.limit == 0 {
        return Vec::new();
    }
    let query_tokens = tokens(&query);

    let mut candidates: Vec<Candidate> = graph
        .nodes()
        .filter(|n| opts.include_waypoints || n.kind != NodeKind::Waypoint)
        .filter_map(|node| score_node(node, &query, &query_tokens, opts.min_similarity))
        .collect();

    if !opts.merge_tiers
        && let Some(best) = candidates.iter().map(|c| c.tier).min()
    {
        candidates.retain(|c| c.tier == best);
    }

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.label.len().cmp(&b.label.len()))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.node.cmp(&b.node))
    });
    candidates.truncate(opts.limit);
    candidates
}

fn score_node(
    node: &Node,
    query: &str,
    query_tokens: &HashSet<&str>,
    min_similarity: f64,
) -> Option<Candidate> {
    // Node ids embed kind and quantized coordinates, so they only count when typed in full.
    if node.id.as_str().to_lowercase() == query {
        return Some(candidate(node, MatchTier::Exact, 1.0));
    }
    let keys = [node.label.as_deref(), node.source_id.as_deref()];

    let mut best: Option<(MatchTier, f64)> = None;
    for key in keys.into_iter().flatten() {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let Some(m) = match_key(&key, query, query_tokens, min_similarity) else {
            continue;
        };
        if best.is_none_or(|(_, s)| m.1 > s) {
            best = Some(m);
        }
    }

    best.map(|(tier, score)| candidate(node, tier, score))
}

fn candidate(node: &Node, tier: MatchTier, score: f64) -> Candidate {
    Candidate {
        node: node.id.clone(),
        label: node.display_name().to_string(),
        kind: node.kind,
        score,
        tier,
    }
}

fn match_key(
    key: &str,
    query: &str,
    query_tokens: &HashSet<&str>,
    min_similarity: f64,
) -> Option<(MatchTier, f64)> {
    if key == query {
        return Some((MatchTier::Exact, 1.0));
    }
    // Longer keys cover less of the query, so they score lower in the band.
    let coverage = query.chars().count() as f64 / key.chars().count() as f64;
    if key.starts_with(query) {
        return Some((MatchTier::Prefix, PREFIX_BASE + BAND_SPAN * coverage.min(1.0)));
    }
    if key.contains(query) {
        return Some((
            MatchTier::Substring,
            SUBSTRING_BASE + BAND_SPAN * coverage.min(1.0),
        ));
    }

    let key_tokens = tokens(key);
    let similarity =
        jaccard_similarity(query_tokens, &key_tokens).max(strsim::normalized_levenshtein(query, key));
    (similarity >= min_similarity).then_some((MatchTier::Fuzzy, FUZZY_WEIGHT * similarity))
}

fn tokens(s: &str) -> HashSet<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Compute Jaccard similarity between two token sets.
fn jaccard_similarity(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union
}
