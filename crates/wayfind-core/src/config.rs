//! Configuration for graph building, resolving and routing.
//!
//! Load order: `.wayfind/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level wayfind configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub build: BuildConfig,
    pub resolve: ResolveConfig,
    pub route: RouteConfig,
    pub directions: DirectionConfig,
}

/// Graph builder tolerances and costs, all in plan units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Grid size positions are snapped to when deriving node ids.
    pub quantum: f64,
    /// Hallway waypoints closer than this (same floor) become one node.
    pub dedup_tolerance: f64,
    /// A door within this distance of a room's box is attached to the room.
    pub door_tolerance: f64,
    /// Maximum distance for snapping a door to the nearest hallway waypoint.
    /// Unbounded when unset.
    pub door_snap_radius: Option<f64>,
    /// Traversal cost of one floor-change edge (stairs or lift).
    pub floor_change_cost: f64,
}

/// Free-text resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Maximum number of candidates returned.
    pub limit: usize,
    /// Fuzzy matches below this similarity are dropped.
    pub min_similarity: f64,
    /// Merge every tier instead of stopping at the first non-empty one.
    pub merge_tiers: bool,
    /// Offer plain corridor waypoints as candidates.
    pub include_waypoints: bool,
}

/// Route search settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Abort the search after this many milliseconds.
    pub timeout_ms: Option<u64>,
    /// Abort the search after expanding this many nodes.
    pub max_expansions: Option<usize>,
    /// Report DISCONNECTED_GRAPH instead of NO_PATH when the endpoints lie in
    /// different components.
    pub diagnose_components: bool,
}

/// Turn classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    /// Turns smaller than this (degrees) read as "continue straight".
    pub straight_threshold: f64,
    /// Turns larger than this (degrees) read as "turn around".
    pub turn_around_threshold: f64,
    /// Plan y axis grows downward (image coordinates).
    pub y_axis_down: bool,
    /// Fold runs of "continue straight" into one instruction.
    pub merge_straight: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            quantum: 1e-3,
            dedup_tolerance: 1e-3,
            door_tolerance: 0.5,
            door_snap_radius: None,
            floor_change_cost: 100.0,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            min_similarity: 0.4,
            merge_tiers: false,
            include_waypoints: false,
        }
    }
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            straight_threshold: 20.0,
            turn_around_threshold: 160.0,
            y_axis_down: true,
            merge_straight: false,
        }
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl NavConfig {
    /// Load config from `.wayfind/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".wayfind").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment variable overrides
        env_override(
            "WAYFIND_DEDUP_TOLERANCE",
            &mut config.build.dedup_tolerance,
        );
        env_override("WAYFIND_DOOR_TOLERANCE", &mut config.build.door_tolerance);
        env_override(
            "WAYFIND_FLOOR_CHANGE_COST",
            &mut config.build.floor_change_cost,
        );
        env_override("WAYFIND_RESOLVE_LIMIT", &mut config.resolve.limit);
        env_override(
            "WAYFIND_MIN_SIMILARITY",
            &mut config.resolve.min_similarity,
        );
        if let Ok(v) = std::env::var("WAYFIND_ROUTE_TIMEOUT_MS")
            && let Ok(ms) = v.parse()
        {
            config.route.timeout_ms = Some(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let b = &self.build;
        if !is_positive(b.quantum) || !is_positive(b.dedup_tolerance) {
            anyhow::bail!(
                "quantum ({}) and dedup_tolerance ({}) must be positive",
                b.quantum,
                b.dedup_tolerance
            );
        }
        if b.door_tolerance.is_nan() || b.door_tolerance < 0.0 {
            anyhow::bail!("door_tolerance ({}) must not be negative", b.door_tolerance);
        }
        if !b.floor_change_cost.is_finite() || b.floor_change_cost < 0.0 {
            anyhow::bail!(
                "floor_change_cost ({}) must be finite and not negative",
                b.floor_change_cost
            );
        }
        if !(0.0..=1.0).contains(&self.resolve.min_similarity) {
            anyhow::bail!(
                "min_similarity ({}) must lie in [0, 1]",
                self.resolve.min_similarity
            );
        }
        let d = &self.directions;
        if d.straight_threshold >= d.turn_around_threshold {
            anyhow::bail!(
                "straight_threshold ({}) must be less than turn_around_threshold ({})",
                d.straight_threshold,
                d.turn_around_threshold,
            );
        }
        Ok(())
    }
}
