//! Planner configuration.
//!
//! Everything the planner reads is in one immutable [`PlannerConfig`]
//! handed to [`Planner::new`](crate::Planner::new). With the `serde`
//! feature the whole tree loads from JSON; budgets are written as
//! fractional seconds and every field has a default.

use std::time::Duration;

use gantry_core::{Board, GrabPolicy};
use gantry_search::{Backup, Cost};

/// Search engine used by a planning tier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Engine {
    /// Recursive best-first search.
    #[default]
    Rbfs,
    /// Heap-based best-first search (A*).
    Hbfs,
}

/// Per-tier search settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TierConfig {
    pub engine: Engine,
    /// Only used by [`Engine::Rbfs`].
    pub backup: Backup,
    /// Whether the held block counts when testing for the tier's target.
    pub grab_policy: GrabPolicy,
    /// Per-search expansion cap; hitting it counts as unreachable.
    pub max_expansions: Option<usize>,
}

/// Expansion cap of one move-tier search.
pub const MOVE_EXPANSIONS: usize = 20_000;

impl TierConfig {
    /// Route tier defaults: held block is part of state identity.
    pub fn route() -> Self {
        Self {
            engine: Engine::Rbfs,
            backup: Backup::Monotone,
            grab_policy: GrabPolicy::Include,
            max_expansions: None,
        }
    }

    /// Move tier defaults: a target is reached once every block sits in
    /// place, held or not.
    pub fn moves() -> Self {
        Self {
            grab_policy: GrabPolicy::Ignore,
            max_expansions: Some(MOVE_EXPANSIONS),
            ..Self::route()
        }
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self::route()
    }
}

/// Cost of a route-tier stack action.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StackCost {
    /// Every stack costs 1.
    #[default]
    Unit,
    /// `|Δheight| + 1`.
    HeightDelta,
}

/// Distance measure for the displacement heuristic.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    Manhattan,
    #[default]
    Chebyshev,
    /// 1 when misplaced, else 0.
    Unit,
}

/// Which estimate a tier uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeuristicKind {
    Mismatch,
    Distance,
    #[default]
    Combined,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeuristicConfig {
    pub kind: HeuristicKind,
    pub metric: Metric,
    /// Added per misplaced block by the distance estimate.
    pub overhead: Cost,
    /// Multiplier of the mismatch estimate.
    pub scale: Cost,
}

impl HeuristicConfig {
    /// Route tier default: misplacement count plus relation mismatches.
    pub fn route() -> Self {
        Self {
            kind: HeuristicKind::Combined,
            metric: Metric::Unit,
            overhead: 0,
            scale: 1,
        }
    }

    /// Move tier default.
    pub fn moves() -> Self {
        Self {
            kind: HeuristicKind::Combined,
            metric: Metric::Chebyshev,
            overhead: 1,
            scale: 1,
        }
    }
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self::moves()
    }
}

/// The complete planner configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Wall-clock budget of the whole run, from the planner's start.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub total_budget: Duration,
    /// Budget of the route tier, from the same start.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub route_budget: Duration,
    pub route: TierConfig,
    pub moves: TierConfig,
    pub route_heuristic: HeuristicConfig,
    pub move_heuristic: HeuristicConfig,
    pub stack_cost: StackCost,
    /// Emit a trailing release when the plan ends holding a block.
    pub release_at_end: bool,
    pub board: Board,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            total_budget: Duration::from_secs(60),
            route_budget: Duration::from_millis(57_500),
            route: TierConfig::route(),
            moves: TierConfig::moves(),
            route_heuristic: HeuristicConfig::route(),
            move_heuristic: HeuristicConfig::moves(),
            stack_cost: StackCost::Unit,
            release_at_end: true,
            board: Board::default(),
        }
    }
}

impl PlannerConfig {
    /// Set the total budget, keeping the route tier's share of it.
    pub fn with_total_budget(mut self, total: Duration) -> Self {
        let share = if self.total_budget.is_zero() {
            1.0
        } else {
            self.route_budget.as_secs_f64() / self.total_budget.as_secs_f64()
        };
        self.total_budget = total;
        self.route_budget = total.mul_f64(share.clamp(0.0, 1.0));
        self
    }

    /// The route budget, never longer than the total budget.
    pub fn effective_route_budget(&self) -> Duration {
        self.route_budget.min(self.total_budget)
    }
}

#[cfg(feature = "serde")]
pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom)
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let c: PlannerConfig = serde_json::from_str(
            r#"{ "total_budget": 2.5, "moves": { "engine": "hbfs" }, "stack_cost": "height_delta" }"#,
        )
        .unwrap();
        assert_eq!(c.total_budget, Duration::from_millis(2500));
        assert_eq!(c.moves.engine, Engine::Hbfs);
        assert_eq!(c.moves.backup, Backup::Monotone);
        assert_eq!(c.stack_cost, StackCost::HeightDelta);
        assert_eq!(c.board, Board::default());
    }

    #[test]
    fn round_trip() {
        let c = PlannerConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let back: PlannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, back);
    }
}
