//! Hierarchical planner for the gantry blocks world.
//!
//! A plan is found in two tiers. The route tier searches over coarse
//! actions (pick-and-place stacks and whole-stack slides) for a sequence of
//! configurations meeting the goal. The move tier then expands every route
//! transition into arm commands: grab, release, unit carries and unit
//! slides.
//!
//! ```text
//! Description --builder--> State --Planner--> route --move tier--> [Command]
//! ```
//!
//! Both tiers run on [`gantry_search`] engines, chosen per tier in
//! [`PlannerConfig`].

pub mod builder;
pub mod config;
mod error;
pub mod goal;
pub mod heuristic;
mod planner;
pub mod replay;
pub mod rules;
pub mod tier;

pub use builder::{BuildOptions, build_goal, build_initial, check_goal};
pub use config::{Engine, HeuristicConfig, HeuristicKind, Metric, PlannerConfig, StackCost, TierConfig};
pub use error::{BuildError, PlanError, ReplayError};
pub use planner::{Plan, PlanStats, PlanStatus, Planner};
pub use replay::replay;
pub use rules::Rules;
