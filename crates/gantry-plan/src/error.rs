use gantry_core::{BlockId, ParseError, StateError};
use thiserror::Error;

/// Errors while turning descriptions into initial and goal states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("block {0} could not be placed: no location and no supporting block")]
    Unplaceable(BlockId),
    #[error("block {block} has conflicting locations {first} and {second}")]
    ConflictingLocation {
        block: BlockId,
        first: gantry_core::Point3,
        second: gantry_core::Point3,
    },
    #[error("block {block} is {goal} in the goal but {initial} initially")]
    ColorMismatch {
        block: BlockId,
        initial: String,
        goal: String,
    },
    #[error("goal block {0} does not exist in the initial state")]
    UnknownGoalBlock(BlockId),
    #[error("wildcard {wildcard} matches no block")]
    UnboundWildcard { wildcard: BlockId },
    #[error("wildcard {wildcard} is ambiguous: {candidates:?}")]
    AmbiguousWildcard {
        wildcard: BlockId,
        candidates: Vec<BlockId>,
    },
    #[error("block {block} has conflicting goal relation: {detail}")]
    ConflictingRelation { block: BlockId, detail: String },
    #[error("goal is inconsistent: {0}")]
    InvalidGoal(String),
}

/// Fatal planner errors. Search failure and timeouts are reported through
/// [`PlanStatus`](crate::PlanStatus), not here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid initial state: {0}")]
    InvalidInitial(StateError),
    #[error("goal block {0} does not exist in the initial state")]
    UnknownGoalBlock(BlockId),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Errors while replaying commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("command {index} `{command}` cannot be replayed: {reason}")]
    Unreplayable {
        index: usize,
        command: String,
        reason: &'static str,
    },
    #[error("command {index} `{command}` failed: {source}")]
    Illegal {
        index: usize,
        command: String,
        #[source]
        source: StateError,
    },
}
