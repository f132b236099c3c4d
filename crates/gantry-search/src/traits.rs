use std::hash::Hash;

/// Path cost. Saturating arithmetic keeps [`UNBOUNDED`] absorbing.
pub type Cost = u32;

/// Sentinel for "no bound" / "unreachable".
pub const UNBOUNDED: Cost = Cost::MAX;

/// A state space: action enumeration plus a transition function.
pub trait Domain {
    type State: Clone;
    type Action: Clone;
    type Error;

    /// Append the legal actions in `state` into `buf`. The caller clears
    /// `buf` before calling.
    fn actions(&self, state: &Self::State, buf: &mut Vec<Self::Action>) -> Result<(), Self::Error>;

    /// Apply `action` to a copy of `state`, returning the successor and the
    /// step cost (must be > 0).
    fn apply(&self, state: &Self::State, action: &Self::Action)
    -> Result<(Self::State, Cost), Self::Error>;
}

/// Goal test and heuristic estimate for a search.
pub trait Objective<S> {
    fn is_goal(&self, state: &S) -> bool;

    /// Estimated remaining cost. Need not be admissible.
    fn estimate(&self, state: &S) -> Cost;
}

/// Domain whose states can be deduplicated by a canonical key.
pub trait Keyed: Domain {
    type Key: Hash + Eq + Clone;

    fn key(&self, state: &Self::State) -> Self::Key;
}
