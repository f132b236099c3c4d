//! Goal satisfaction for (possibly partial) goal descriptions.
//!
//! A goal is a [`State`] in which only the specified facts are set:
//! a missing location, `on_top_of` or `below` leaves that aspect free, and
//! the listed neighbors must be a subset of the actual ones.

use gantry_core::{Block, State};

/// Whether `state` meets every fact stated by `goal`.
pub fn satisfies(state: &State, goal: &State) -> bool {
    goal.blocks().all(|g| match state.get(g.id.as_str()) {
        Some(b) => block_satisfies(b, g),
        None => false,
    })
}

/// Whether a single block meets its goal facts.
pub fn block_satisfies(b: &Block, g: &Block) -> bool {
    if g.location.is_some() && b.location != g.location {
        return false;
    }
    if g.on_top_of.is_some() && b.on_top_of != g.on_top_of {
        return false;
    }
    if g.below.is_some() && b.below != g.below {
        return false;
    }
    g.neighbors.is_subset(&b.neighbors)
}

/// Number of goal blocks not yet satisfied.
pub fn unsatisfied(state: &State, goal: &State) -> usize {
    goal.blocks()
        .filter(|g| !state.get(g.id.as_str()).is_some_and(|b| block_satisfies(b, g)))
        .count()
}
