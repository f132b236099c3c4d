//! The two planning tiers expressed as search domains.

use gantry_core::{Action, GrabPolicy, State, StateError, StateKey};
use gantry_search::{Cost, Domain, Keyed, Objective};

use crate::goal;
use crate::heuristic::Heuristic;
use crate::rules::Rules;

/// Coarse search: whole stacks and pick-and-place moves toward the goal.
pub struct RouteTier<'a> {
    pub rules: &'a Rules,
    pub goal: &'a State,
    pub policy: GrabPolicy,
}

impl Domain for RouteTier<'_> {
    type State = State;
    type Action = Action;
    type Error = StateError;

    fn actions(&self, state: &State, buf: &mut Vec<Action>) -> Result<(), StateError> {
        self.rules.route_actions(state, self.goal, buf);
        Ok(())
    }

    fn apply(&self, state: &State, action: &Action) -> Result<(State, Cost), StateError> {
        self.rules.apply(state, action)
    }
}

impl Keyed for RouteTier<'_> {
    type Key = StateKey;

    fn key(&self, state: &State) -> StateKey {
        state.key(self.policy)
    }
}

/// Route objective: every goal fact holds.
pub struct ReachGoal<'a> {
    pub goal: &'a State,
    pub heuristic: Heuristic<'a>,
}

impl Objective<State> for ReachGoal<'_> {
    fn is_goal(&self, state: &State) -> bool {
        goal::satisfies(state, self.goal)
    }

    fn estimate(&self, state: &State) -> Cost {
        self.heuristic.estimate(state)
    }
}

/// Fine search: arm primitives only.
///
/// States are told apart with the held block included, whatever policy the
/// objective tests with: grab and release must lead to new states.
pub struct MoveTier<'a> {
    pub rules: &'a Rules,
}

impl Domain for MoveTier<'_> {
    type State = State;
    type Action = Action;
    type Error = StateError;

    fn actions(&self, state: &State, buf: &mut Vec<Action>) -> Result<(), StateError> {
        self.rules.move_actions(state, buf);
        Ok(())
    }

    fn apply(&self, state: &State, action: &Action) -> Result<(State, Cost), StateError> {
        self.rules.apply(state, action)
    }
}

impl Keyed for MoveTier<'_> {
    type Key = StateKey;

    fn key(&self, state: &State) -> StateKey {
        state.key(GrabPolicy::Include)
    }
}

/// Move objective: reach exactly the configuration of one route state.
pub struct ReachState<'a> {
    pub target: StateKey,
    pub policy: GrabPolicy,
    pub heuristic: Heuristic<'a>,
}

impl<'a> ReachState<'a> {
    pub fn new(target: &State, policy: GrabPolicy, heuristic: Heuristic<'a>) -> Self {
        Self {
            target: target.key(policy),
            policy,
            heuristic,
        }
    }
}

impl Objective<State> for ReachState<'_> {
    fn is_goal(&self, state: &State) -> bool {
        state.key(self.policy) == self.target
    }

    fn estimate(&self, state: &State) -> Cost {
        self.heuristic.estimate(state)
    }
}
