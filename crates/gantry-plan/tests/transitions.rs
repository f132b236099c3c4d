//! Property tests: every generated action is legal and keeps the world
//! consistent, and no transition touches its input.

use gantry_core::scatter::{Scatter, scatter};
use gantry_core::{Action, Board, State};
use gantry_plan::{Rules, StackCost};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn world(seed: u64, blocks: usize) -> State {
    let cfg = Scatter {
        blocks,
        max_stack: 3,
        board: Board::new(0, 0, 6, 6),
        ..Scatter::default()
    };
    scatter(&mut StdRng::seed_from_u64(seed), &cfg).unwrap()
}

fn check_all(rules: &Rules, state: &State, actions: &[Action]) -> Result<(), TestCaseError> {
    let before = state.clone();
    for a in actions {
        let (next, cost) = rules.apply(state, a).map_err(|e| TestCaseError::fail(format!("{a}: {e}")))?;
        prop_assert!(cost > 0);
        let violations = next.check_invariants();
        prop_assert!(violations.is_empty(), "{a} broke invariants: {violations:?}");
        prop_assert_eq!(next.len(), state.len());
        prop_assert_eq!(state, &before);
    }
    Ok(())
}

proptest! {
    #[test]
    fn move_actions_keep_invariants(seed in any::<u64>(), blocks in 1usize..7, pick in any::<prop::sample::Index>()) {
        let rules = Rules::new(Board::new(0, 0, 6, 6), StackCost::Unit);
        let mut state = world(seed, blocks);
        let mut buf = Vec::new();
        rules.move_actions(&state, &mut buf);
        check_all(&rules, &state, &buf)?;

        // Again while holding something.
        let grab = buf.iter().find(|a| matches!(a, Action::Grab(_))).cloned();
        if let Some(g) = grab {
            state = rules.apply(&state, &g).unwrap().0;
            buf.clear();
            rules.move_actions(&state, &mut buf);
            prop_assert!(!buf.is_empty());
            check_all(&rules, &state, &buf)?;
            let a = pick.get(&buf).clone();
            let (next, _) = rules.apply(&state, &a).unwrap();
            prop_assert!(next.check_invariants().is_empty());
        }
    }

    #[test]
    fn route_actions_keep_invariants(seed in any::<u64>(), goal_seed in any::<u64>(), blocks in 1usize..6) {
        let rules = Rules::new(Board::new(0, 0, 6, 6), StackCost::HeightDelta);
        let state = world(seed, blocks);
        let goal = world(goal_seed, blocks);
        let mut buf = Vec::new();
        rules.route_actions(&state, &goal, &mut buf);
        check_all(&rules, &state, &buf)?;
    }

    #[test]
    fn keys_ignore_grab_only_when_asked(seed in any::<u64>(), blocks in 1usize..6) {
        let rules = Rules::default();
        let state = world(seed, blocks);
        let Some(top) = state.blocks().find(|b| b.is_top()).map(|b| b.id.clone()) else {
            return Ok(());
        };
        let (held, _) = rules.apply(&state, &Action::Grab(top)).unwrap();
        prop_assert_eq!(state.key(gantry_core::GrabPolicy::Ignore), held.key(gantry_core::GrabPolicy::Ignore));
        prop_assert_ne!(state.key(gantry_core::GrabPolicy::Include), held.key(gantry_core::GrabPolicy::Include));
    }
}
