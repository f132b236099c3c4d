//! Re-run a command list against a state.

use gantry_core::{Action, Command, Point3, State, StateError, Support};

use crate::error::ReplayError;
use crate::rules::Rules;

/// Apply `commands` in order, starting from `start`.
///
/// Table stacks carry no destination and cannot be replayed.
pub fn replay(rules: &Rules, start: &State, commands: &[Command]) -> Result<State, ReplayError> {
    let mut state = start.clone();
    for (index, cmd) in commands.iter().enumerate() {
        let illegal = |source: StateError| ReplayError::Illegal {
            index,
            command: cmd.to_string(),
            source,
        };
        let action = to_action(&state, cmd).map_err(|e| match e {
            Lowering::Unreplayable(reason) => ReplayError::Unreplayable {
                index,
                command: cmd.to_string(),
                reason,
            },
            Lowering::State(e) => illegal(e),
        })?;
        let (next, _) = rules.apply(&state, &action).map_err(illegal)?;
        state = next;
    }
    Ok(state)
}

enum Lowering {
    Unreplayable(&'static str),
    State(StateError),
}

fn to_action(state: &State, cmd: &Command) -> Result<Action, Lowering> {
    Ok(match cmd.clone() {
        Command::Grab(b) => Action::Grab(b),
        Command::Release(b) => Action::Release(b),
        Command::Slide { block, dx, dy } => Action::Slide { block, dx, dy },
        Command::Carry { block, dx, dy, dz } => Action::Carry {
            block,
            delta: Point3::new(dx, dy, dz),
        },
        Command::Stack {
            onto: Support::Table,
            ..
        } => return Err(Lowering::Unreplayable("table destination has no coordinates")),
        Command::Stack {
            block,
            onto: Support::Block(under),
        } => {
            let to = state.location(under.as_str()).map_err(Lowering::State)?.above();
            Action::Stack {
                block,
                onto: Support::Block(under),
                to,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::{Block, BlockId};

    fn world() -> State {
        State::from_placed([
            Block::new("a").at(Point3::new(0, 0, 0)),
            Block::new("b").at(Point3::new(2, 0, 0)),
        ])
        .unwrap()
    }

    fn cmds(lines: &[&str]) -> Vec<Command> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    #[test]
    fn replays_arm_commands() {
        let end = replay(
            &Rules::default(),
            &world(),
            &cmds(&[
                "(command grab a)",
                "(command carry a 1 0 0)",
                "(command carry a 1 0 1)",
                "(command release a)",
            ]),
        )
        .unwrap();
        assert_eq!(end.get("a").unwrap().on_top_of, Some(BlockId::new("b")));
        assert!(end.grabbed().is_none());
    }

    #[test]
    fn replays_stack_onto_block() {
        let end = replay(&Rules::default(), &world(), &cmds(&["(command stack a b)"])).unwrap();
        assert_eq!(end.location("a").unwrap(), Point3::new(2, 0, 1));
    }

    #[test]
    fn table_stack_is_unreplayable() {
        let err = replay(&Rules::default(), &world(), &cmds(&["(command stack a table)"])).unwrap_err();
        assert!(matches!(err, ReplayError::Unreplayable { index: 0, .. }));
    }

    #[test]
    fn illegal_command_reports_index() {
        let err = replay(
            &Rules::default(),
            &world(),
            &cmds(&["(command grab a)", "(command grab b)"]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Illegal {
                index: 1,
                source: StateError::AlreadyHolding { .. },
                ..
            }
        ));
    }
}
