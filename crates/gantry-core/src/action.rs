//! The action vocabulary shared by both planning tiers.

use std::fmt;

use crate::block::BlockId;
use crate::command::Command;
use crate::geom::Point3;

/// What a stacked block ends up resting on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Support {
    Table,
    Block(BlockId),
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Table => f.write_str("table"),
            Support::Block(id) => write!(f, "{id}"),
        }
    }
}

/// A single state change.
///
/// `Stack` and the long-range form of `Slide` are route-tier abstractions;
/// `Grab`, `Release`, `Carry` and unit `Slide` are arm primitives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    /// Move a top block to `to`, resting on `onto`.
    Stack {
        block: BlockId,
        onto: Support,
        to: Point3,
    },
    /// Slide a table block (with whatever is stacked on it) by `(dx, dy)`.
    Slide { block: BlockId, dx: i32, dy: i32 },
    Grab(BlockId),
    Release(BlockId),
    /// Move the held block by a unit offset.
    Carry { block: BlockId, delta: Point3 },
}

impl Action {
    /// The block this action moves or touches.
    pub fn block(&self) -> &BlockId {
        match self {
            Action::Stack { block, .. }
            | Action::Slide { block, .. }
            | Action::Carry { block, .. }
            | Action::Grab(block)
            | Action::Release(block) => block,
        }
    }

    /// Whether this action changes any block location.
    pub fn moves_blocks(&self) -> bool {
        !matches!(self, Action::Grab(_) | Action::Release(_))
    }

    /// The output command for this action.
    pub fn to_command(&self) -> Command {
        match self.clone() {
            Action::Stack { block, onto, .. } => Command::Stack { block, onto },
            Action::Slide { block, dx, dy } => Command::Slide { block, dx, dy },
            Action::Grab(block) => Command::Grab(block),
            Action::Release(block) => Command::Release(block),
            Action::Carry { block, delta } => Command::Carry {
                block,
                dx: delta.x,
                dy: delta.y,
                dz: delta.z,
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Stack { block, onto, to } => write!(f, "stack {block} onto {onto} at {to}"),
            Action::Slide { block, dx, dy } => write!(f, "slide {block} by ({dx}, {dy})"),
            Action::Grab(b) => write!(f, "grab {b}"),
            Action::Release(b) => write!(f, "release {b}"),
            Action::Carry { block, delta } => write!(f, "carry {block} by {delta}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carry_becomes_command_with_components() {
        let a = Action::Carry {
            block: BlockId::new("b1"),
            delta: Point3::new(1, 0, -1),
        };
        assert_eq!(a.to_command().to_string(), "(command carry b1 1 0 -1)");
        assert!(a.moves_blocks());
        assert!(!Action::Grab(BlockId::new("b1")).moves_blocks());
    }

    #[test]
    fn stack_drops_coordinates() {
        let a = Action::Stack {
            block: BlockId::new("b1"),
            onto: Support::Table,
            to: Point3::new(4, 4, 0),
        };
        assert_eq!(a.to_command().to_string(), "(command stack b1 table)");
        assert_eq!(a.block().as_str(), "b1");
    }
}
