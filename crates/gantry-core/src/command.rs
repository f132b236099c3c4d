//! Output commands and their textual record form.
//!
//! ```text
//! (command grab ID)
//! (command release ID)
//! (command slide ID dX dY)
//! (command carry ID dX dY dZ)
//! (command stack ID DEST)
//! ```

use std::fmt;
use std::str::FromStr;

use crate::action::Support;
use crate::block::BlockId;
use crate::error::ParseError;

/// One line of planner output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Command {
    Grab(BlockId),
    Release(BlockId),
    Slide { block: BlockId, dx: i32, dy: i32 },
    Carry { block: BlockId, dx: i32, dy: i32, dz: i32 },
    Stack { block: BlockId, onto: Support },
}

impl Command {
    /// The block the command refers to.
    pub fn block(&self) -> &BlockId {
        match self {
            Command::Grab(b) | Command::Release(b) => b,
            Command::Slide { block, .. }
            | Command::Carry { block, .. }
            | Command::Stack { block, .. } => block,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Grab(b) => write!(f, "(command grab {b})"),
            Command::Release(b) => write!(f, "(command release {b})"),
            Command::Slide { block, dx, dy } => write!(f, "(command slide {block} {dx} {dy})"),
            Command::Carry { block, dx, dy, dz } => {
                write!(f, "(command carry {block} {dx} {dy} {dz})")
            }
            Command::Stack { block, onto } => write!(f, "(command stack {block} {onto})"),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseError::BadCommand(s.trim().to_owned());
        let inner = s
            .trim()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(bad)?;
        let words: Vec<&str> = inner.split_whitespace().collect();
        let int = |w: &str| w.parse::<i32>().map_err(|_| bad());
        match words.as_slice() {
            ["command", "grab", id] => Ok(Command::Grab(BlockId::new(id))),
            ["command", "release", id] => Ok(Command::Release(BlockId::new(id))),
            ["command", "slide", id, dx, dy] => Ok(Command::Slide {
                block: BlockId::new(id),
                dx: int(dx)?,
                dy: int(dy)?,
            }),
            ["command", "carry", id, dx, dy, dz] => Ok(Command::Carry {
                block: BlockId::new(id),
                dx: int(dx)?,
                dy: int(dy)?,
                dz: int(dz)?,
            }),
            ["command", "stack", id, dest] => Ok(Command::Stack {
                block: BlockId::new(id),
                onto: if dest.eq_ignore_ascii_case("table") {
                    Support::Table
                } else {
                    Support::Block(BlockId::new(dest))
                },
            }),
            _ => Err(bad()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_what_it_prints() {
        let cmds = [
            "(command grab block1)",
            "(command release block1)",
            "(command slide block1 1 0)",
            "(command carry block2 -1 0 1)",
            "(command stack block3 table)",
            "(command stack block3 block1)",
        ];
        for text in cmds {
            let c: Command = text.parse().unwrap();
            assert_eq!(c.to_string(), text);
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!("command grab x".parse::<Command>().is_err());
        assert!("(command slide x one 0)".parse::<Command>().is_err());
        assert!("(command fly x)".parse::<Command>().is_err());
        assert_eq!(
            "(command jump)".parse::<Command>(),
            Err(ParseError::BadCommand("(command jump)".into()))
        );
    }
}
