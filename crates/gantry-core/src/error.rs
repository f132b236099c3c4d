//! Error types for state construction and transitions.
//!
//! Every variant here is fatal: it signals a broken configuration or a
//! violated action precondition, never an ordinary search outcome.

use thiserror::Error;

use crate::block::BlockId;
use crate::geom::Point3;

/// Fatal state-model errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("blocks {first} and {second} both occupy {at}")]
    Collision {
        first: BlockId,
        second: BlockId,
        at: Point3,
    },
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),
    #[error("block {0} has no location")]
    Unplaced(BlockId),
    #[error("block {block} cannot be placed at {at}: outside the board")]
    OutOfBounds { block: BlockId, at: Point3 },
    #[error("block {block} is floating at {at} with nothing beneath it")]
    Floating { block: BlockId, at: Point3 },
    #[error("block {0} would exceed four side-by-side neighbors")]
    TooManyNeighbors(BlockId),
    #[error("block {block} is not a top block ({above} rests on it)")]
    NotTop { block: BlockId, above: BlockId },
    #[error("block {block} cannot slide from height {height}")]
    NotOnTable { block: BlockId, height: i32 },
    #[error("cannot act on {block}: block {held} is already held")]
    AlreadyHolding { block: BlockId, held: BlockId },
    #[error("block {0} is not held")]
    NotHeld(BlockId),
    #[error("cannot place {block} onto itself")]
    OntoSelf { block: BlockId },
    #[error("destination {at} for {block} is not supported by the table or a block")]
    Unsupported { block: BlockId, at: Point3 },
    #[error("block {block}: {detail}")]
    Inconsistent { block: BlockId, detail: String },
}

/// Errors from the record parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed record `{text}`")]
    Malformed { line: usize, text: String },
    #[error("line {line}: unsupported property `{property}`")]
    UnsupportedProperty { line: usize, property: String },
    #[error("line {line}: invalid integer `{value}`")]
    BadInteger { line: usize, value: String },
    #[error("invalid command `{0}`")]
    BadCommand(String),
}
