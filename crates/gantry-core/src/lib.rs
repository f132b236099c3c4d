//! Blocks-world state model for the gantry planner.
//!
//! This crate provides the value types every other gantry crate builds on:
//! grid geometry, blocks and their spatial relations, the immutable world
//! [`State`], the action and command vocabulary, and the record parser for
//! world descriptions.

pub mod action;
pub mod block;
pub mod command;
pub mod describe;
pub mod error;
pub mod geom;
pub mod scatter;
pub mod state;

pub use action::{Action, Support};
pub use block::{Block, BlockId, MAX_NEIGHBORS};
pub use command::Command;
pub use describe::{Description, Record};
pub use error::{ParseError, StateError};
pub use geom::{Board, Point3, chebyshev, manhattan};
pub use state::{GrabPolicy, State, StateKey};
