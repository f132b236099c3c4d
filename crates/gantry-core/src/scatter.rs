//! Random world generation for experiments and property tests.

use rand::prelude::*;

use crate::block::Block;
use crate::error::StateError;
use crate::geom::{Board, Point3};
use crate::state::State;

/// Parameters for [`scatter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scatter {
    pub blocks: usize,
    /// Tallest allowed stack, counted in blocks.
    pub max_stack: usize,
    pub colors: Vec<String>,
    pub board: Board,
    /// Prefix for generated ids (`block1`, `block2`, ...).
    pub prefix: String,
}

impl Default for Scatter {
    fn default() -> Self {
        Self {
            blocks: 5,
            max_stack: 3,
            colors: ["red", "green", "blue"].map(String::from).to_vec(),
            board: Board::default(),
            prefix: "block".into(),
        }
    }
}

/// Build a random, relinked world.
///
/// Blocks are dropped onto random columns; a full column (or a board too
/// small to host all blocks) makes the generator fall back to the next free
/// column in scan order.
pub fn scatter<R: Rng + ?Sized>(rng: &mut R, cfg: &Scatter) -> Result<State, StateError> {
    let columns: Vec<Point3> = cfg.board.cells().collect();
    let max_stack = cfg.max_stack.max(1);
    let mut heights = vec![0usize; columns.len()];
    let mut placed = Vec::with_capacity(cfg.blocks);
    for n in 1..=cfg.blocks {
        let id = format!("{}{n}", cfg.prefix);
        if columns.is_empty() {
            return Err(StateError::OutOfBounds {
                block: id.into(),
                at: Point3::ZERO,
            });
        }
        let start = rng.random_range(0..columns.len());
        let slot = (0..columns.len())
            .map(|i| (start + i) % columns.len())
            .find(|&i| heights[i] < max_stack);
        let Some(i) = slot else {
            return Err(StateError::OutOfBounds {
                block: id.into(),
                at: columns[start],
            });
        };
        let at = columns[i].shift(0, 0, heights[i] as i32);
        heights[i] += 1;
        let mut block = Block::new(id).at(at);
        if !cfg.colors.is_empty() {
            block.color = Some(cfg.colors[rng.random_range(0..cfg.colors.len())].clone());
        }
        placed.push(block);
    }
    State::from_placed(placed)
}

/// Rearrange the blocks of `state` at random, keeping ids and colors.
pub fn shuffle<R: Rng + ?Sized>(rng: &mut R, state: &State, cfg: &Scatter) -> Result<State, StateError> {
    let fresh = scatter(
        rng,
        &Scatter {
            blocks: state.len(),
            colors: Vec::new(),
            ..cfg.clone()
        },
    )?;
    let mut spots: Vec<Point3> = fresh.blocks().filter_map(|b| b.location).collect();
    // Bottom-up order keeps every stack supported whatever ids land where.
    spots.sort();
    let mut ids: Vec<_> = state.ids().cloned().collect();
    ids.shuffle(rng);
    let mut placed = Vec::with_capacity(ids.len());
    for (id, at) in ids.into_iter().zip(spots) {
        let mut b = Block::new(id.clone()).at(at);
        b.color = state.get(id.as_str()).and_then(|o| o.color.clone());
        placed.push(b);
    }
    State::from_placed(placed)
}
