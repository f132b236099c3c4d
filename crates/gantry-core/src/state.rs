//! The blocks-world [`State`]: a registry of blocks plus the held block.
//!
//! A `State` is a plain value. Cloning it yields a structurally independent
//! copy (block ids are immutable shared strings, everything else is owned),
//! so two search nodes never observe each other's changes.
//!
//! Spatial relations (`on_top_of`, `below`, `neighbors`) are always derived
//! from locations by [`State::relink`], never patched incrementally.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::block::{Block, BlockId, MAX_NEIGHBORS};
use crate::error::StateError;
use crate::geom::Point3;

/// Whether the held block participates in state equality.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GrabPolicy {
    /// Two states holding different blocks are different.
    #[default]
    Include,
    /// Only block locations matter.
    Ignore,
}

/// Canonical identity of a configuration, used for deduplication.
///
/// Relations are a pure function of locations, so the sorted
/// `(id, location)` list is the whole externally meaningful relation set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    cells: Vec<(BlockId, Option<Point3>)>,
    grabbed: Option<BlockId>,
}

/// A full blocks-world configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    blocks: BTreeMap<BlockId, Block>,
    grabbed: Option<BlockId>,
}

impl State {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from blocks and derive all relations from their
    /// locations.
    pub fn from_placed(blocks: impl IntoIterator<Item = Block>) -> Result<Self, StateError> {
        let mut state = Self::new();
        for b in blocks {
            state.insert(b);
        }
        state.relink()?;
        Ok(state)
    }

    /// Insert or replace a block, returning the previous one.
    pub fn insert(&mut self, block: Block) -> Option<Block> {
        self.blocks.insert(block.id.clone(), block)
    }

    /// Remove a block. Clears the held slot if it was the held block.
    pub fn remove(&mut self, id: &str) -> Option<Block> {
        if self.grabbed.as_ref().is_some_and(|g| g.as_str() == id) {
            self.grabbed = None;
        }
        self.blocks.remove(id)
    }

    /// Look up a block.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Look up a block mutably.
    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    /// Look up a block, failing with [`StateError::UnknownBlock`].
    pub fn block(&self, id: &str) -> Result<&Block, StateError> {
        self.blocks
            .get(id)
            .ok_or_else(|| StateError::UnknownBlock(BlockId::new(id)))
    }

    /// Look up a block mutably, failing with [`StateError::UnknownBlock`].
    pub fn block_mut(&mut self, id: &str) -> Result<&mut Block, StateError> {
        self.blocks
            .get_mut(id)
            .ok_or_else(|| StateError::UnknownBlock(BlockId::new(id)))
    }

    /// Whether a block with this id exists.
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Blocks in id order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Mutable blocks in id order.
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.values_mut()
    }

    /// Block ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &BlockId> {
        self.blocks.keys()
    }

    /// Number of blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the world has no blocks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    // -----------------------------------------------------------------------
    // Held block
    // -----------------------------------------------------------------------

    /// The held block, if any.
    #[inline]
    pub fn grabbed(&self) -> Option<&BlockId> {
        self.grabbed.as_ref()
    }

    /// Grab a block. Fails if another block is held or the block has
    /// something resting on it.
    pub fn grab(&mut self, id: &str) -> Result<(), StateError> {
        let block = self.block(id)?;
        if let Some(held) = &self.grabbed {
            return Err(StateError::AlreadyHolding {
                block: block.id.clone(),
                held: held.clone(),
            });
        }
        if let Some(above) = &block.below {
            return Err(StateError::NotTop {
                block: block.id.clone(),
                above: above.clone(),
            });
        }
        let id = block.id.clone();
        self.block_mut(id.as_str())?.grabbed = true;
        self.grabbed = Some(id);
        Ok(())
    }

    /// Release the held block. Fails unless `id` is the held block.
    pub fn release(&mut self, id: &str) -> Result<(), StateError> {
        match &self.grabbed {
            Some(held) if held.as_str() == id => {
                let held = held.clone();
                self.block_mut(held.as_str())?.grabbed = false;
                self.grabbed = None;
                Ok(())
            }
            _ => Err(StateError::NotHeld(BlockId::new(id))),
        }
    }

    /// Force the held slot, keeping per-block flags in sync. Used to carry
    /// the held block from one planning stage into the next.
    pub fn set_grabbed(&mut self, id: Option<BlockId>) -> Result<(), StateError> {
        if let Some(id) = &id {
            self.block(id.as_str())?;
        }
        for b in self.blocks.values_mut() {
            b.grabbed = id.as_ref() == Some(&b.id);
        }
        self.grabbed = id;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Spatial queries
    // -----------------------------------------------------------------------

    /// Location of a placed block.
    pub fn location(&self, id: &str) -> Result<Point3, StateError> {
        let b = self.block(id)?;
        b.location.ok_or_else(|| StateError::Unplaced(b.id.clone()))
    }

    /// The block occupying a cell.
    pub fn occupant(&self, p: Point3) -> Option<&Block> {
        self.blocks.values().find(|b| b.location == Some(p))
    }

    /// Whether a cell is free.
    #[inline]
    pub fn is_free(&self, p: Point3) -> bool {
        self.occupant(p).is_none()
    }

    /// Whether no block stands anywhere in the column over `p`.
    pub fn column_is_free(&self, p: Point3) -> bool {
        !self
            .blocks
            .values()
            .any(|b| b.location.is_some_and(|l| l.same_column(p)))
    }

    /// Occupancy index of all placed blocks.
    ///
    /// Fails with [`StateError::Collision`] when two blocks share a cell.
    pub fn cells(&self) -> Result<HashMap<Point3, BlockId>, StateError> {
        let mut cells = HashMap::with_capacity(self.blocks.len());
        for b in self.blocks.values() {
            let Some(p) = b.location else {
                continue;
            };
            if let Some(first) = cells.insert(p, b.id.clone()) {
                return Err(StateError::Collision {
                    first,
                    second: b.id.clone(),
                    at: p,
                });
            }
        }
        Ok(cells)
    }

    /// Walk `on_top_of` links down to the block resting on the table.
    pub fn stack_base<'a>(&'a self, id: &str) -> Result<&'a Block, StateError> {
        let mut cur = self.block(id)?;
        let mut steps = 0;
        while let Some(under) = &cur.on_top_of {
            cur = self.block(under.as_str())?;
            steps += 1;
            if steps > self.blocks.len() {
                return Err(StateError::Inconsistent {
                    block: BlockId::new(id),
                    detail: "stacking links form a cycle".into(),
                });
            }
        }
        Ok(cur)
    }

    /// Ids of the blocks resting (transitively) on `id`, bottom-up.
    pub fn stack_above(&self, id: &str) -> Result<Vec<BlockId>, StateError> {
        let mut out = Vec::new();
        let mut cur = self.block(id)?;
        while let Some(up) = &cur.below {
            if out.len() > self.blocks.len() {
                return Err(StateError::Inconsistent {
                    block: BlockId::new(id),
                    detail: "stacking links form a cycle".into(),
                });
            }
            out.push(up.clone());
            cur = self.block(up.as_str())?;
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    /// Recompute every spatial relation from block locations.
    ///
    /// All blocks must be placed. Two blocks in one cell is a fatal
    /// [`StateError::Collision`].
    pub fn relink(&mut self) -> Result<(), StateError> {
        for b in self.blocks.values() {
            if b.location.is_none() {
                return Err(StateError::Unplaced(b.id.clone()));
            }
        }
        let cells = self.cells()?;
        for b in self.blocks.values_mut() {
            b.clear_relations();
            let Some(p) = b.location else {
                continue;
            };
            b.on_top_of = cells.get(&p.beneath()).cloned();
            b.below = cells.get(&p.above()).cloned();
            for n in p.neighbors_4() {
                if let Some(id) = cells.get(&n) {
                    b.neighbors.insert(id.clone());
                }
            }
        }
        Ok(())
    }

    /// Check every between-transition invariant, returning all violations.
    pub fn check_invariants(&self) -> Vec<StateError> {
        let mut out = Vec::new();
        for b in self.blocks.values() {
            if b.location.is_none() {
                out.push(StateError::Unplaced(b.id.clone()));
            }
        }
        let cells = match self.cells() {
            Ok(cells) => cells,
            Err(e) => {
                out.push(e);
                return out;
            }
        };
        let inconsistent = |b: &Block, detail: String| StateError::Inconsistent {
            block: b.id.clone(),
            detail,
        };

        for b in self.blocks.values() {
            let Some(p) = b.location else {
                continue;
            };

            // Stacking links mirror each other and match the geometry.
            match &b.on_top_of {
                Some(under) => match self.blocks.get(under) {
                    Some(u) if u.below.as_ref() != Some(&b.id) => out.push(inconsistent(
                        b,
                        format!("rests on {under} but {under}.below is {:?}", u.below),
                    )),
                    Some(u) if u.location != Some(p.beneath()) => out.push(inconsistent(
                        b,
                        format!("rests on {under} which is not directly beneath"),
                    )),
                    None => out.push(StateError::UnknownBlock(under.clone())),
                    _ => {}
                },
                None if p.z > 0 => out.push(StateError::Floating {
                    block: b.id.clone(),
                    at: p,
                }),
                None => {}
            }
            if let Some(up) = &b.below {
                match self.blocks.get(up) {
                    Some(u) if u.on_top_of.as_ref() != Some(&b.id) => out.push(inconsistent(
                        b,
                        format!("{up} is recorded above but does not rest on it"),
                    )),
                    None => out.push(StateError::UnknownBlock(up.clone())),
                    _ => {}
                }
            }
            if cells.get(&p.beneath()) != b.on_top_of.as_ref() && p.z > 0 {
                out.push(inconsistent(b, "on_top_of disagrees with the cell beneath".into()));
            }

            // Height equals the number of blocks strictly beneath in the column.
            let beneath = cells
                .keys()
                .filter(|c| c.same_column(p) && c.z < p.z)
                .count() as i32;
            if beneath != p.z {
                out.push(inconsistent(
                    b,
                    format!("height {} but {beneath} blocks beneath", p.z),
                ));
            }

            // Side-by-side relation is symmetric, geometric and bounded.
            if b.neighbors.len() > MAX_NEIGHBORS {
                out.push(StateError::TooManyNeighbors(b.id.clone()));
            }
            for n in &b.neighbors {
                match self.blocks.get(n) {
                    Some(o) => {
                        if !o.neighbors.contains(&b.id) {
                            out.push(inconsistent(b, format!("neighbor {n} is not symmetric")));
                        }
                        if !o.location.is_some_and(|q| q.is_side_by_side(p)) {
                            out.push(inconsistent(b, format!("neighbor {n} is not side-by-side")));
                        }
                    }
                    None => out.push(StateError::UnknownBlock(n.clone())),
                }
            }
            for n in p.neighbors_4() {
                if let Some(id) = cells.get(&n) {
                    if !b.neighbors.contains(id) {
                        out.push(inconsistent(b, format!("missing neighbor {id}")));
                    }
                }
            }
        }

        // Held block bookkeeping.
        let flagged: Vec<&BlockId> = self
            .blocks
            .values()
            .filter(|b| b.grabbed)
            .map(|b| &b.id)
            .collect();
        if flagged.len() > 1 || flagged.first().copied() != self.grabbed.as_ref() {
            if let Some(first) = flagged.first() {
                out.push(StateError::Inconsistent {
                    block: (*first).clone(),
                    detail: format!("held flags {flagged:?} disagree with held slot {:?}", self.grabbed),
                });
            } else if let Some(held) = &self.grabbed {
                out.push(StateError::Inconsistent {
                    block: held.clone(),
                    detail: "held slot set but block not flagged".into(),
                });
            }
        }
        if let Some(held) = &self.grabbed {
            if let Some(b) = self.blocks.get(held) {
                if let Some(above) = &b.below {
                    out.push(StateError::NotTop {
                        block: held.clone(),
                        above: above.clone(),
                    });
                }
            }
        }
        out
    }

    /// Canonical key under the given equality policy.
    pub fn key(&self, policy: GrabPolicy) -> StateKey {
        StateKey {
            cells: self
                .blocks
                .values()
                .map(|b| (b.id.clone(), b.location))
                .collect(),
            grabbed: match policy {
                GrabPolicy::Include => self.grabbed.clone(),
                GrabPolicy::Ignore => None,
            },
        }
    }

    /// Whether two states place every block identically, under `policy`.
    pub fn same_configuration(&self, other: &State, policy: GrabPolicy) -> bool {
        self.key(policy) == other.key(policy)
    }
}

/// Dumps the state in the record format accepted by the loader.
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.blocks.values() {
            if let Some(c) = &b.color {
                writeln!(f, "(has {} color {})", b.id, c)?;
            }
            if let Some(p) = b.location {
                writeln!(f, "(has {} location {} {} {})", b.id, p.x, p.y, p.z)?;
            }
        }
        for b in self.blocks.values() {
            if let Some(under) = &b.on_top_of {
                writeln!(f, "(is {} on-top-of {})", b.id, under)?;
            }
            for n in b.neighbors.iter().filter(|n| **n > b.id) {
                writeln!(f, "(is {} side-by-side {})", b.id, n)?;
            }
        }
        Ok(())
    }
}
