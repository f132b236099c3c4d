//! Action generation and the transition function.
//!
//! [`Rules::apply`] never mutates its input: it clones the state, changes
//! the copy and recomputes every spatial relation with
//! [`State::relink`].

use std::collections::{HashSet, VecDeque};

use gantry_core::geom::{OFFSETS_26, PLANAR_8};
use gantry_core::{Action, Block, BlockId, Board, Point3, State, StateError, Support};
use gantry_search::Cost;

use crate::config::StackCost;

/// The physics of the blocks world on a given board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rules {
    pub board: Board,
    pub stack_cost: StackCost,
}

impl Rules {
    pub fn new(board: Board, stack_cost: StackCost) -> Self {
        Self { board, stack_cost }
    }

    // -----------------------------------------------------------------------
    // Route tier
    // -----------------------------------------------------------------------

    /// Coarse actions: whole-stack slides and pick-and-place stacks.
    ///
    /// `goal` contributes extra table destinations: a block may be stacked
    /// straight onto its own goal table cell.
    ///
    /// Only destinations the move tier can realise are offered: a stack
    /// must end in a cell of [`Rules::carry_reach`], a slide in a cell of
    /// [`Rules::slide_reach`].
    pub fn route_actions(&self, state: &State, goal: &State, buf: &mut Vec<Action>) {
        let tops: Vec<&Block> = state.blocks().filter(|b| b.is_top()).collect();
        let held = state.grabbed();

        for b in &tops {
            let Some(from) = b.location else {
                continue;
            };
            let reach = self.carry_reach(state, &b.id);

            // Onto another top block.
            for other in &tops {
                if other.id == b.id || held == Some(&other.id) {
                    continue;
                }
                let Some(under) = other.location else {
                    continue;
                };
                if b.on_top_of.as_ref() == Some(&other.id) || !reach.contains(&under.above()) {
                    continue;
                }
                buf.push(Action::Stack {
                    block: b.id.clone(),
                    onto: Support::Block(other.id.clone()),
                    to: under.above(),
                });
            }

            // Onto the table.
            let mut cells: Vec<Point3> = Vec::new();
            if from.z > 0 {
                cells.extend(self.nearest_free_ring(state, from, &reach));
            }
            if let Some(p) = goal.get(b.id.as_str()).and_then(|g| g.location) {
                if p.z == 0 && p != from && reach.contains(&p) && state.column_is_free(p) && !cells.contains(&p) {
                    cells.push(p);
                }
            }
            for to in cells {
                buf.push(Action::Stack {
                    block: b.id.clone(),
                    onto: Support::Table,
                    to,
                });
            }
        }

        if held.is_some() {
            return;
        }
        for b in state.blocks().filter(|b| b.is_on_table()) {
            let Some(from) = b.location else {
                continue;
            };
            let reach = self.slide_reach(state, from);
            let mut targets: Vec<Point3> = Vec::new();

            // Beside another table block that has room for a neighbor.
            for anchor in state.blocks().filter(|a| a.is_on_table() && a.id != b.id) {
                if anchor.neighbors.len() >= gantry_core::MAX_NEIGHBORS || anchor.neighbors.contains(&b.id) {
                    continue;
                }
                let Some(at) = anchor.location else {
                    continue;
                };
                for p in at.neighbors_4() {
                    if p != from && reach.contains(&p) && !targets.contains(&p) {
                        targets.push(p);
                    }
                }
            }

            // Single steps.
            for d in PLANAR_8 {
                let p = from + d;
                if self.slide_target_ok(state, p) && !targets.contains(&p) {
                    targets.push(p);
                }
            }

            targets.sort();
            for p in targets {
                buf.push(Action::Slide {
                    block: b.id.clone(),
                    dx: p.x - from.x,
                    dy: p.y - from.y,
                });
            }
        }
    }

    /// Free, reachable table cells on the smallest Chebyshev ring around
    /// `from` that has any.
    fn nearest_free_ring(&self, state: &State, from: Point3, reach: &HashSet<Point3>) -> Vec<Point3> {
        let radius = self.board.width().max(self.board.depth());
        for r in 1..=radius {
            let ring: Vec<Point3> = self
                .board
                .ring(from, r)
                .filter(|p| reach.contains(p) && state.column_is_free(*p))
                .collect();
            if !ring.is_empty() {
                return ring;
            }
        }
        Vec::new()
    }

    fn slide_target_ok(&self, state: &State, p: Point3) -> bool {
        self.board.contains(p) && state.column_is_free(p)
    }

    /// Cells the top block `id` can be carried to from where it stands.
    ///
    /// A carry moves one cell at a time and every cell on the way must be
    /// free, on the board, and rest on the table or on another block.
    pub fn carry_reach(&self, state: &State, id: &BlockId) -> HashSet<Point3> {
        let mut seen = HashSet::new();
        let (Ok(cells), Some(from)) = (state.cells(), state.get(id.as_str()).and_then(|b| b.location)) else {
            return seen;
        };
        let supported = |p: Point3| {
            self.board.contains(p)
                && !cells.contains_key(&p)
                && (p.z == 0 || cells.get(&p.beneath()).is_some_and(|under| under != id))
        };
        seen.insert(from);
        let mut queue = VecDeque::from([from]);
        while let Some(p) = queue.pop_front() {
            for d in OFFSETS_26 {
                let q = p + d;
                if supported(q) && seen.insert(q) {
                    queue.push_back(q);
                }
            }
        }
        seen
    }

    /// Table cells a stack standing at `from` can reach by unit slides.
    pub fn slide_reach(&self, state: &State, from: Point3) -> HashSet<Point3> {
        let from = from.on_table();
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);
        while let Some(p) = queue.pop_front() {
            for d in PLANAR_8 {
                let q = p + d;
                if self.slide_target_ok(state, q) && seen.insert(q) {
                    queue.push_back(q);
                }
            }
        }
        seen
    }

    // -----------------------------------------------------------------------
    // Move tier
    // -----------------------------------------------------------------------

    /// Arm primitives: grab, release, carry by a unit offset, unit slides.
    pub fn move_actions(&self, state: &State, buf: &mut Vec<Action>) {
        if let Some(held) = state.grabbed() {
            if let Some(from) = state.get(held.as_str()).and_then(|b| b.location) {
                for d in OFFSETS_26 {
                    if self.carry_target_ok(state, held, from + d) {
                        buf.push(Action::Carry {
                            block: held.clone(),
                            delta: d,
                        });
                    }
                }
            }
            buf.push(Action::Release(held.clone()));
            return;
        }

        for b in state.blocks().filter(|b| b.is_top()) {
            buf.push(Action::Grab(b.id.clone()));
        }
        for b in state.blocks().filter(|b| b.is_on_table()) {
            let Some(from) = b.location else {
                continue;
            };
            for d in PLANAR_8 {
                if self.slide_target_ok(state, from + d) {
                    buf.push(Action::Slide {
                        block: b.id.clone(),
                        dx: d.x,
                        dy: d.y,
                    });
                }
            }
        }
    }

    fn carry_target_ok(&self, state: &State, held: &BlockId, p: Point3) -> bool {
        if !self.board.contains(p) || !state.is_free(p) {
            return false;
        }
        p.z == 0 || state.occupant(p.beneath()).is_some_and(|b| &b.id != held)
    }

    // -----------------------------------------------------------------------
    // Transition
    // -----------------------------------------------------------------------

    /// Apply `action` to a copy of `state`.
    pub fn apply(&self, state: &State, action: &Action) -> Result<(State, Cost), StateError> {
        let mut next = state.clone();
        let cost = match action {
            Action::Grab(id) => {
                next.grab(id.as_str())?;
                1
            }
            Action::Release(id) => {
                next.release(id.as_str())?;
                1
            }
            Action::Stack { block, onto, to } => self.stack(&mut next, block, onto, *to)?,
            Action::Slide { block, dx, dy } => {
                self.slide(&mut next, block, *dx, *dy)?;
                1
            }
            Action::Carry { block, delta } => {
                self.carry(&mut next, block, *delta)?;
                1
            }
        };
        Ok((next, cost))
    }

    fn stack(&self, s: &mut State, id: &BlockId, onto: &Support, to: Point3) -> Result<Cost, StateError> {
        let b = s.block(id.as_str())?;
        if let Some(above) = &b.below {
            return Err(StateError::NotTop {
                block: id.clone(),
                above: above.clone(),
            });
        }
        let from = s.location(id.as_str())?;
        match onto {
            Support::Table => {
                if to.z != 0 {
                    return Err(StateError::Unsupported { block: id.clone(), at: to });
                }
            }
            Support::Block(under) => {
                if under == id {
                    return Err(StateError::OntoSelf { block: id.clone() });
                }
                let u = s.block(under.as_str())?;
                if let Some(above) = u.below.as_ref().filter(|a| *a != id) {
                    return Err(StateError::NotTop {
                        block: under.clone(),
                        above: above.clone(),
                    });
                }
                if u.grabbed || u.location.map(Point3::above) != Some(to) {
                    return Err(StateError::Unsupported { block: id.clone(), at: to });
                }
            }
        }
        self.place(s, id, to)?;
        Ok(match self.stack_cost {
            StackCost::Unit => 1,
            StackCost::HeightDelta => (to.z - from.z).unsigned_abs() + 1,
        })
    }

    fn slide(&self, s: &mut State, id: &BlockId, dx: i32, dy: i32) -> Result<(), StateError> {
        let from = s.location(id.as_str())?;
        if from.z != 0 {
            return Err(StateError::NotOnTable {
                block: id.clone(),
                height: from.z,
            });
        }
        if let Some(held) = s.grabbed() {
            return Err(StateError::AlreadyHolding {
                block: id.clone(),
                held: held.clone(),
            });
        }
        let to = from.shift(dx, dy, 0);
        if !self.board.contains(to) {
            return Err(StateError::OutOfBounds { block: id.clone(), at: to });
        }
        if !s.column_is_free(to) {
            let first = s
                .blocks()
                .find(|b| b.location.is_some_and(|l| l.same_column(to)))
                .map_or_else(|| id.clone(), |b| b.id.clone());
            return Err(StateError::Collision {
                first,
                second: id.clone(),
                at: to,
            });
        }
        let mut column = vec![id.clone()];
        column.extend(s.stack_above(id.as_str())?);
        for member in column {
            let b = s.block_mut(member.as_str())?;
            b.location = b.location.map(|p| p.shift(dx, dy, 0));
        }
        s.relink()
    }

    fn carry(&self, s: &mut State, id: &BlockId, delta: Point3) -> Result<(), StateError> {
        if s.grabbed() != Some(id) {
            return Err(StateError::NotHeld(id.clone()));
        }
        let from = s.location(id.as_str())?;
        let to = from + delta;
        if delta.linf() != 1 {
            return Err(StateError::Unsupported { block: id.clone(), at: to });
        }
        if to.z != 0 && !s.occupant(to.beneath()).is_some_and(|b| &b.id != id) {
            return Err(StateError::Unsupported { block: id.clone(), at: to });
        }
        self.place(s, id, to)
    }

    /// Move a single block to `to` and relink.
    fn place(&self, s: &mut State, id: &BlockId, to: Point3) -> Result<(), StateError> {
        if !self.board.contains(to) {
            return Err(StateError::OutOfBounds { block: id.clone(), at: to });
        }
        if let Some(other) = s.occupant(to).filter(|o| &o.id != id) {
            return Err(StateError::Collision {
                first: other.id.clone(),
                second: id.clone(),
                at: to,
            });
        }
        s.block_mut(id.as_str())?.location = Some(to);
        s.relink()
    }
}
