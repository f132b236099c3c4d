//! Goal-distance estimates.
//!
//! None of these is admissible in general: a slide moves a whole stack, so
//! one action can fix several displacements at once. They are meant to
//! steer the search, not to certify optimality.

use gantry_core::{BlockId, Point3, State, chebyshev, manhattan};
use gantry_search::Cost;

use crate::config::{HeuristicConfig, HeuristicKind, Metric};

/// Counts relational mismatches against the goal: one for a misplaced
/// block, one more for a table block missing a goal neighbour.
#[derive(Copy, Clone, Debug)]
pub struct Mismatch<'g> {
    goal: &'g State,
    scale: Cost,
}

impl<'g> Mismatch<'g> {
    pub fn new(goal: &'g State, scale: Cost) -> Self {
        Self { goal, scale }
    }

    pub fn estimate(&self, state: &State) -> Cost {
        let mut n: Cost = 0;
        for g in self.goal.blocks() {
            let Some(b) = state.get(g.id.as_str()) else {
                continue;
            };
            let wrong_height = g.location.is_some_and(|want| b.height() != Some(want.z));
            let wrong_support = g.on_top_of.is_some() && b.on_top_of != g.on_top_of;
            if wrong_height || wrong_support {
                n += 1;
            }
            if g.location.is_some_and(|want| want.z == 0) && !g.neighbors.is_subset(&b.neighbors) {
                n += 1;
            }
        }
        n.saturating_mul(self.scale)
    }
}

/// Sums per-block displacement from known or inferred goal locations.
#[derive(Copy, Clone, Debug)]
pub struct Distance<'g> {
    goal: &'g State,
    metric: Metric,
    overhead: Cost,
}

impl<'g> Distance<'g> {
    pub fn new(goal: &'g State, metric: Metric, overhead: Cost) -> Self {
        Self {
            goal,
            metric,
            overhead,
        }
    }

    pub fn estimate(&self, state: &State) -> Cost {
        let mut total: Cost = 0;
        for g in self.goal.blocks() {
            let Some(cur) = state.get(g.id.as_str()).and_then(|b| b.location) else {
                continue;
            };
            let Some(d) = self
                .targets(g.id.as_str(), state)
                .into_iter()
                .map(|t| self.measure(cur, t))
                .min()
            else {
                continue;
            };
            if d > 0 {
                total = total.saturating_add(d).saturating_add(self.overhead);
            }
        }
        total
    }

    fn measure(&self, a: Point3, b: Point3) -> Cost {
        let d = match self.metric {
            Metric::Manhattan => manhattan(a, b),
            Metric::Chebyshev => chebyshev(a, b),
            Metric::Unit => i32::from(a != b),
        };
        d.unsigned_abs()
    }

    /// Where the block should end up. An unspecified goal location is
    /// inferred from the block it rests on, the block resting on it, or
    /// the cells beside a required neighbor.
    fn targets(&self, id: &str, state: &State) -> Vec<Point3> {
        let Some(g) = self.goal.get(id) else {
            return Vec::new();
        };
        if let Some(p) = g.location {
            return vec![p];
        }
        let locate = |other: &BlockId| {
            self.goal
                .get(other.as_str())
                .and_then(|b| b.location)
                .or_else(|| state.get(other.as_str()).and_then(|b| b.location))
        };
        if let Some(p) = g.on_top_of.as_ref().and_then(locate) {
            return vec![p.above()];
        }
        if let Some(p) = g.below.as_ref().and_then(locate).filter(|p| p.z > 0) {
            return vec![p.beneath()];
        }
        g.neighbors
            .iter()
            .find_map(locate)
            .map(|p| p.neighbors_4().to_vec())
            .unwrap_or_default()
    }
}

/// Distance plus mismatch.
#[derive(Copy, Clone, Debug)]
pub struct Combined<'g> {
    pub distance: Distance<'g>,
    pub mismatch: Mismatch<'g>,
}

impl Combined<'_> {
    pub fn estimate(&self, state: &State) -> Cost {
        self.distance
            .estimate(state)
            .saturating_add(self.mismatch.estimate(state))
    }
}

/// A configured estimate.
#[derive(Copy, Clone, Debug)]
pub enum Heuristic<'g> {
    Mismatch(Mismatch<'g>),
    Distance(Distance<'g>),
    Combined(Combined<'g>),
}

impl<'g> Heuristic<'g> {
    pub fn new(goal: &'g State, cfg: &HeuristicConfig) -> Self {
        let mismatch = Mismatch::new(goal, cfg.scale);
        let distance = Distance::new(goal, cfg.metric, cfg.overhead);
        match cfg.kind {
            HeuristicKind::Mismatch => Heuristic::Mismatch(mismatch),
            HeuristicKind::Distance => Heuristic::Distance(distance),
            HeuristicKind::Combined => Heuristic::Combined(Combined { distance, mismatch }),
        }
    }

    pub fn estimate(&self, state: &State) -> Cost {
        match self {
            Heuristic::Mismatch(h) => h.estimate(state),
            Heuristic::Distance(h) => h.estimate(state),
            Heuristic::Combined(h) => h.estimate(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::Block;

    fn state() -> State {
        State::from_placed([
            Block::new("a").at(Point3::new(0, 0, 0)),
            Block::new("b").at(Point3::new(0, 0, 1)),
            Block::new("c").at(Point3::new(4, 0, 0)),
        ])
        .unwrap()
    }

    #[test]
    fn zero_at_goal() {
        let s = state();
        let cfg = HeuristicConfig::moves();
        assert_eq!(Heuristic::new(&s, &cfg).estimate(&s), 0);
        assert_eq!(Heuristic::new(&s, &HeuristicConfig::route()).estimate(&s), 0);
    }

    #[test]
    fn mismatch_counts_height_and_support() {
        let s = state();
        let mut goal = State::new();
        let mut b = Block::new("b").at(Point3::new(4, 0, 1));
        b.on_top_of = Some(BlockId::new("c"));
        goal.insert(b);
        goal.insert(Block::new("c").at(Point3::new(4, 0, 1)));
        assert_eq!(Mismatch::new(&goal, 1).estimate(&s), 2);
        assert_eq!(Mismatch::new(&goal, 3).estimate(&s), 6);
    }

    #[test]
    fn mismatch_counts_a_block_once() {
        let s = state();
        let mut goal = State::new();
        let mut a = Block::new("a").at(Point3::new(4, 0, 1));
        a.on_top_of = Some(BlockId::new("c"));
        goal.insert(a);
        assert_eq!(Mismatch::new(&goal, 1).estimate(&s), 1);
    }

    #[test]
    fn distance_infers_from_support() {
        let s = state();
        let mut goal = State::new();
        let mut a = Block::new("a");
        a.on_top_of = Some(BlockId::new("c"));
        goal.insert(a);
        // a belongs at (4, 0, 1): Chebyshev 4 plus overhead.
        assert_eq!(Distance::new(&goal, Metric::Chebyshev, 1).estimate(&s), 5);
        assert_eq!(Distance::new(&goal, Metric::Manhattan, 0).estimate(&s), 5);
        assert_eq!(Distance::new(&goal, Metric::Unit, 0).estimate(&s), 1);
    }

    #[test]
    fn distance_infers_from_neighbor() {
        let s = state();
        let mut goal = State::new();
        let mut a = Block::new("a");
        a.neighbors.insert(BlockId::new("c"));
        goal.insert(a);
        assert_eq!(Distance::new(&goal, Metric::Chebyshev, 0).estimate(&s), 3);
    }
}
