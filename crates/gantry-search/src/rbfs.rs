//! Recursive best-first search.
//!
//! Memory is linear in the path length: only the current branch and the
//! sibling lists along it are alive. Each recursion is bounded by the best
//! alternative f-value found higher up; when a subtree exceeds it, its
//! smallest f-value is backed up and the next-best sibling is tried.
//!
//! An expired deadline counts as success: the branch being explored is
//! returned as the path, flagged `timed_out`.

use log::{debug, trace};

use crate::deadline::Deadline;
use crate::path::{Path, Step};
use crate::traits::{Cost, Domain, Objective, UNBOUNDED};

/// How a child's f-value relates to its parent's.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Backup {
    /// `f = g + h`.
    Additive,
    /// `f = max(g + h, parent.F)` when the parent's stored `F` was backed
    /// up above its own `g + h`; plain `g + h` otherwise.
    #[default]
    Monotone,
}

#[derive(Copy, Clone, Debug)]
pub struct RbfsConfig {
    pub deadline: Deadline,
    pub backup: Backup,
    /// Give up (as a failure) after this many expansions.
    pub max_expansions: Option<usize>,
}

impl RbfsConfig {
    pub fn new(deadline: Deadline, backup: Backup) -> Self {
        Self {
            deadline,
            backup,
            max_expansions: None,
        }
    }
}

/// Result of [`search`].
#[derive(Clone, Debug)]
pub enum RbfsOutcome<S, A> {
    Found {
        path: Path<S, A>,
        /// The f-limit in force when the goal (or the deadline) was reached.
        bound: Cost,
        timed_out: bool,
        expanded: usize,
    },
    Failure {
        /// Smallest f-value seen beyond the search frontier, or
        /// [`UNBOUNDED`] when the expansion cap was hit.
        bound: Cost,
        expanded: usize,
    },
}

impl<S, A> RbfsOutcome<S, A> {
    pub fn path(&self) -> Option<&Path<S, A>> {
        match self {
            RbfsOutcome::Found { path, .. } => Some(path),
            RbfsOutcome::Failure { .. } => None,
        }
    }

    pub fn into_path(self) -> Option<Path<S, A>> {
        match self {
            RbfsOutcome::Found { path, .. } => Some(path),
            RbfsOutcome::Failure { .. } => None,
        }
    }

    pub fn expanded(&self) -> usize {
        match self {
            RbfsOutcome::Found { expanded, .. } | RbfsOutcome::Failure { expanded, .. } => *expanded,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, RbfsOutcome::Found { timed_out: true, .. })
    }
}

struct Node<S, A> {
    state: S,
    action: Option<A>,
    g: Cost,
    /// `g + h` as computed at generation.
    static_f: Cost,
    /// Stored value; raised by backups.
    f: Cost,
    seq: u64,
}

impl<S: Clone, A: Clone> Node<S, A> {
    fn step(&self) -> Step<S, A> {
        Step {
            state: self.state.clone(),
            action: self.action.clone(),
            g: self.g,
        }
    }
}

struct Search<'a, D: Domain, O> {
    domain: &'a D,
    objective: &'a O,
    cfg: &'a RbfsConfig,
    seq: u64,
    expanded: usize,
    timed_out: bool,
    exhausted: bool,
    bound: Cost,
}

/// Run RBFS from `start`.
///
/// Domain errors abort the search and are returned as-is.
pub fn search<D, O>(
    domain: &D,
    objective: &O,
    start: D::State,
    cfg: &RbfsConfig,
) -> Result<RbfsOutcome<D::State, D::Action>, D::Error>
where
    D: Domain,
    O: Objective<D::State>,
{
    let h = objective.estimate(&start);
    let root = Node {
        state: start,
        action: None,
        g: 0,
        static_f: h,
        f: h,
        seq: 0,
    };
    let mut s = Search {
        domain,
        objective,
        cfg,
        seq: 1,
        expanded: 0,
        timed_out: false,
        exhausted: false,
        bound: UNBOUNDED,
    };
    debug!("rbfs: start h={h} backup={:?}", cfg.backup);
    let outcome = match s.recurse(&root, UNBOUNDED)? {
        Ok(mut steps) => {
            steps.reverse();
            RbfsOutcome::Found {
                path: Path::from_steps(steps),
                bound: s.bound,
                timed_out: s.timed_out,
                expanded: s.expanded,
            }
        }
        Err(bound) => RbfsOutcome::Failure {
            bound,
            expanded: s.expanded,
        },
    };
    debug!(
        "rbfs: done found={} timed_out={} exhausted={} expanded={}",
        outcome.path().is_some(),
        outcome.timed_out(),
        s.exhausted,
        outcome.expanded()
    );
    Ok(outcome)
}

impl<D, O> Search<'_, D, O>
where
    D: Domain,
    O: Objective<D::State>,
{
    /// Returns the goal branch (deepest step first), or the backed-up
    /// f-value of this subtree.
    #[allow(clippy::type_complexity)]
    fn recurse(
        &mut self,
        node: &Node<D::State, D::Action>,
        f_max: Cost,
    ) -> Result<Result<Vec<Step<D::State, D::Action>>, Cost>, D::Error> {
        if self.objective.is_goal(&node.state) {
            self.bound = f_max;
            return Ok(Ok(vec![node.step()]));
        }
        if self.cfg.deadline.expired() {
            self.timed_out = true;
            self.bound = f_max;
            return Ok(Ok(vec![node.step()]));
        }

        if self.cfg.max_expansions.is_some_and(|m| self.expanded >= m) {
            self.exhausted = true;
            return Ok(Err(UNBOUNDED));
        }
        self.expanded += 1;
        let mut actions = Vec::new();
        self.domain.actions(&node.state, &mut actions)?;
        let mut children = Vec::with_capacity(actions.len());
        for action in actions {
            let (state, cost) = self.domain.apply(&node.state, &action)?;
            let g = node.g.saturating_add(cost);
            let static_f = g.saturating_add(self.objective.estimate(&state));
            let inherit = self.cfg.backup == Backup::Monotone && node.f > node.static_f;
            let f = if inherit { static_f.max(node.f) } else { static_f };
            children.push(Node {
                state,
                action: Some(action),
                g,
                static_f,
                f,
                seq: self.seq,
            });
            self.seq += 1;
        }
        trace!(
            "rbfs: expand g={} f={} f_max={f_max} children={}",
            node.g,
            node.f,
            children.len()
        );
        if children.is_empty() {
            return Ok(Err(UNBOUNDED));
        }

        loop {
            children.sort_by_key(|c| (c.f, c.seq));
            let best_f = children[0].f;
            if best_f > f_max || best_f == UNBOUNDED {
                return Ok(Err(best_f));
            }
            let alternative = children.get(1).map_or(UNBOUNDED, |c| c.f);
            match self.recurse(&children[0], f_max.min(alternative))? {
                Ok(mut steps) => {
                    steps.push(node.step());
                    return Ok(Ok(steps));
                }
                Err(_) if self.exhausted => return Ok(Err(UNBOUNDED)),
                Err(backed_up) => children[0].f = backed_up,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Walk, WalkTo};
    use std::time::Duration;

    fn cfg(backup: Backup) -> RbfsConfig {
        RbfsConfig::new(Deadline::unlimited(), backup)
    }

    #[test]
    fn finds_optimal_path_on_open_grid() {
        let walk = Walk::open(6, 6);
        let to = WalkTo((4, 3));
        for backup in [Backup::Additive, Backup::Monotone] {
            let out = search(&walk, &to, (0, 0), &cfg(backup)).unwrap();
            let path = out.path().unwrap();
            assert_eq!(path.cost(), 7);
            assert_eq!(path.final_state(), Some(&(4, 3)));
            assert_eq!(path.states().next(), Some(&(0, 0)));
            assert!(!out.timed_out());
        }
    }

    #[test]
    fn goes_around_walls() {
        let walk = Walk::open(5, 5).with_walls(&[(1, 0), (1, 1), (1, 2), (1, 3)]);
        let out = search(&walk, &WalkTo((2, 0)), (0, 0), &cfg(Backup::Monotone)).unwrap();
        assert_eq!(out.path().unwrap().cost(), 10);
    }

    #[test]
    fn boxed_in_start_fails() {
        let walk = Walk::open(3, 3).with_walls(&[(1, 0), (0, 1)]);
        let out = search(&walk, &WalkTo((2, 2)), (0, 0), &cfg(Backup::Monotone)).unwrap();
        assert!(matches!(out, RbfsOutcome::Failure { bound: UNBOUNDED, .. }));
    }

    #[test]
    fn start_is_goal() {
        let walk = Walk::open(3, 3);
        let out = search(&walk, &WalkTo((1, 1)), (1, 1), &cfg(Backup::Additive)).unwrap();
        let path = out.path().unwrap();
        assert!(path.is_empty());
        assert_eq!(out.expanded(), 0);
    }

    #[test]
    fn expired_deadline_returns_start() {
        let walk = Walk::open(4, 4);
        let c = RbfsConfig::new(Deadline::after(Duration::ZERO), Backup::Monotone);
        let out = search(&walk, &WalkTo((3, 3)), (0, 0), &c).unwrap();
        assert!(out.timed_out());
        let path = out.path().unwrap();
        assert_eq!(path.steps().len(), 1);
        assert_eq!(path.steps()[0].g, 0);
        assert!(path.steps()[0].action.is_none());
    }

    /// Overestimates at the start cell only.
    struct InflatedStart(WalkTo, (i32, i32));

    impl Objective<(i32, i32)> for InflatedStart {
        fn is_goal(&self, s: &(i32, i32)) -> bool {
            self.0.is_goal(s)
        }

        fn estimate(&self, s: &(i32, i32)) -> Cost {
            if *s == self.1 { 100 } else { self.0.estimate(s) }
        }
    }

    #[test]
    fn monotone_does_not_inherit_static_root_value() {
        let walk = Walk::open(6, 6);
        let to = InflatedStart(WalkTo((4, 3)), (0, 0));
        let out = search(&walk, &to, (0, 0), &cfg(Backup::Monotone)).unwrap();
        assert_eq!(out.path().unwrap().cost(), 7);
    }

    #[test]
    fn expansion_cap_fails() {
        let walk = Walk::open(20, 20);
        let mut c = cfg(Backup::Monotone);
        c.max_expansions = Some(3);
        let out = search(&walk, &WalkTo((19, 19)), (0, 0), &c).unwrap();
        assert!(matches!(out, RbfsOutcome::Failure { bound: UNBOUNDED, expanded: 3 }));
    }

    #[test]
    fn deterministic() {
        let walk = Walk::open(5, 5).with_walls(&[(2, 1), (2, 2)]);
        let a = search(&walk, &WalkTo((4, 2)), (0, 2), &cfg(Backup::Monotone)).unwrap();
        let b = search(&walk, &WalkTo((4, 2)), (0, 2), &cfg(Backup::Monotone)).unwrap();
        assert_eq!(a.path(), b.path());
        assert_eq!(a.expanded(), b.expanded());
    }
}
