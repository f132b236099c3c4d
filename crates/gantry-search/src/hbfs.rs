//! Heap-based best-first search (A*) with explicit open and closed sets.
//!
//! The queue uses lazy deletion: an entry whose key has left the frontier
//! is discarded on pop. A frontier state reached again through a cheaper
//! path is pushed a second time rather than decreased in place.

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::deadline::Deadline;
use crate::path::{Path, Step};
use crate::queue::MinQueue;
use crate::traits::{Cost, Keyed, Objective};

#[derive(Copy, Clone, Debug)]
pub struct HbfsConfig {
    pub deadline: Deadline,
    /// Give up, with no path, after this many expansions.
    pub max_expansions: Option<usize>,
}

impl HbfsConfig {
    pub fn new(deadline: Deadline) -> Self {
        Self {
            deadline,
            max_expansions: None,
        }
    }
}

/// Result of [`search`].
#[derive(Clone, Debug)]
pub struct HbfsOutcome<S, A> {
    /// Path to the goal, or to the last popped state on timeout. `None`
    /// when the reachable space or the expansion cap was exhausted without
    /// meeting the goal.
    pub path: Option<Path<S, A>>,
    /// Queue pushes.
    pub visited: usize,
    /// Valid pops.
    pub expanded: usize,
    pub timed_out: bool,
}

impl<S, A> HbfsOutcome<S, A> {
    pub fn final_state(&self) -> Option<&S> {
        self.path.as_ref().and_then(|p| p.final_state())
    }
}

struct Record<K, S, A> {
    state: S,
    g: Cost,
    parent: Option<(K, A)>,
}

/// Run A* from `start`.
pub fn search<D, O>(
    domain: &D,
    objective: &O,
    start: D::State,
    cfg: &HbfsConfig,
) -> Result<HbfsOutcome<D::State, D::Action>, D::Error>
where
    D: Keyed,
    O: Objective<D::State>,
{
    let mut records: HashMap<D::Key, Record<D::Key, D::State, D::Action>> = HashMap::new();
    let mut frontier: HashSet<D::Key> = HashSet::new();
    let mut settled: HashSet<D::Key> = HashSet::new();
    let mut queue = MinQueue::new();

    let start_key = domain.key(&start);
    let h = objective.estimate(&start);
    queue.push(start_key.clone(), h);
    frontier.insert(start_key.clone());
    records.insert(
        start_key,
        Record {
            state: start,
            g: 0,
            parent: None,
        },
    );
    let mut visited = 1;
    let mut expanded = 0;
    let mut actions = Vec::new();
    debug!("hbfs: start h={h}");

    while let Some((key, f)) = queue.pop_with_rank() {
        if !frontier.remove(&key) {
            continue;
        }
        settled.insert(key.clone());
        expanded += 1;

        let Some(current) = records.get(&key) else {
            continue;
        };
        if objective.is_goal(&current.state) {
            debug!("hbfs: goal g={} visited={visited} expanded={expanded}", current.g);
            return Ok(HbfsOutcome {
                path: Some(backtrace(&records, key)),
                visited,
                expanded,
                timed_out: false,
            });
        }
        if cfg.deadline.expired() {
            warn!("hbfs: deadline expired after {expanded} expansions");
            return Ok(HbfsOutcome {
                path: Some(backtrace(&records, key)),
                visited,
                expanded,
                timed_out: true,
            });
        }

        if cfg.max_expansions.is_some_and(|m| expanded > m) {
            debug!("hbfs: expansion cap reached visited={visited}");
            return Ok(HbfsOutcome {
                path: None,
                visited,
                expanded: expanded - 1,
                timed_out: false,
            });
        }

        let g = current.g;
        trace!("hbfs: pop f={f} g={g} queue={}", queue.len());
        actions.clear();
        domain.actions(&current.state, &mut actions)?;
        let mut successors = Vec::with_capacity(actions.len());
        for action in actions.drain(..) {
            let (state, cost) = domain.apply(&current.state, &action)?;
            successors.push((action, state, g.saturating_add(cost)));
        }

        for (action, state, g2) in successors {
            let k2 = domain.key(&state);
            if settled.contains(&k2) {
                continue;
            }
            if frontier.contains(&k2) && records.get(&k2).is_some_and(|r| r.g <= g2) {
                continue;
            }
            let f2 = g2.saturating_add(objective.estimate(&state));
            queue.push(k2.clone(), f2);
            visited += 1;
            frontier.insert(k2.clone());
            records.insert(
                k2,
                Record {
                    state,
                    g: g2,
                    parent: Some((key.clone(), action)),
                },
            );
        }
    }

    debug!("hbfs: exhausted visited={visited} expanded={expanded}");
    Ok(HbfsOutcome {
        path: None,
        visited,
        expanded,
        timed_out: false,
    })
}

fn backtrace<K, S, A>(records: &HashMap<K, Record<K, S, A>>, mut key: K) -> Path<S, A>
where
    K: std::hash::Hash + Eq + Clone,
    S: Clone,
    A: Clone,
{
    let mut steps = Vec::new();
    while let Some(r) = records.get(&key) {
        let action = r.parent.as_ref().map(|(_, a)| a.clone());
        steps.push(Step {
            state: r.state.clone(),
            action,
            g: r.g,
        });
        match &r.parent {
            Some((p, _)) => key = p.clone(),
            None => break,
        }
    }
    steps.reverse();
    Path::from_steps(steps)
}
