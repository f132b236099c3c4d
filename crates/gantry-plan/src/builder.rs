//! Turn parsed descriptions into an initial [`State`] and a goal.
//!
//! The initial world must be complete: every block ends up with a location,
//! either given or inferred along `on-top-of` chains. The goal may be
//! partial and may name wildcard blocks, which are bound here to concrete
//! blocks of the initial world.

use log::{debug, warn};

use gantry_core::{Block, BlockId, Board, Description, Point3, Record, State, StateError, manhattan};

use crate::error::BuildError;

/// Options for [`build_goal`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildOptions {
    /// Fail instead of picking the closest candidate when a wildcard could
    /// stand for several blocks.
    pub strict_wildcards: bool,
    /// Goal locations must lie on this board.
    pub board: Board,
}

/// Build a complete, relinked initial state.
pub fn build_initial(desc: &Description, board: &Board) -> Result<State, BuildError> {
    for (line, text) in &desc.skipped {
        warn!("initial state line {line}: skipping `{text}`");
    }
    let mut state = collect(desc)?;
    for (a, b) in side_by_side(desc) {
        let (Some(pa), Some(pb)) = (location(&state, &a), location(&state, &b)) else {
            continue;
        };
        if !pa.is_side_by_side(pb) {
            return Err(BuildError::ConflictingRelation {
                block: a,
                detail: format!("side-by-side {b} but at {pa} and {pb}"),
            });
        }
    }
    for b in state.blocks() {
        match b.location {
            None => return Err(BuildError::Unplaceable(b.id.clone())),
            Some(p) if !board.contains(p) => {
                return Err(StateError::OutOfBounds {
                    block: b.id.clone(),
                    at: p,
                }
                .into());
            }
            Some(_) => {}
        }
    }
    state.relink()?;
    if let Some(e) = state.check_invariants().into_iter().next() {
        return Err(e.into());
    }
    debug!("initial state: {} blocks", state.len());
    Ok(state)
}

/// Build a goal against `initial`, binding wildcards.
pub fn build_goal(desc: &Description, initial: &State, opts: &BuildOptions) -> Result<State, BuildError> {
    for (line, text) in &desc.skipped {
        warn!("goal state line {line}: skipping `{text}`");
    }
    let mut goal = collect(desc)?;

    let ids: Vec<BlockId> = goal.ids().cloned().collect();
    for id in &ids {
        if id.is_wildcard() {
            continue;
        }
        let Some(orig) = initial.get(id.as_str()) else {
            return Err(BuildError::UnknownGoalBlock(id.clone()));
        };
        let b = goal.block_mut(id.as_str())?;
        if let Some(want) = b.color.as_ref().filter(|c| orig.color.as_ref() != Some(*c)) {
            return Err(BuildError::ColorMismatch {
                block: id.clone(),
                initial: orig.color.clone().unwrap_or_else(|| "uncolored".into()),
                goal: want.clone(),
            });
        }
        b.color = orig.color.clone();
    }

    for (upper, lower) in on_top_of(desc) {
        set_support(&mut goal, &upper, &lower)?;
    }
    for (a, b) in side_by_side(desc) {
        for (x, y) in [(&a, &b), (&b, &a)] {
            if !goal.block_mut(x.as_str())?.add_neighbor(y.clone()) {
                return Err(StateError::TooManyNeighbors(x.clone()).into());
            }
        }
    }

    for w in ids.iter().filter(|id| id.is_wildcard()) {
        let bound = bind_wildcard(&goal, initial, w, opts)?;
        debug!("wildcard {w} bound to {bound}");
        merge(&mut goal, w, &bound, initial)?;
    }
    check_goal(&goal, initial.len(), &opts.board)?;
    Ok(goal)
}

/// Structural checks on a goal: distinct locations, relations consistent
/// with any given locations, and no support cycles.
pub fn check_goal(goal: &State, block_count: usize, board: &Board) -> Result<(), BuildError> {
    let mut seen: Vec<(Point3, &BlockId)> = Vec::new();
    for b in goal.blocks() {
        if let Some(p) = b.location {
            if !board.contains(p) {
                return Err(StateError::OutOfBounds {
                    block: b.id.clone(),
                    at: p,
                }
                .into());
            }
            if let Some((_, other)) = seen.iter().find(|(q, _)| *q == p) {
                return Err(StateError::Collision {
                    first: (*other).clone(),
                    second: b.id.clone(),
                    at: p,
                }
                .into());
            }
            seen.push((p, &b.id));
        }
        if let Some(under) = &b.on_top_of {
            if under == &b.id {
                return Err(StateError::OntoSelf { block: b.id.clone() }.into());
            }
            let pu = goal.get(under.as_str()).and_then(|u| u.location);
            if let (Some(p), Some(pu)) = (b.location, pu) {
                if p != pu.above() {
                    return Err(BuildError::ConflictingRelation {
                        block: b.id.clone(),
                        detail: format!("on-top-of {under} but at {p} over {pu}"),
                    });
                }
            }
        }
        for n in &b.neighbors {
            let pn = goal.get(n.as_str()).and_then(|o| o.location);
            if let (Some(p), Some(pn)) = (b.location, pn) {
                if !p.is_side_by_side(pn) {
                    return Err(BuildError::ConflictingRelation {
                        block: b.id.clone(),
                        detail: format!("side-by-side {n} but at {p} and {pn}"),
                    });
                }
            }
        }
        if b.location.is_some_and(|p| p.z as usize >= block_count.max(1)) {
            return Err(BuildError::InvalidGoal(format!(
                "{} is higher than {block_count} blocks can stack",
                b.id
            )));
        }
        let mut cur = b;
        let mut depth = 0;
        while let Some(next) = cur.on_top_of.as_ref().and_then(|u| goal.get(u.as_str())) {
            depth += 1;
            if depth > goal.len() {
                return Err(BuildError::InvalidGoal(format!("{} rests on a support cycle", b.id)));
            }
            cur = next;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn on_top_of(desc: &Description) -> Vec<(BlockId, BlockId)> {
    desc.iter()
        .filter_map(|r| match r {
            Record::OnTopOf { upper, lower } => Some((upper.clone(), lower.clone())),
            _ => None,
        })
        .collect()
}

fn side_by_side(desc: &Description) -> Vec<(BlockId, BlockId)> {
    desc.iter()
        .filter_map(|r| match r {
            Record::SideBySide { a, b } => Some((a.clone(), b.clone())),
            _ => None,
        })
        .collect()
}

fn location(state: &State, id: &BlockId) -> Option<Point3> {
    state.get(id.as_str()).and_then(|b| b.location)
}

/// Blocks with colors and locations, locations propagated along stacks.
fn collect(desc: &Description) -> Result<State, BuildError> {
    let mut state = State::new();
    for id in desc.ids() {
        state.insert(Block::new(id));
    }
    for r in desc.iter() {
        match r {
            Record::Color { block, color } => {
                let b = state.block_mut(block.as_str())?;
                if let Some(old) = b.color.as_ref().filter(|c| *c != color) {
                    return Err(BuildError::ConflictingRelation {
                        block: block.clone(),
                        detail: format!("colored both {old} and {color}"),
                    });
                }
                b.color = Some(color.clone());
            }
            Record::Location { block, at } => {
                let b = state.block_mut(block.as_str())?;
                if let Some(old) = b.location.filter(|p| p != at) {
                    return Err(BuildError::ConflictingLocation {
                        block: block.clone(),
                        first: old,
                        second: *at,
                    });
                }
                b.location = Some(*at);
            }
            Record::OnTopOf { .. } | Record::SideBySide { .. } => {}
        }
    }
    propagate(&mut state, &on_top_of(desc))?;
    Ok(state)
}

/// Infer locations along `upper on-top-of lower` pairs until nothing changes.
fn propagate(state: &mut State, pairs: &[(BlockId, BlockId)]) -> Result<(), BuildError> {
    loop {
        let mut changed = false;
        for (upper, lower) in pairs {
            match (location(state, upper), location(state, lower)) {
                (None, Some(pl)) => {
                    state.block_mut(upper.as_str())?.location = Some(pl.above());
                    changed = true;
                }
                (Some(pu), None) if pu.z > 0 => {
                    state.block_mut(lower.as_str())?.location = Some(pu.beneath());
                    changed = true;
                }
                (Some(pu), Some(pl)) if pu != pl.above() => {
                    return Err(BuildError::ConflictingRelation {
                        block: upper.clone(),
                        detail: format!("on-top-of {lower} but at {pu} over {pl}"),
                    });
                }
                _ => {}
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

fn set_support(goal: &mut State, upper: &BlockId, lower: &BlockId) -> Result<(), BuildError> {
    let u = goal.block_mut(upper.as_str())?;
    if let Some(old) = u.on_top_of.as_ref().filter(|o| *o != lower) {
        return Err(BuildError::ConflictingRelation {
            block: upper.clone(),
            detail: format!("on-top-of both {old} and {lower}"),
        });
    }
    u.on_top_of = Some(lower.clone());
    let l = goal.block_mut(lower.as_str())?;
    if let Some(old) = l.below.as_ref().filter(|o| *o != upper) {
        return Err(BuildError::ConflictingRelation {
            block: lower.clone(),
            detail: format!("supports both {old} and {upper}"),
        });
    }
    l.below = Some(upper.clone());
    Ok(())
}

/// Pick the initial block a wildcard stands for.
///
/// Candidates are blocks the goal does not already name, with a matching
/// color when the wildcard has one. A unique color match wins, then a
/// block already at the wildcard's location, then the closest candidate.
fn bind_wildcard(
    goal: &State,
    initial: &State,
    w: &BlockId,
    opts: &BuildOptions,
) -> Result<BlockId, BuildError> {
    let wb = goal.block(w.as_str())?;
    let candidates: Vec<&Block> = initial
        .blocks()
        .filter(|b| !goal.contains(b.id.as_str()))
        .filter(|b| wb.color.is_none() || b.color == wb.color)
        .collect();
    match candidates.as_slice() {
        [] => {
            return Err(BuildError::UnboundWildcard {
                wildcard: w.clone(),
            });
        }
        [only] if wb.color.is_some() => return Ok(only.id.clone()),
        _ => {}
    }
    if let Some(p) = wb.location {
        if let Some(here) = candidates.iter().find(|b| b.location == Some(p)) {
            return Ok(here.id.clone());
        }
    }
    if opts.strict_wildcards && candidates.len() > 1 {
        return Err(BuildError::AmbiguousWildcard {
            wildcard: w.clone(),
            candidates: candidates.iter().map(|b| b.id.clone()).collect(),
        });
    }
    let best = match wb.location {
        Some(p) => candidates
            .iter()
            .min_by_key(|b| b.location.map_or(i32::MAX, |q| manhattan(p, q))),
        None => candidates.first(),
    };
    best.map(|b| b.id.clone())
        .ok_or_else(|| BuildError::UnboundWildcard {
            wildcard: w.clone(),
        })
}

/// Replace wildcard `w` by `bound` throughout the goal.
fn merge(goal: &mut State, w: &BlockId, bound: &BlockId, initial: &State) -> Result<(), BuildError> {
    let Some(mut b) = goal.remove(w.as_str()) else {
        return Ok(());
    };
    b.id = bound.clone();
    b.color = initial.block(bound.as_str())?.color.clone();
    goal.insert(b);
    for other in goal.blocks_mut() {
        if other.on_top_of.as_ref() == Some(w) {
            other.on_top_of = Some(bound.clone());
        }
        if other.below.as_ref() == Some(w) {
            other.below = Some(bound.clone());
        }
        if other.neighbors.remove(w) {
            other.neighbors.insert(bound.clone());
        }
    }
    let relinked = goal.block(bound.as_str())?;
    if relinked.on_top_of.as_ref() == Some(bound) || relinked.neighbors.contains(bound) {
        return Err(BuildError::ConflictingRelation {
            block: bound.clone(),
            detail: format!("wildcard {w} binds to a block it relates to"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::describe::parse;

    const INITIAL: &str = "
(has block1 color red)
(has block1 location 0 0 0)
(has block2 color blue)
(is block2 on-top-of block1)
(has block3 color blue)
(has block3 location 4 0 0)
";

    fn initial() -> State {
        build_initial(&parse(INITIAL).unwrap(), &Board::default()).unwrap()
    }

    #[test]
    fn initial_infers_stacked_location() {
        let s = initial();
        assert_eq!(s.location("block2").unwrap(), Point3::new(0, 0, 1));
        assert_eq!(s.get("block1").unwrap().below, Some(BlockId::new("block2")));
    }

    #[test]
    fn initial_rejects_unplaceable_and_collisions() {
        let d = parse("(has a location 0 0 0)\n(is b side-by-side a)").unwrap();
        assert_eq!(
            build_initial(&d, &Board::default()),
            Err(BuildError::Unplaceable(BlockId::new("b")))
        );
        let d = parse("(has a location 0 0 0)\n(has b location 0 0 0)").unwrap();
        assert!(matches!(
            build_initial(&d, &Board::default()),
            Err(BuildError::State(StateError::Collision { .. }))
        ));
        let d = parse("(has a location 0 0 2)").unwrap();
        assert!(matches!(
            build_initial(&d, &Board::default()),
            Err(BuildError::State(StateError::Floating { .. }))
        ));
        let d = parse("(has a location 30 0 0)").unwrap();
        assert!(matches!(
            build_initial(&d, &Board::default()),
            Err(BuildError::State(StateError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn goal_colors_must_match() {
        let d = parse("(has block1 color green)").unwrap();
        assert!(matches!(
            build_goal(&d, &initial(), &BuildOptions::default()),
            Err(BuildError::ColorMismatch { .. })
        ));
        let d = parse("(has block9 location 1 1 0)").unwrap();
        assert_eq!(
            build_goal(&d, &initial(), &BuildOptions::default()),
            Err(BuildError::UnknownGoalBlock(BlockId::new("block9")))
        );
    }

    #[test]
    fn goal_relations_and_propagation() {
        let d = parse("(has block1 location 3 3 0)\n(is block3 on-top-of block1)\n(is block2 side-by-side block1)").unwrap();
        let g = build_goal(&d, &initial(), &BuildOptions::default()).unwrap();
        assert_eq!(g.location("block3").unwrap(), Point3::new(3, 3, 1));
        assert_eq!(g.get("block1").unwrap().below, Some(BlockId::new("block3")));
        assert!(g.get("block2").unwrap().neighbors.contains("block1"));
        assert!(g.get("block2").unwrap().location.is_none());
    }

    #[test]
    fn wildcard_by_unique_color() {
        let d = parse("(has wildcard1 color red)\n(has wildcard1 location 5 5 0)").unwrap();
        let g = build_goal(&d, &initial(), &BuildOptions::default()).unwrap();
        assert_eq!(g.location("block1").unwrap(), Point3::new(5, 5, 0));
        assert!(!g.contains("wildcard1"));
    }

    #[test]
    fn wildcard_by_location_then_closest() {
        let opts = BuildOptions::default();
        let d = parse("(has wildcard color blue)\n(has wildcard location 4 0 0)").unwrap();
        let g = build_goal(&d, &initial(), &opts).unwrap();
        assert!(g.contains("block3"));

        let d = parse("(has wildcard color blue)\n(has wildcard location 1 0 0)").unwrap();
        let g = build_goal(&d, &initial(), &opts).unwrap();
        assert!(g.contains("block2"));

        let strict = BuildOptions {
            strict_wildcards: true,
            ..BuildOptions::default()
        };
        assert!(matches!(
            build_goal(&d, &initial(), &strict),
            Err(BuildError::AmbiguousWildcard { .. })
        ));
    }

    #[test]
    fn wildcard_relations_are_renamed() {
        let d = parse("(has WildCard1 color red)\n(is block3 on-top-of WildCard1)").unwrap();
        let g = build_goal(&d, &initial(), &BuildOptions::default()).unwrap();
        assert_eq!(g.get("block3").unwrap().on_top_of, Some(BlockId::new("block1")));
        assert_eq!(g.get("block1").unwrap().below, Some(BlockId::new("block3")));
    }

    #[test]
    fn unbound_wildcard() {
        let d = parse("(has wildcard1 color purple)").unwrap();
        assert!(matches!(
            build_goal(&d, &initial(), &BuildOptions::default()),
            Err(BuildError::UnboundWildcard { .. })
        ));
    }

    #[test]
    fn check_goal_catches_conflicts() {
        let mut g = State::new();
        g.insert(Block::new("a").at(Point3::new(1, 1, 0)));
        g.insert(Block::new("b").at(Point3::new(1, 1, 0)));
        assert!(check_goal(&g, 2, &Board::default()).is_err());

        let mut g = State::new();
        let mut a = Block::new("a").at(Point3::new(1, 1, 0));
        a.neighbors.insert(BlockId::new("b"));
        g.insert(a);
        g.insert(Block::new("b").at(Point3::new(3, 1, 0)));
        assert!(matches!(
            check_goal(&g, 2, &Board::default()),
            Err(BuildError::ConflictingRelation { .. })
        ));
    }
}
