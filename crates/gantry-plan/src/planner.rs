//! Two-tier planning: a route search over coarse actions, then one move
//! search per route transition to expand it into arm commands.
//!
//! Both tiers share one start instant. The route tier stops at
//! `route_budget`, the move tier at `total_budget`, so time the route tier
//! leaves unused goes to the move tier.

use std::time::{Duration, Instant};

use gantry_core::{Action, Command, State};
use gantry_search::{Deadline, HbfsConfig, Keyed, Objective, Path, RbfsConfig, hbfs, rbfs};
use log::{debug, info, warn};

use crate::config::{Engine, PlannerConfig, TierConfig};
use crate::error::PlanError;
use crate::heuristic::Heuristic;
use crate::rules::Rules;
use crate::tier::{MoveTier, ReachGoal, ReachState, RouteTier};

/// How a planning run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanStatus {
    /// The commands reach the goal.
    Solved,
    /// A deadline expired; the commands reach a partial state.
    TimedOut,
    /// A tier exhausted its search space without reaching its target.
    Unreachable,
}

/// Search effort of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlanStats {
    pub route_expanded: usize,
    pub move_expanded: usize,
    pub move_searches: usize,
}

/// The result of [`Planner::plan`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Plan {
    pub commands: Vec<Command>,
    /// Route-tier actions, one per route transition.
    pub route: Vec<Action>,
    /// Route-tier states, starting with the initial state.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub route_states: Vec<State>,
    /// The state the commands lead to.
    pub final_state: State,
    pub status: PlanStatus,
    pub stats: PlanStats,
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::config::secs::serialize"))]
    pub elapsed: Duration,
}

impl Plan {
    pub fn is_solved(&self) -> bool {
        self.status == PlanStatus::Solved
    }

    /// Route actions as commands. Stack commands carry no coordinates.
    pub fn route_commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.route.iter().map(Action::to_command)
    }
}

/// The hierarchical planner.
#[derive(Clone, Debug, Default)]
pub struct Planner {
    config: PlannerConfig,
    rules: Rules,
}

struct TierRun<S, A> {
    path: Option<Path<S, A>>,
    timed_out: bool,
    expanded: usize,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        let rules = Rules::new(config.board, config.stack_cost);
        Self { config, rules }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Plan from `initial` to the (possibly partial) `goal`.
    ///
    /// Errors only on invalid input; running out of time or search space
    /// is reported through [`Plan::status`].
    pub fn plan(&self, initial: &State, goal: &State) -> Result<Plan, PlanError> {
        self.run(initial, goal, true)
    }

    /// Run the route tier only. The plan carries no commands and ends in
    /// the last route state.
    pub fn plan_route(&self, initial: &State, goal: &State) -> Result<Plan, PlanError> {
        self.run(initial, goal, false)
    }

    fn run(&self, initial: &State, goal: &State, expand: bool) -> Result<Plan, PlanError> {
        let start = Instant::now();
        if let Some(e) = initial.check_invariants().into_iter().next() {
            return Err(PlanError::InvalidInitial(e));
        }
        if let Some(g) = goal.blocks().find(|g| !initial.contains(g.id.as_str())) {
            return Err(PlanError::UnknownGoalBlock(g.id.clone()));
        }
        let route_deadline = Deadline::new(start, self.config.effective_route_budget());
        let total_deadline = Deadline::new(start, self.config.total_budget);

        info!(
            "planning {} blocks, route budget {:?}, total budget {:?}",
            initial.len(),
            route_deadline.budget(),
            total_deadline.budget()
        );
        let route_domain = RouteTier {
            rules: &self.rules,
            goal,
            policy: self.config.route.grab_policy,
        };
        let route_objective = ReachGoal {
            goal,
            heuristic: Heuristic::new(goal, &self.config.route_heuristic),
        };
        let route = run_tier(
            &self.config.route,
            &route_domain,
            &route_objective,
            initial.clone(),
            route_deadline,
        )?;
        let mut stats = PlanStats {
            route_expanded: route.expanded,
            ..PlanStats::default()
        };

        let Some(route_path) = route.path else {
            warn!("route tier: no plan after {} expansions", route.expanded);
            return Ok(Plan {
                commands: Vec::new(),
                route: Vec::new(),
                route_states: vec![initial.clone()],
                final_state: initial.clone(),
                status: PlanStatus::Unreachable,
                stats,
                elapsed: start.elapsed(),
            });
        };
        let mut status = if route.timed_out {
            warn!("route tier: deadline expired, continuing with a partial route");
            PlanStatus::TimedOut
        } else {
            PlanStatus::Solved
        };
        let route_states: Vec<State> = route_path.states().cloned().collect();
        let route_actions: Vec<Action> = route_path.actions().cloned().collect();
        debug!(
            "route tier: {} steps, cost {}, {} expansions",
            route_actions.len(),
            route_path.cost(),
            route.expanded
        );

        if !expand {
            let final_state = route_path.final_state().cloned().unwrap_or_else(|| initial.clone());
            return Ok(Plan {
                commands: Vec::new(),
                route: route_actions,
                route_states,
                final_state,
                status,
                stats,
                elapsed: start.elapsed(),
            });
        }

        let move_domain = MoveTier { rules: &self.rules };
        let mut current = initial.clone();
        let mut commands = Vec::new();
        for (i, target) in route_states.iter().enumerate().skip(1) {
            let objective = ReachState::new(
                target,
                self.config.moves.grab_policy,
                Heuristic::new(target, &self.config.move_heuristic),
            );
            let run = run_tier(
                &self.config.moves,
                &move_domain,
                &objective,
                current.clone(),
                total_deadline,
            )?;
            stats.move_searches += 1;
            stats.move_expanded += run.expanded;
            let Some(path) = run.path else {
                warn!("move tier: step {i} ({}) unreachable", route_actions[i - 1]);
                status = PlanStatus::Unreachable;
                break;
            };
            debug!(
                "move tier: step {i} ({}) -> {} commands",
                route_actions[i - 1],
                path.len()
            );
            commands.extend(path.actions().map(Action::to_command));
            if let Some(s) = path.final_state() {
                current = s.clone();
            }
            if run.timed_out {
                warn!("move tier: deadline expired at step {i}");
                status = PlanStatus::TimedOut;
                break;
            }
        }

        if self.config.release_at_end {
            if let Some(held) = current.grabbed().cloned() {
                let (released, _) = self.rules.apply(&current, &Action::Release(held.clone()))?;
                commands.push(Command::Release(held));
                current = released;
            }
        }

        let elapsed = start.elapsed();
        info!(
            "plan {:?}: {} commands in {:.3}s",
            status,
            commands.len(),
            elapsed.as_secs_f64()
        );
        Ok(Plan {
            commands,
            route: route_actions,
            route_states,
            final_state: current,
            status,
            stats,
            elapsed,
        })
    }
}

fn run_tier<D, O>(
    tier: &TierConfig,
    domain: &D,
    objective: &O,
    start: D::State,
    deadline: Deadline,
) -> Result<TierRun<D::State, D::Action>, D::Error>
where
    D: Keyed,
    O: Objective<D::State>,
{
    match tier.engine {
        Engine::Rbfs => {
            let cfg = RbfsConfig {
                deadline,
                backup: tier.backup,
                max_expansions: tier.max_expansions,
            };
            let out = rbfs::search(domain, objective, start, &cfg)?;
            Ok(TierRun {
                timed_out: out.timed_out(),
                expanded: out.expanded(),
                path: out.into_path(),
            })
        }
        Engine::Hbfs => {
            let out = hbfs::search(domain, objective, start, &HbfsConfig {
                deadline,
                max_expansions: tier.max_expansions,
            })?;
            Ok(TierRun {
                path: out.path,
                timed_out: out.timed_out,
                expanded: out.expanded,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::{Block, BlockId, Point3, StateError};

    fn one_block() -> State {
        State::from_placed([Block::new("block1").at(Point3::new(0, 0, 0))]).unwrap()
    }

    #[test]
    fn single_slide() {
        let mut goal = State::new();
        goal.insert(Block::new("block1").at(Point3::new(1, 0, 0)));
        let plan = Planner::default().plan(&one_block(), &goal).unwrap();
        assert!(plan.is_solved());
        let text: Vec<String> = plan.commands.iter().map(|c| c.to_string()).collect();
        assert_eq!(text, ["(command slide block1 1 0)"]);
        assert_eq!(plan.route.len(), 1);
        assert_eq!(plan.route_states.len(), 2);
    }

    #[test]
    fn goal_already_met() {
        let s = one_block();
        let plan = Planner::default().plan(&s, &s).unwrap();
        assert!(plan.is_solved());
        assert!(plan.commands.is_empty());
        assert_eq!(plan.final_state, s);
    }

    #[test]
    fn zero_budget_times_out_at_start() {
        let mut goal = State::new();
        goal.insert(Block::new("block1").at(Point3::new(5, 5, 0)));
        let cfg = PlannerConfig::default().with_total_budget(Duration::ZERO);
        let plan = Planner::new(cfg).plan(&one_block(), &goal).unwrap();
        assert_eq!(plan.status, PlanStatus::TimedOut);
        assert!(plan.commands.is_empty());
        assert_eq!(plan.route_states.len(), 1);
    }

    #[test]
    fn unknown_goal_block_is_fatal() {
        let mut goal = State::new();
        goal.insert(Block::new("ghost"));
        let err = Planner::default().plan(&one_block(), &goal).unwrap_err();
        assert_eq!(err, PlanError::UnknownGoalBlock(BlockId::new("ghost")));
    }

    #[test]
    fn stack_ends_with_release() {
        let initial = State::from_placed([
            Block::new("a").at(Point3::new(0, 0, 0)),
            Block::new("b").at(Point3::new(2, 0, 0)),
        ])
        .unwrap();
        let mut goal = State::new();
        let mut a = Block::new("a");
        a.on_top_of = Some(BlockId::new("b"));
        goal.insert(a);
        let plan = Planner::default().plan(&initial, &goal).unwrap();
        assert!(plan.is_solved());
        assert!(crate::goal::satisfies(&plan.final_state, &goal));
        assert_eq!(plan.final_state.grabbed(), None);
        assert_eq!(plan.commands.last(), Some(&Command::Release(BlockId::new("a"))));
    }

    #[test]
    fn hbfs_tiers() {
        let mut cfg = PlannerConfig::default();
        cfg.route.engine = Engine::Hbfs;
        cfg.moves.engine = Engine::Hbfs;
        let mut goal = State::new();
        goal.insert(Block::new("block1").at(Point3::new(2, 2, 0)));
        let plan = Planner::new(cfg).plan(&one_block(), &goal).unwrap();
        assert!(plan.is_solved());
        assert!(crate::goal::satisfies(&plan.final_state, &goal));
    }

    #[test]
    fn inconsistent_initial_is_fatal() {
        let mut s = one_block();
        s.insert(Block::new("twin").at(Point3::new(0, 0, 0)));
        let err = Planner::default().plan(&s, &State::new()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidInitial(StateError::Collision { .. })));
    }

    #[test]
    fn hbfs_move_tier_grabs() {
        let mut cfg = PlannerConfig::default();
        cfg.moves.engine = Engine::Hbfs;
        let initial = State::from_placed([
            Block::new("a").at(Point3::new(0, 0, 0)),
            Block::new("b").at(Point3::new(4, 4, 0)),
        ])
        .unwrap();
        let mut goal = State::new();
        goal.insert(Block::new("a").at(Point3::new(4, 4, 1)));
        let plan = Planner::new(cfg).plan(&initial, &goal).unwrap();
        assert!(plan.is_solved());
        assert!(plan.commands.contains(&Command::Grab(BlockId::new("a"))));
        assert_eq!(plan.final_state.location("a").unwrap(), Point3::new(4, 4, 1));
    }

    #[test]
    fn route_only_skips_move_tier() {
        let mut goal = State::new();
        goal.insert(Block::new("block1").at(Point3::new(3, 0, 0)));
        let plan = Planner::default().plan_route(&one_block(), &goal).unwrap();
        assert!(plan.is_solved());
        assert!(plan.commands.is_empty());
        assert_eq!(plan.stats.move_searches, 0);
        assert_eq!(plan.final_state.location("block1").unwrap(), Point3::new(3, 0, 0));
    }

    #[test]
    fn capped_move_tier_is_unreachable() {
        let mut cfg = PlannerConfig::default();
        cfg.moves.max_expansions = Some(0);
        let mut goal = State::new();
        goal.insert(Block::new("block1").at(Point3::new(1, 0, 0)));
        let plan = Planner::new(cfg).plan(&one_block(), &goal).unwrap();
        assert_eq!(plan.status, PlanStatus::Unreachable);
        assert!(plan.commands.is_empty());
        assert_eq!(plan.stats.move_searches, 1);
    }
}
