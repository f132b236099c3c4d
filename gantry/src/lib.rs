//! Command-line front end for the gantry planner.
//!
//! Reads an initial and a goal description, plans, and prints the
//! resulting arm commands. The binary in `main.rs` is a thin wrapper over
//! [`run`]; everything here is testable without touching the terminal.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use gantry_core::describe::parse;
use gantry_core::{Command, State};
use gantry_plan::goal::{satisfies, unsatisfied};
use gantry_plan::{
    BuildOptions, Engine, Plan, PlanStatus, Planner, PlannerConfig, build_goal, build_initial,
    check_goal, replay,
};
use log::{debug, info};

#[derive(Parser, Debug, Clone)]
#[command(name = "gantry")]
#[command(about = "Plan arm commands that turn one blocks world into another")]
pub struct Cli {
    /// Initial state description
    #[arg(short, long)]
    pub initial_state: PathBuf,

    /// Goal state description (may be partial)
    #[arg(short, long)]
    pub goal_state: PathBuf,

    /// Report elapsed planning time
    #[arg(short, long)]
    pub time: bool,

    /// Verbose debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Validate both states before planning
    #[arg(short, long)]
    pub validate: bool,

    /// Total wall-clock budget in seconds
    #[arg(long)]
    pub budget: Option<f64>,

    /// Route tier budget in seconds, counted from the same start
    #[arg(long)]
    pub route_budget: Option<f64>,

    /// Search engine for the route tier
    #[arg(long, value_enum)]
    pub route_engine: Option<EngineArg>,

    /// Search engine for the move tier
    #[arg(long, value_enum)]
    pub move_engine: Option<EngineArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: Format,

    /// Planner configuration as JSON; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Replay the plan and check it reaches the goal
    #[arg(long)]
    pub verify: bool,

    /// Print the route tier's stack and slide actions instead of arm commands
    #[arg(long)]
    pub route_only: bool,

    /// Fail when a wildcard matches several blocks equally well
    #[arg(long)]
    pub strict_wildcards: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    Rbfs,
    Hbfs,
}

impl From<EngineArg> for Engine {
    fn from(e: EngineArg) -> Self {
        match e {
            EngineArg::Rbfs => Engine::Rbfs,
            EngineArg::Hbfs => Engine::Hbfs,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

/// What a run produced: text for stdout plus the plan behind it.
#[derive(Debug)]
pub struct Report {
    pub output: String,
    pub status: PlanStatus,
    pub plan: Plan,
}

impl Report {
    /// `0` when a plan was found (even a partial one after a timeout),
    /// `2` when the goal is unreachable.
    pub fn exit_code(&self) -> ExitCode {
        match self.status {
            PlanStatus::Solved | PlanStatus::TimedOut => ExitCode::SUCCESS,
            PlanStatus::Unreachable => ExitCode::from(2),
        }
    }
}

/// Load both description files and plan.
pub fn run(cli: &Cli) -> Result<Report> {
    let initial = read(&cli.initial_state)?;
    let goal = read(&cli.goal_state)?;
    let config = match &cli.config {
        Some(path) => {
            let text = read(path)?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => PlannerConfig::default(),
    };
    execute(cli, config, &initial, &goal)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Plan from description texts, with `base` as the configuration that
/// command-line flags are applied on top of.
pub fn execute(cli: &Cli, base: PlannerConfig, initial: &str, goal: &str) -> Result<Report> {
    let config = apply_flags(cli, base)?;
    let (initial, goal) = load(cli, &config, initial, goal)?;
    if cli.validate {
        validate(&initial, &goal, &config)?;
    }

    let planner = Planner::new(config);
    let plan = if cli.route_only {
        planner.plan_route(&initial, &goal)
    } else {
        planner.plan(&initial, &goal)
    }
    .context("planning failed")?;
    info!(
        "{:?}: {} commands, {} route steps in {:.3}s",
        plan.status,
        plan.commands.len(),
        plan.route.len(),
        plan.elapsed.as_secs_f64()
    );
    if cli.verify {
        verify(cli, &planner, &initial, &goal, &plan)?;
    }

    Ok(Report {
        output: render(cli, &plan)?,
        status: plan.status,
        plan,
    })
}

fn apply_flags(cli: &Cli, mut config: PlannerConfig) -> Result<PlannerConfig> {
    if let Some(secs) = cli.budget {
        config = config.with_total_budget(seconds(secs, "--budget")?);
    }
    if let Some(secs) = cli.route_budget {
        config.route_budget = seconds(secs, "--route-budget")?;
    }
    if let Some(e) = cli.route_engine {
        config.route.engine = e.into();
    }
    if let Some(e) = cli.move_engine {
        config.moves.engine = e.into();
    }
    Ok(config)
}

fn seconds(secs: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("{flag}: invalid duration {secs}"))
}

fn load(cli: &Cli, config: &PlannerConfig, initial: &str, goal: &str) -> Result<(State, State)> {
    let initial_path = cli.initial_state.display();
    let goal_path = cli.goal_state.display();
    let init_desc = parse(initial).with_context(|| format!("parsing {initial_path}"))?;
    let init = build_initial(&init_desc, &config.board)
        .with_context(|| format!("building initial state from {initial_path}"))?;
    let goal_desc = parse(goal).with_context(|| format!("parsing {goal_path}"))?;
    let opts = BuildOptions {
        strict_wildcards: cli.strict_wildcards,
        board: config.board,
    };
    let goal = build_goal(&goal_desc, &init, &opts)
        .with_context(|| format!("building goal state from {goal_path}"))?;
    debug!("initial state:\n{init}");
    debug!("goal state:\n{goal}");
    Ok((init, goal))
}

fn validate(initial: &State, goal: &State, config: &PlannerConfig) -> Result<()> {
    let violations = initial.check_invariants();
    if !violations.is_empty() {
        let list: Vec<String> = violations.iter().map(ToString::to_string).collect();
        bail!("initial state is inconsistent: {}", list.join("; "));
    }
    check_goal(goal, initial.len(), &config.board).context("goal state is inconsistent")?;
    let open = unsatisfied(initial, goal);
    info!("validated: {} blocks, {open} goal blocks unsatisfied", initial.len());
    Ok(())
}

fn verify(cli: &Cli, planner: &Planner, initial: &State, goal: &State, plan: &Plan) -> Result<()> {
    // Route stacks onto the table carry no coordinates, so a route alone
    // is checked by its last state.
    let end = if cli.route_only {
        plan.final_state.clone()
    } else {
        replay(planner.rules(), initial, &plan.commands).context("replaying the plan")?
    };
    if end != plan.final_state {
        bail!("replayed plan ends in a different state than the planner reported");
    }
    if plan.is_solved() && !satisfies(&end, goal) {
        bail!("replayed plan does not reach the goal");
    }
    info!("verified {} commands", plan.commands.len());
    Ok(())
}

fn render(cli: &Cli, plan: &Plan) -> Result<String> {
    let commands: Vec<Command> = if cli.route_only {
        plan.route_commands().collect()
    } else {
        plan.commands.clone()
    };
    let mut out = String::new();
    match cli.format {
        Format::Json if cli.route_only => {
            out.push_str(&serde_json::to_string_pretty(&commands)?);
            out.push('\n');
        }
        Format::Json => {
            out.push_str(&serde_json::to_string_pretty(plan)?);
            out.push('\n');
        }
        Format::Text => {
            for c in &commands {
                writeln!(out, "{c}")?;
            }
            if cli.time {
                writeln!(out, "Elapsed: {:.3}s", plan.elapsed.as_secs_f64())?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec!["gantry", "-i", "init.txt", "-g", "goal.txt"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    const SLIDE_INIT: &str = "(has block1 location 0 0 0)";
    const SLIDE_GOAL: &str = "(has block1 location 1 0 0)";

    #[test]
    fn parses_flags() {
        let c = cli(&["-t", "-d", "--budget", "5", "--route-engine", "hbfs", "--format", "json"]);
        assert!(c.time && c.debug && !c.validate);
        assert_eq!(c.budget, Some(5.0));
        assert_eq!(c.route_engine, Some(EngineArg::Hbfs));
        assert_eq!(c.format, Format::Json);
    }

    #[test]
    fn goal_is_required() {
        assert!(Cli::try_parse_from(["gantry", "-i", "init.txt"]).is_err());
    }

    #[test]
    fn prints_single_slide() {
        let report = execute(&cli(&["-v", "--verify"]), PlannerConfig::default(), SLIDE_INIT, SLIDE_GOAL).unwrap();
        assert_eq!(report.output, "(command slide block1 1 0)\n");
        assert_eq!(report.status, PlanStatus::Solved);
    }

    #[test]
    fn time_flag_appends_elapsed() {
        let report = execute(&cli(&["-t"]), PlannerConfig::default(), SLIDE_INIT, SLIDE_GOAL).unwrap();
        let last = report.output.lines().last().unwrap();
        assert!(last.starts_with("Elapsed: "), "{last}");
    }

    #[test]
    fn flags_override_config() {
        let c = cli(&["--budget", "10", "--move-engine", "hbfs"]);
        let config = apply_flags(&c, PlannerConfig::default()).unwrap();
        assert_eq!(config.total_budget, Duration::from_secs(10));
        assert!(config.route_budget < config.total_budget);
        assert_eq!(config.moves.engine, Engine::Hbfs);
        assert_eq!(config.route.engine, Engine::Rbfs);
    }

    #[test]
    fn negative_budget_is_rejected() {
        let c = cli(&["--budget=-1"]);
        assert!(apply_flags(&c, PlannerConfig::default()).is_err());
    }

    #[test]
    fn json_output_carries_commands() {
        let report =
            execute(&cli(&["--format", "json"]), PlannerConfig::default(), SLIDE_INIT, SLIDE_GOAL).unwrap();
        let v: serde_json::Value = serde_json::from_str(&report.output).unwrap();
        assert_eq!(v["status"], "solved");
        assert_eq!(v["commands"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn collision_is_fatal() {
        let init = "(has a location 0 0 0)\n(has b location 0 0 0)";
        let err = execute(&cli(&[]), PlannerConfig::default(), init, "(has a location 1 1 0)").unwrap_err();
        assert!(format!("{err:#}").contains("init.txt"));
    }

    #[test]
    fn unknown_goal_block_is_fatal() {
        assert!(execute(&cli(&[]), PlannerConfig::default(), SLIDE_INIT, "(has zz location 1 1 0)").is_err());
    }

    #[test]
    fn route_only_prints_route_actions() {
        let init = "(has a location 0 0 0)\n(has b location 3 3 0)";
        let report =
            execute(&cli(&["--route-only", "--route-engine", "hbfs"]), PlannerConfig::default(), init, "(is a on-top-of b)")
                .unwrap();
        assert_eq!(report.output, "(command stack a b)\n");
        assert!(report.plan.commands.is_empty());
        assert_eq!(report.plan.stats.move_searches, 0);
    }

    #[test]
    fn route_only_verifies_last_route_state() {
        let report = execute(&cli(&["--route-only", "--verify"]), PlannerConfig::default(), SLIDE_INIT, SLIDE_GOAL)
            .unwrap();
        assert_eq!(report.status, PlanStatus::Solved);
        assert_eq!(report.plan.stats.move_searches, 0);
    }
}
