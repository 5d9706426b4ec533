//! # Grid-World MCTS Planner CLI
//!
//! Command-line driver for the MCTS planner. Builds the demo 3x4 grid world
//! (one obstacle, a +1 and a -1 terminal), runs a configurable number of
//! search iterations from the agent's current cell, and renders the greedy
//! policy and the per-action statistics the search produced.
//!
//! ## Usage
//! Run with `cargo run --release --bin plan`. Useful flags:
//! - `-i/--iterations` - search budget before the policy is read
//! - `-s/--seed` - fix the RNG seed for a reproducible search
//! - `-m/--moves` - manual moves applied before planning (e.g. `-m u,r,r`)
//! - `--walk` - number of greedy steps to take after planning

use clap::Parser;
use colored::Colorize;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use mcts::worlds::grid::{Action, GridWorld, State};
use mcts::{Mcts, MctsConfig};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Number of MCTS iterations to run before reading the policy
    #[clap(short = 'i', long, default_value_t = 10000)]
    iterations: u32,

    /// Exploration bias coefficient for UCB1
    #[clap(short = 'e', long, default_value_t = 4000.0)]
    exploration_bias: f64,

    /// Per-step discount factor
    #[clap(short = 'd', long, default_value_t = 0.9)]
    discount: f64,

    /// Times a state may be touched within one simulated trajectory
    #[clap(long, default_value_t = 1)]
    visits_per_sim: u32,

    /// Maximum rollout/tree depth
    #[clap(long, default_value_t = 200)]
    max_rollout_depth: u32,

    /// Independent runs averaged per rollout (must be at least 1)
    #[clap(long, default_value_t = 1)]
    trials_per_rollout: u32,

    /// RNG seed; defaults to the current time
    #[clap(short, long)]
    seed: Option<u64>,

    /// Manual moves applied from the start cell before planning
    #[clap(short = 'm', long, value_delimiter = ',')]
    moves: Vec<Action>,

    /// Number of greedy-policy steps to walk after planning
    #[clap(long, default_value_t = 0)]
    walk: u32,
}

/// The demo world: 3x4 grid, obstacle at (1,1), +1 terminal at (0,3),
/// -1 terminal at (1,3), agent starting in the bottom-left corner.
fn demo_world(discount: f64) -> (GridWorld, State) {
    let rewards = HashMap::from([((0, 3), 1.0), ((1, 3), -1.0)]);
    let terminal_states: Vec<State> = rewards.keys().copied().collect();
    let world = GridWorld::new(3, 4, vec![(1, 1)], terminal_states, rewards, discount);
    (world, (2, 0))
}

/// Renders the greedy policy as a grid of arrows, marking the agent's cell,
/// obstacles, and terminals.
fn print_policy<R: rand::Rng>(planner: &Mcts<R>, current: State) {
    let env = planner.env();
    let policy = planner.extract_policy();
    for row in 0..env.num_rows() {
        for col in 0..env.num_cols() {
            let state = (row, col);
            let cell = if state == current {
                "@".cyan().bold()
            } else if env.obstacles().contains(&state) {
                "#".white().dimmed()
            } else if env.is_terminal(state) {
                if env.reward(state) > 0.0 {
                    "+".green().bold()
                } else {
                    "-".red().bold()
                }
            } else {
                match policy[&state] {
                    Some(Action::Up) => "^".normal(),
                    Some(Action::Down) => "v".normal(),
                    Some(Action::Left) => "<".normal(),
                    Some(Action::Right) => ">".normal(),
                    None => ".".normal(),
                }
            };
            print!("{} ", cell);
        }
        println!();
    }
}

/// Prints Q(s,a) and N(s,a) for every action at the agent's current cell.
fn print_state_stats<R: rand::Rng>(planner: &Mcts<R>, state: State) {
    let visits = planner.state_visits(state).unwrap_or(0);
    println!(
        "state {:?}: N = {}",
        state,
        visits.to_string().yellow()
    );
    for action in Action::ALL {
        match planner.q_value(state, action) {
            Some(q) => println!(
                "  {}: Q = {:>10.4}  N = {}",
                action,
                q,
                planner.action_visits(state, action).unwrap_or(0)
            ),
            None => println!("  {}: {}", action, "unvisited".dimmed()),
        }
    }
}

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0)
    });
    let config = MctsConfig {
        visits_per_sim: args.visits_per_sim,
        max_rollout_depth: args.max_rollout_depth,
        trials_per_rollout: args.trials_per_rollout,
        exploration_bias: args.exploration_bias,
    };

    let (world, start) = demo_world(args.discount);
    let mut planner = Mcts::with_seed(world, config, seed);

    // Forward any manual moves through the stochastic model first, like a
    // user stepping the agent around before asking for a plan.
    let mut current = start;
    for action in &args.moves {
        let next = planner.step(current, *action);
        println!("move {}: {:?} -> {:?}", action, current, next);
        current = next;
    }

    println!(
        "planning from {:?} with {} iterations (seed {})",
        current,
        args.iterations.to_string().cyan(),
        seed
    );
    let greedy = planner.plan_online(current, args.iterations);

    println!();
    print_policy(&planner, current);
    println!();
    print_state_stats(&planner, current);

    match greedy {
        Some(action) => println!("\ngreedy action at {:?}: {}", current, action.to_string().green().bold()),
        None => println!("\nno action recorded at {:?}", current),
    }

    // Optionally walk the greedy policy through the stochastic world.
    for step in 0..args.walk {
        if planner.env().is_terminal(current) {
            println!(
                "reached terminal {:?} (reward {})",
                current,
                planner.env().reward(current)
            );
            break;
        }
        let Some(action) = planner.select_greedy_action(current) else {
            println!("no recorded action at {:?}, stopping walk", current);
            break;
        };
        let next = planner.step(current, action);
        println!("step {}: {} from {:?} -> {:?}", step + 1, action, current, next);
        current = next;
    }
}
