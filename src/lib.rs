//! Monte Carlo Tree Search planning for stochastic grid worlds.
//!
//! The planner runs simulated trajectories against a [`worlds::grid::GridWorld`],
//! accumulating visit counts and action-value estimates in tables it owns, and
//! answers greedy-policy queries over those tables. Search is single-threaded
//! and synchronous; all randomness is drawn from an injected generator.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::HashMap;

pub mod policy;
pub mod worlds;

use crate::policy::GreedyPolicy;
use crate::worlds::grid::{Action, GridWorld, State};

/// Tunable search parameters.
///
/// The defaults reproduce the reference configuration: a very large
/// exploration bias keeps action visit counts balanced, and a
/// visits-per-simulation cap of 1 expands at most one new tree node per
/// trajectory before falling back to a random rollout.
#[derive(Debug, Clone, Copy)]
pub struct MctsConfig {
    /// Maximum times a single state may be touched within one simulated
    /// trajectory before the descent is cut short
    pub visits_per_sim: u32,
    /// Maximum rollout/tree depth
    pub max_rollout_depth: u32,
    /// Number of independent runs averaged per rollout; must be at least 1
    pub trials_per_rollout: u32,
    /// Exploration bias coefficient `c` in the UCB1 rule
    pub exploration_bias: f64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            visits_per_sim: 1,
            max_rollout_depth: 200,
            trials_per_rollout: 1,
            exploration_bias: 4000.0,
        }
    }
}

/// The MCTS planner.
///
/// Owns the world model, the search statistics, and the random source.
/// Statistics start empty and accumulate for the lifetime of the planner;
/// successive [`Mcts::plan_online`] calls warm-start from earlier searches.
pub struct Mcts<R: Rng> {
    /// The world the planner simulates against
    env: GridWorld,
    /// Search parameters
    config: MctsConfig,
    /// Random source for outcome draws, rollout actions, and tie-breaks
    rng: R,
    /// Action-value estimates Q(s, a)
    q_sa: HashMap<(State, Action), f64>,
    /// Per-state visit counts N(s)
    n_s: HashMap<State, u32>,
    /// Per-state-action visit counts N(s, a)
    n_sa: HashMap<(State, Action), u32>,
}

impl Mcts<Xoshiro256PlusPlus> {
    /// Creates a planner with a seeded generator for reproducible searches.
    ///
    /// # Panics
    /// Panics if `config.trials_per_rollout` is 0.
    pub fn with_seed(env: GridWorld, config: MctsConfig, seed: u64) -> Self {
        Self::new(env, config, Xoshiro256PlusPlus::seed_from_u64(seed))
    }
}

impl<R: Rng> Mcts<R> {
    /// Creates a planner with empty statistics tables.
    ///
    /// # Arguments
    /// * `env` - The world to plan in
    /// * `config` - Search parameters
    /// * `rng` - Random source; inject a seeded generator for reproducibility
    ///
    /// # Panics
    /// Panics if `config.trials_per_rollout` is 0, which would divide by zero
    /// when averaging rollout returns.
    pub fn new(env: GridWorld, config: MctsConfig, rng: R) -> Self {
        assert!(
            config.trials_per_rollout >= 1,
            "trials_per_rollout must be at least 1"
        );
        Self {
            env,
            config,
            rng,
            q_sa: HashMap::new(),
            n_s: HashMap::new(),
            n_sa: HashMap::new(),
        }
    }

    /// The world the planner simulates against.
    pub fn env(&self) -> &GridWorld {
        &self.env
    }

    /// Q(state, action), if the pair has ever been backed up.
    pub fn q_value(&self, state: State, action: Action) -> Option<f64> {
        self.q_sa.get(&(state, action)).copied()
    }

    /// N(state), if the state has ever been touched by the search.
    pub fn state_visits(&self, state: State) -> Option<u32> {
        self.n_s.get(&state).copied()
    }

    /// N(state, action), if the action has ever been selected at the state.
    pub fn action_visits(&self, state: State, action: Action) -> Option<u32> {
        self.n_sa.get(&(state, action)).copied()
    }

    /// The raw Q-value table, for rendering and reporting layers.
    pub fn q_values(&self) -> &HashMap<(State, Action), f64> {
        &self.q_sa
    }

    /// The raw per-state visit table.
    pub fn state_visit_counts(&self) -> &HashMap<State, u32> {
        &self.n_s
    }

    /// The raw per-state-action visit table.
    pub fn action_visit_counts(&self) -> &HashMap<(State, Action), u32> {
        &self.n_sa
    }

    /// Selects the next action to try at a state during tree descent.
    ///
    /// Any action with no recorded visits is chosen first (uniformly among
    /// the unvisited ones), so every action is tried once before
    /// exploitation begins. Otherwise UCB1 picks the action maximizing
    /// `Q(s,a) + c * sqrt(ln N(s) / N(s,a))`; ties go to the first maximal
    /// action in the fixed enumeration order.
    pub fn select_action(&mut self, state: State) -> Action {
        let unvisited: Vec<Action> = Action::ALL
            .iter()
            .copied()
            .filter(|&action| !self.n_sa.contains_key(&(state, action)))
            .collect();
        if !unvisited.is_empty() {
            return unvisited[self.rng.random_range(0..unvisited.len())];
        }

        let state_visits = self.n_s.get(&state).copied().unwrap_or(0) as f64;
        let mut best_value = f64::NEG_INFINITY;
        let mut best_action = None;
        for action in Action::ALL {
            let q = self.q_sa.get(&(state, action)).copied().unwrap_or(0.0);
            let visits = self.n_sa.get(&(state, action)).copied().unwrap_or(1) as f64;
            let value = q + self.config.exploration_bias * (state_visits.ln() / visits).sqrt();
            if value > best_value {
                best_value = value;
                best_action = Some(action);
            }
        }
        best_action.unwrap_or_else(|| Action::ALL[self.rng.random_range(0..Action::ALL.len())])
    }

    /// Runs one simulated trajectory from `start` and returns its estimated
    /// discounted return, updating the statistics tables along the way.
    ///
    /// Each call uses a fresh per-trajectory visit tally; the global tables
    /// persist across calls.
    pub fn simulate(&mut self, start: State) -> f64 {
        let mut visited = HashMap::new();
        self.search(start, 0, &mut visited)
    }

    /// Recursive selection/expansion/backup step of one trajectory.
    fn search(&mut self, state: State, depth: u32, visited: &mut HashMap<State, u32>) -> f64 {
        let capped = visited
            .get(&state)
            .is_some_and(|&touches| touches >= self.config.visits_per_sim);
        if capped || depth > self.config.max_rollout_depth {
            // Descent is cut short: report the best known value at this
            // state, or estimate one by rollout if nothing is recorded yet.
            let mut best_q = f64::NEG_INFINITY;
            let mut found = false;
            for action in Action::ALL {
                if let Some(&q) = self.q_sa.get(&(state, action)) {
                    if q > best_q {
                        best_q = q;
                    }
                    found = true;
                }
            }
            if found {
                return best_q;
            }
            let remaining = self.config.max_rollout_depth.saturating_sub(depth);
            return self.rollout(state, remaining, self.config.trials_per_rollout);
        }
        *visited.entry(state).or_insert(0) += 1;

        if self.env.is_terminal(state) {
            // Terminal arrival always reports exactly one visit.
            self.n_s.insert(state, 1);
            return self.env.reward(state);
        }

        if !self.n_s.contains_key(&state) {
            // Expansion: first global touch of this state. Estimate it by
            // rollout instead of descending into children.
            self.n_s.insert(state, 0);
            let remaining = self.config.max_rollout_depth.saturating_sub(depth);
            return self.rollout(state, remaining, self.config.trials_per_rollout);
        }

        let action = self.select_action(state);
        *self.n_sa.entry((state, action)).or_insert(0) += 1;
        *self.n_s.entry(state).or_insert(0) += 1;

        let next = self.env.perform_action(state, action, &mut self.rng);
        let backup =
            self.env.reward(next) + self.env.discount() * self.search(next, depth + 1, visited);

        // Running mean over the visit count incremented above. The divisor is
        // N(s,a) + 1 on purpose; callers depend on this exact rule.
        let visits = self.n_sa[&(state, action)];
        let q = match self.q_sa.get(&(state, action)) {
            None => backup,
            Some(&old) => (old * visits as f64 + backup) / (visits as f64 + 1.0),
        };
        self.q_sa.insert((state, action), q);

        backup
    }

    /// Estimates a state's value by uniformly random play.
    ///
    /// Runs `trials` independent walks from `state`, each accumulating
    /// `discount^(d+1) * reward(next)` for up to `max_depth` steps or until
    /// a terminal state is reached, and returns the mean total.
    pub fn rollout(&mut self, state: State, max_depth: u32, trials: u32) -> f64 {
        let mut total = 0.0;
        for _ in 0..trials {
            let mut current = state;
            let mut depth = 0;
            while depth < max_depth && !self.env.is_terminal(current) {
                let action = Action::ALL[self.rng.random_range(0..Action::ALL.len())];
                let next = self.env.perform_action(current, action, &mut self.rng);
                total += self.env.discount().powi(depth as i32 + 1) * self.env.reward(next);
                current = next;
                depth += 1;
            }
        }
        total / trials as f64
    }

    /// Runs `iterations` simulated trajectories from `state` and returns the
    /// greedy action there, if any has been recorded.
    ///
    /// Statistics persist across calls, so repeated planning at the same
    /// state keeps refining earlier estimates.
    pub fn plan_online(&mut self, state: State, iterations: u32) -> Option<Action> {
        for _ in 0..iterations {
            self.simulate(state);
        }
        self.select_greedy_action(state)
    }

    /// Applies one intended action through the stochastic model without
    /// touching the search statistics. Used by drivers for manual moves.
    pub fn step(&mut self, state: State, action: Action) -> State {
        self.env.perform_action(state, action, &mut self.rng)
    }

    /// A read-only greedy-policy view over the current statistics.
    pub fn policy(&self) -> GreedyPolicy<'_> {
        GreedyPolicy::new(&self.q_sa, self.env.num_rows(), self.env.num_cols())
    }

    /// The action with the highest recorded Q-value at `state`, or `None`
    /// if the search has never backed anything up there.
    pub fn select_greedy_action(&self, state: State) -> Option<Action> {
        self.policy().greedy_action(state)
    }

    /// The greedy action for every cell of the full row x column rectangle.
    ///
    /// Obstacle cells are included and receive a (meaningless) lookup; see
    /// [`GreedyPolicy::extract`].
    pub fn extract_policy(&self) -> HashMap<State, Option<Action>> {
        self.policy().extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_world() -> GridWorld {
        let rewards = HashMap::from([((0, 3), 1.0), ((1, 3), -1.0)]);
        GridWorld::new(3, 4, vec![(1, 1)], vec![(0, 3), (1, 3)], rewards, 0.9)
    }

    fn planner(seed: u64) -> Mcts<Xoshiro256PlusPlus> {
        Mcts::with_seed(demo_world(), MctsConfig::default(), seed)
    }

    #[test]
    fn test_first_simulation_expands_leaf() {
        let mut planner = planner(1);
        planner.simulate((2, 0));
        // First touch marks the state expanded but records no action value.
        assert_eq!(planner.state_visits((2, 0)), Some(0));
        for action in Action::ALL {
            assert_eq!(planner.q_value((2, 0), action), None);
            assert_eq!(planner.action_visits((2, 0), action), None);
        }
    }

    #[test]
    fn test_second_simulation_descends_one_ply() {
        let mut planner = planner(2);
        planner.simulate((2, 0));
        planner.simulate((2, 0));
        assert_eq!(planner.state_visits((2, 0)), Some(1));
        let recorded: Vec<Action> = Action::ALL
            .iter()
            .copied()
            .filter(|&action| planner.q_value((2, 0), action).is_some())
            .collect();
        assert_eq!(recorded.len(), 1);
        assert_eq!(planner.action_visits((2, 0), recorded[0]), Some(1));
    }

    #[test]
    fn test_every_action_tried_before_repeats() {
        let mut planner = planner(3);
        // One expansion plus four one-ply descents from the start state.
        for _ in 0..5 {
            planner.simulate((2, 0));
        }
        for action in Action::ALL {
            assert_eq!(planner.action_visits((2, 0), action), Some(1));
        }
        assert_eq!(planner.state_visits((2, 0)), Some(4));
    }

    #[test]
    fn test_terminal_short_circuit() {
        let mut planner = planner(4);
        assert_eq!(planner.simulate((0, 3)), 1.0);
        assert_eq!(planner.state_visits((0, 3)), Some(1));
        // Repeat arrivals overwrite rather than increment.
        planner.simulate((0, 3));
        planner.simulate((0, 3));
        assert_eq!(planner.state_visits((0, 3)), Some(1));
        for action in Action::ALL {
            assert_eq!(planner.q_value((0, 3), action), None);
        }
    }

    #[test]
    fn test_negative_terminal_reward_propagates() {
        let mut planner = planner(5);
        assert_eq!(planner.simulate((1, 3)), -1.0);
        assert_eq!(planner.state_visits((1, 3)), Some(1));
    }

    #[test]
    fn test_plan_online_zero_iterations_on_fresh_planner() {
        let mut planner = planner(6);
        assert_eq!(planner.plan_online((2, 0), 0), None);
        assert_eq!(planner.state_visits((2, 0)), None);
    }

    #[test]
    fn test_greedy_is_none_without_statistics() {
        let planner = planner(7);
        assert_eq!(planner.select_greedy_action((2, 2)), None);
    }

    #[test]
    #[should_panic(expected = "trials_per_rollout")]
    fn test_zero_rollout_trials_rejected() {
        let config = MctsConfig {
            trials_per_rollout: 0,
            ..MctsConfig::default()
        };
        let _ = Mcts::with_seed(demo_world(), config, 0);
    }
}
