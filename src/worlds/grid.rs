//! # Stochastic Grid World
//!
//! This module implements a finite rectangular grid world with stochastic
//! movement. An agent occupies one cell and issues directional actions;
//! each action executes as intended with probability 0.8 and slips to one
//! of the two perpendicular directions with probability 0.1 each. The
//! opposite direction is never realized.
//!
//! ## Rules
//! - Moves off the edge of the grid clamp to the boundary (the agent stays
//!   on its current row/column rather than wrapping or being penalized)
//! - Moves into an obstacle cell fail silently and leave the agent in place
//! - Terminal cells are absorbing: no movement is ever attempted from them
//! - Rewards are a sparse table over cells; absent cells pay 0

use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A grid cell as a (row, column) pair.
pub type State = (usize, usize);

/// The four directional actions available in every state.
///
/// The enumeration is closed and ordered; `Action::ALL` fixes the iteration
/// order, which the planner relies on for tie-breaking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in their fixed enumeration order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// The (row, column) displacement of this action.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// The two actions perpendicular to this action's axis.
    ///
    /// These are the slip directions of the stochastic outcome model.
    pub fn perpendicular(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Left, Action::Right],
            Action::Left | Action::Right => [Action::Up, Action::Down],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Action::Up => "U",
            Action::Down => "D",
            Action::Left => "L",
            Action::Right => "R",
        };
        write!(f, "{}", symbol)
    }
}

impl FromStr for Action {
    type Err = String;

    /// Parses an action from its single-letter or full name, case-insensitive.
    ///
    /// # Arguments
    /// * `s` - Action name (e.g. "U", "up", "Right")
    ///
    /// # Returns
    /// Ok(Action) if parsing succeeds, Err(String) if the name is unknown
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Action::Up),
            "d" | "down" => Ok(Action::Down),
            "l" | "left" => Ok(Action::Left),
            "r" | "right" => Ok(Action::Right),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

/// A finite grid world with obstacles, absorbing terminal cells, and a
/// sparse reward table.
///
/// The world is immutable once constructed; all randomness is drawn from a
/// caller-supplied generator so simulations can be made reproducible.
#[derive(Debug, Clone)]
pub struct GridWorld {
    /// Number of rows in the grid
    num_rows: usize,
    /// Number of columns in the grid
    num_cols: usize,
    /// Cells the agent can never occupy
    obstacles: HashSet<State>,
    /// Absorbing cells; reaching one ends an episode
    terminal_states: HashSet<State>,
    /// Reward paid on arrival at a cell; absent cells pay 0
    rewards: HashMap<State, f64>,
    /// Per-step discount factor in (0, 1]
    discount: f64,
}

impl GridWorld {
    /// Creates a new grid world.
    ///
    /// # Arguments
    /// * `num_rows` - Number of rows in the grid
    /// * `num_cols` - Number of columns in the grid
    /// * `obstacles` - Cells the agent can never occupy
    /// * `terminal_states` - Absorbing cells
    /// * `rewards` - Arrival reward per cell (sparse; absent cells pay 0)
    /// * `discount` - Per-step discount factor in (0, 1]
    pub fn new(
        num_rows: usize,
        num_cols: usize,
        obstacles: Vec<State>,
        terminal_states: Vec<State>,
        rewards: HashMap<State, f64>,
        discount: f64,
    ) -> Self {
        Self {
            num_rows,
            num_cols,
            obstacles: obstacles.into_iter().collect(),
            terminal_states: terminal_states.into_iter().collect(),
            rewards,
            discount,
        }
    }

    /// Number of rows in the grid.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns in the grid.
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// The per-step discount factor.
    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// The obstacle cells.
    pub fn obstacles(&self) -> &HashSet<State> {
        &self.obstacles
    }

    /// All occupiable cells in row-major order (the full rectangle minus
    /// obstacles).
    pub fn states(&self) -> Vec<State> {
        let mut states = Vec::with_capacity(self.num_rows * self.num_cols);
        for row in 0..self.num_rows {
            for col in 0..self.num_cols {
                if !self.obstacles.contains(&(row, col)) {
                    states.push((row, col));
                }
            }
        }
        states
    }

    /// Applies an action's displacement deterministically.
    ///
    /// Terminal states are absorbing, so the original state is returned
    /// unchanged. Otherwise the target cell is clamped to the grid range;
    /// if the clamped target is an obstacle the move fails silently and the
    /// original state is returned.
    pub fn attempt_move(&self, state: State, action: Action) -> State {
        if self.is_terminal(state) {
            return state;
        }

        let (dr, dc) = action.delta();
        let row = (state.0 as i64 + dr).clamp(0, self.num_rows as i64 - 1) as usize;
        let col = (state.1 as i64 + dc).clamp(0, self.num_cols as i64 - 1) as usize;
        let target = (row, col);

        if self.obstacles.contains(&target) {
            return state;
        }

        target
    }

    /// The stochastic outcome distribution for an intended action.
    ///
    /// # Returns
    /// Exactly three (action, probability) entries: the intended action at
    /// 0.8 and the two perpendicular actions at 0.1 each. The opposite
    /// action never appears.
    pub fn outcome_distribution(&self, action: Action) -> [(Action, f64); 3] {
        let [first, second] = action.perpendicular();
        [(action, 0.8), (first, 0.1), (second, 0.1)]
    }

    /// Samples a realized action from the outcome distribution and applies
    /// it with `attempt_move`.
    ///
    /// # Arguments
    /// * `state` - The cell the agent acts from
    /// * `action` - The intended action
    /// * `rng` - Random source for the weighted outcome draw
    pub fn perform_action<R: Rng>(&self, state: State, action: Action, rng: &mut R) -> State {
        let outcomes = self.outcome_distribution(action);
        let mut draw = rng.random::<f64>();
        for (realized, probability) in outcomes {
            if draw < probability {
                return self.attempt_move(state, realized);
            }
            draw -= probability;
        }
        // Floating-point slack in the cumulative walk lands on the last entry.
        self.attempt_move(state, outcomes[2].0)
    }

    /// The arrival reward at a cell; 0 for cells absent from the table.
    pub fn reward(&self, state: State) -> f64 {
        self.rewards.get(&state).copied().unwrap_or(0.0)
    }

    /// Whether a cell is in the terminal set.
    pub fn is_terminal(&self, state: State) -> bool {
        self.terminal_states.contains(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn demo_world() -> GridWorld {
        let rewards = HashMap::from([((0, 3), 1.0), ((1, 3), -1.0)]);
        GridWorld::new(3, 4, vec![(1, 1)], vec![(0, 3), (1, 3)], rewards, 0.9)
    }

    fn opposite(action: Action) -> Action {
        match action {
            Action::Up => Action::Down,
            Action::Down => Action::Up,
            Action::Left => Action::Right,
            Action::Right => Action::Left,
        }
    }

    #[test]
    fn test_outcome_distribution_sums_to_one() {
        let world = demo_world();
        for action in Action::ALL {
            let outcomes = world.outcome_distribution(action);
            let sum: f64 = outcomes.iter().map(|(_, p)| p).sum();
            assert_eq!(sum, 1.0);
        }
    }

    #[test]
    fn test_outcome_distribution_shape() {
        let world = demo_world();
        for action in Action::ALL {
            let outcomes = world.outcome_distribution(action);
            assert_eq!(outcomes.len(), 3);
            assert_eq!(outcomes[0], (action, 0.8));
            for (realized, probability) in &outcomes[1..] {
                assert_eq!(*probability, 0.1);
                assert_ne!(*realized, action);
                assert_ne!(*realized, opposite(action));
            }
        }
    }

    #[test]
    fn test_attempt_move_terminal_is_absorbing() {
        let world = demo_world();
        for action in Action::ALL {
            assert_eq!(world.attempt_move((0, 3), action), (0, 3));
            assert_eq!(world.attempt_move((1, 3), action), (1, 3));
        }
    }

    #[test]
    fn test_attempt_move_clamps_at_boundaries() {
        let world = demo_world();
        assert_eq!(world.attempt_move((0, 0), Action::Up), (0, 0));
        assert_eq!(world.attempt_move((0, 0), Action::Left), (0, 0));
        assert_eq!(world.attempt_move((2, 0), Action::Down), (2, 0));
        assert_eq!(world.attempt_move((2, 3), Action::Right), (2, 3));
    }

    #[test]
    fn test_attempt_move_into_obstacle_stays_put() {
        let world = demo_world();
        assert_eq!(world.attempt_move((2, 1), Action::Up), (2, 1));
        assert_eq!(world.attempt_move((1, 0), Action::Right), (1, 0));
        assert_eq!(world.attempt_move((1, 2), Action::Left), (1, 2));
    }

    #[test]
    fn test_attempt_move_regular_step() {
        let world = demo_world();
        assert_eq!(world.attempt_move((2, 0), Action::Up), (1, 0));
        assert_eq!(world.attempt_move((2, 0), Action::Right), (2, 1));
        assert_eq!(world.attempt_move((1, 0), Action::Down), (2, 0));
    }

    #[test]
    fn test_perform_action_only_realizes_possible_outcomes() {
        let world = demo_world();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        // Intending Right from (2, 0): Right -> (2, 1), Up -> (1, 0), Down -> (2, 0).
        let allowed = [(2, 1), (1, 0), (2, 0)];
        let mut intended_count = 0;
        for _ in 0..1000 {
            let next = world.perform_action((2, 0), Action::Right, &mut rng);
            assert!(allowed.contains(&next));
            if next == (2, 1) {
                intended_count += 1;
            }
        }
        // The intended outcome carries 0.8 of the probability mass.
        assert!(intended_count > 500);
    }

    #[test]
    fn test_reward_defaults_to_zero() {
        let world = demo_world();
        assert_eq!(world.reward((0, 3)), 1.0);
        assert_eq!(world.reward((1, 3)), -1.0);
        assert_eq!(world.reward((2, 0)), 0.0);
    }

    #[test]
    fn test_states_skips_obstacles() {
        let world = demo_world();
        let states = world.states();
        assert_eq!(states.len(), 11);
        assert!(!states.contains(&(1, 1)));
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("u".parse::<Action>().unwrap(), Action::Up);
        assert_eq!("Down".parse::<Action>().unwrap(), Action::Down);
        assert_eq!(" L ".parse::<Action>().unwrap(), Action::Left);
        assert_eq!("right".parse::<Action>().unwrap(), Action::Right);
        assert!("north".parse::<Action>().is_err());
    }
}
