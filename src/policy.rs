//! # Greedy Policy Extraction
//!
//! A read-only view over the planner's action-value table. Rendering and
//! reporting code can hold a [`GreedyPolicy`] to answer "best action per
//! cell" queries without access to the planner's mutable search API.

use std::collections::HashMap;

use crate::worlds::grid::{Action, State};

/// Read-only greedy-policy queries over an action-value table.
///
/// Borrowed from a planner via [`crate::Mcts::policy`], or built directly
/// from any Q-table and grid extents. Never mutates anything.
pub struct GreedyPolicy<'a> {
    /// The action-value estimates being queried
    q_sa: &'a HashMap<(State, Action), f64>,
    /// Number of rows in the grid rectangle
    num_rows: usize,
    /// Number of columns in the grid rectangle
    num_cols: usize,
}

impl<'a> GreedyPolicy<'a> {
    /// Creates a policy view over a Q-table and the grid extents used for
    /// full-rectangle extraction.
    pub fn new(q_sa: &'a HashMap<(State, Action), f64>, num_rows: usize, num_cols: usize) -> Self {
        Self {
            q_sa,
            num_rows,
            num_cols,
        }
    }

    /// The action with the highest recorded Q-value at `state`.
    ///
    /// Only actions with a recorded value compete; ties go to the first
    /// maximal action in the fixed enumeration order. Returns `None` when
    /// nothing has been recorded at the state, which callers must treat as
    /// a normal outcome.
    pub fn greedy_action(&self, state: State) -> Option<Action> {
        let mut best_q = f64::NEG_INFINITY;
        let mut best_action = None;
        for action in Action::ALL {
            if let Some(&q) = self.q_sa.get(&(state, action)) {
                if q > best_q {
                    best_q = q;
                    best_action = Some(action);
                }
            }
        }
        best_action
    }

    /// The greedy action for every (row, column) pair in the full rectangle.
    ///
    /// Obstacle cells are not filtered out; they receive the same lookup as
    /// any other cell and come back `None` unless the search somehow
    /// recorded values there.
    pub fn extract(&self) -> HashMap<State, Option<Action>> {
        let mut policy = HashMap::new();
        for row in 0..self.num_rows {
            for col in 0..self.num_cols {
                let state = (row, col);
                policy.insert(state, self.greedy_action(state));
            }
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greedy_action_picks_highest_recorded_value() {
        let q_sa = HashMap::from([
            (((0, 0), Action::Up), 0.25),
            (((0, 0), Action::Right), 0.75),
        ]);
        let policy = GreedyPolicy::new(&q_sa, 1, 2);
        assert_eq!(policy.greedy_action((0, 0)), Some(Action::Right));
        assert_eq!(policy.greedy_action((0, 1)), None);
    }

    #[test]
    fn test_greedy_ties_break_by_enumeration_order() {
        let q_sa = HashMap::from([
            (((0, 0), Action::Down), 0.5),
            (((0, 0), Action::Left), 0.5),
        ]);
        let policy = GreedyPolicy::new(&q_sa, 1, 1);
        // Down precedes Left in Action::ALL and the comparison is strict.
        assert_eq!(policy.greedy_action((0, 0)), Some(Action::Down));
    }

    #[test]
    fn test_extract_covers_full_rectangle() {
        let q_sa = HashMap::from([(((0, 1), Action::Up), 1.0)]);
        let policy = GreedyPolicy::new(&q_sa, 2, 3);
        let extracted = policy.extract();
        assert_eq!(extracted.len(), 6);
        for row in 0..2 {
            for col in 0..3 {
                assert!(extracted.contains_key(&(row, col)));
            }
        }
        assert_eq!(extracted[&(0, 1)], Some(Action::Up));
        assert_eq!(extracted[&(1, 2)], None);
    }
}
