//! # World Implementations Module
//!
//! This module contains the environments the MCTS planner can be run against.
//! Each world owns its geometry, transition dynamics, reward table, and
//! terminal-state set, and is queried by the planner through a small set of
//! pure operations (`attempt_move`, `perform_action`, `reward`, `is_terminal`).
//!
//! ## Supported Worlds
//! - **Grid world**: a finite rectangular grid with obstacle cells, absorbing
//!   terminal cells, a sparse reward table, and stochastic action outcomes
//!   (0.8 intended / 0.1 each perpendicular)
//!
//! ## Adding New Worlds
//! To add a new world, create a new module providing:
//! 1. A state type usable as a hash-map key
//! 2. The transition and reward operations listed above
//! 3. A discount factor accessor for the planner's backup step

pub mod grid;
