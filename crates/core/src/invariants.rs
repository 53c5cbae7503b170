//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Cell, GameState, COLS, ROWS};

/// Validate that a state is internally consistent
pub fn assert_state_invariants(state: &GameState) {
    if cfg!(debug_assertions) {
        if let Some(reason) = state.inconsistency() {
            panic!("inconsistent game state: {}", reason);
        }
    }
}

/// Validate a single accepted move from `before` to `after`
pub fn assert_transition_invariants(before: &GameState, after: &GameState) {
    assert_state_invariants(after);

    debug_assert_eq!(
        after.move_count(),
        before.move_count() + 1,
        "a move must add exactly one piece"
    );

    // Cells only ever go from empty to taken
    for row in 0..ROWS {
        for col in 0..COLS {
            let (old, new) = (before.board().get(row, col), after.board().get(row, col));
            debug_assert!(
                old == new || old == Cell::Empty,
                "cell ({}, {}) changed from {:?} to {:?}",
                row,
                col,
                old,
                new
            );
        }
    }
}
